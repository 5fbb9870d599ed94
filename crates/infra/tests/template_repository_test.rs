//! TemplateRepository 統合テスト
//!
//! データベースを使用したテスト。sqlx::test マクロを使用して、
//! テストごとに独立したデータベースを作成する。
//!
//! 実行方法:
//! ```bash
//! DATABASE_URL=postgres://... cargo test -p bulkmail-infra --test template_repository_test -- --ignored
//! ```

mod common;

use bulkmail_domain::template::{TemplateChanges, TemplateId};
use bulkmail_infra::{
    InfraErrorKind,
    repository::{PostgresTemplateRepository, TemplateRepository},
};
use common::{build_template, test_now};
use pretty_assertions::assert_eq;
use sqlx::PgPool;

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "PostgreSQL が必要"]
async fn test_insertしたテンプレートをidと名前で取得できる(pool: PgPool) {
    // Arrange
    let sut = PostgresTemplateRepository::new(pool);
    let template = build_template("welcome", true);

    // Act
    sut.insert(&template).await.unwrap();

    // Assert
    let by_id = sut.find_by_id(template.id()).await.unwrap();
    let by_name = sut.find_by_name("welcome").await.unwrap();
    assert_eq!(by_id.as_ref(), Some(&template));
    assert_eq!(by_name, Some(template));
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "PostgreSQL が必要"]
async fn test_存在しないidはnoneを返す(pool: PgPool) {
    let sut = PostgresTemplateRepository::new(pool);

    let result = sut.find_by_id(&TemplateId::new()).await.unwrap();

    assert!(result.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "PostgreSQL が必要"]
async fn test_名前が重複するとconflictになる(pool: PgPool) {
    let sut = PostgresTemplateRepository::new(pool);
    sut.insert(&build_template("welcome", true)).await.unwrap();

    let result = sut.insert(&build_template("welcome", false)).await;

    let err = result.unwrap_err();
    assert!(matches!(err.kind(), InfraErrorKind::Conflict { .. }));
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "PostgreSQL が必要"]
async fn test_find_all_activeは有効なテンプレートのみを名前順で返す(pool: PgPool) {
    let sut = PostgresTemplateRepository::new(pool);
    sut.insert(&build_template("b-newsletter", true)).await.unwrap();
    sut.insert(&build_template("a-welcome", true)).await.unwrap();
    sut.insert(&build_template("c-legacy", false)).await.unwrap();

    let active = sut.find_all_active().await.unwrap();
    let all = sut.find_all().await.unwrap();

    let active_names: Vec<&str> = active.iter().map(|t| t.name().as_str()).collect();
    assert_eq!(active_names, vec!["a-welcome", "b-newsletter"]);
    assert_eq!(all.len(), 3);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "PostgreSQL が必要"]
async fn test_updateで内容と有効フラグが反映される(pool: PgPool) {
    let sut = PostgresTemplateRepository::new(pool);
    let template = build_template("welcome", true);
    sut.insert(&template).await.unwrap();

    let changes = TemplateChanges {
        name:        template.name().clone(),
        subject:     template.subject().clone(),
        content:     template.content().clone(),
        description: Some("改訂版".to_string()),
        is_active:   Some(false),
    };
    let updated = template.updated(changes, test_now() + chrono::Duration::hours(1));
    sut.update(&updated).await.unwrap();

    let stored = sut.find_by_id(updated.id()).await.unwrap().unwrap();
    assert_eq!(stored.description(), Some("改訂版"));
    assert!(!stored.is_active());
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "PostgreSQL が必要"]
async fn test_deleteは削除の有無を返す(pool: PgPool) {
    let sut = PostgresTemplateRepository::new(pool);
    let template = build_template("welcome", true);
    sut.insert(&template).await.unwrap();

    assert!(sut.delete(template.id()).await.unwrap());
    assert!(!sut.delete(template.id()).await.unwrap());
}
