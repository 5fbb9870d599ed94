//! # TemplateRepository
//!
//! メールテンプレートの永続化を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **名前の一意性**: `email_templates_name_key` の UNIQUE 違反は `InfraErrorKind::Conflict` に変換
//! - **物理削除**: テンプレートの削除は配信記録に影響しない（外部キーなし）

use async_trait::async_trait;
use bulkmail_domain::{
    DomainError,
    template::{
        Template,
        TemplateContent,
        TemplateId,
        TemplateName,
        TemplateRecord,
        TemplateSubject,
    },
};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::InfraError;

/// テンプレートリポジトリトレイト
#[async_trait]
pub trait TemplateRepository: Send + Sync {
    /// ID でテンプレートを検索する
    async fn find_by_id(&self, id: &TemplateId) -> Result<Option<Template>, InfraError>;

    /// 名前でテンプレートを検索する
    async fn find_by_name(&self, name: &str) -> Result<Option<Template>, InfraError>;

    /// 全テンプレートを名前順で取得する
    async fn find_all(&self) -> Result<Vec<Template>, InfraError>;

    /// 有効なテンプレートを名前順で取得する
    async fn find_all_active(&self) -> Result<Vec<Template>, InfraError>;

    /// テンプレートを挿入する
    ///
    /// 名前が重複する場合は `InfraErrorKind::Conflict` を返す。
    async fn insert(&self, template: &Template) -> Result<(), InfraError>;

    /// テンプレートを更新する
    ///
    /// 名前が他のテンプレートと重複する場合は `InfraErrorKind::Conflict` を返す。
    async fn update(&self, template: &Template) -> Result<(), InfraError>;

    /// テンプレートを削除する
    ///
    /// 削除した場合は `true`、存在しなかった場合は `false` を返す。
    async fn delete(&self, id: &TemplateId) -> Result<bool, InfraError>;
}

/// email_templates の行
#[derive(Debug, sqlx::FromRow)]
struct TemplateRow {
    id:          Uuid,
    name:        String,
    subject:     String,
    content:     String,
    description: Option<String>,
    is_active:   bool,
    created_at:  DateTime<Utc>,
    updated_at:  DateTime<Utc>,
}

impl TryFrom<TemplateRow> for Template {
    type Error = InfraError;

    fn try_from(row: TemplateRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let invalid = |e: DomainError| {
            InfraError::unexpected(format!("不正なテンプレート行 (id={id}): {e}"))
        };

        Ok(Template::from_db(TemplateRecord {
            id:          TemplateId::from_uuid(id),
            name:        TemplateName::new(row.name).map_err(invalid)?,
            subject:     TemplateSubject::new(row.subject).map_err(invalid)?,
            content:     TemplateContent::new(row.content).map_err(invalid)?,
            description: row.description,
            is_active:   row.is_active,
            created_at:  row.created_at,
            updated_at:  row.updated_at,
        }))
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, name, subject, content, description, is_active, created_at, updated_at
    FROM email_templates
"#;

/// 一意制約違反を Conflict に変換する
fn map_unique_violation(error: sqlx::Error, name: &TemplateName) -> InfraError {
    let is_unique_violation =
        matches!(&error, sqlx::Error::Database(db) if db.is_unique_violation());
    if is_unique_violation {
        InfraError::conflict("Template", name.as_str())
    } else {
        error.into()
    }
}

/// PostgreSQL 実装の TemplateRepository
#[derive(Debug, Clone)]
pub struct PostgresTemplateRepository {
    pool: PgPool,
}

impl PostgresTemplateRepository {
    /// 新しいリポジトリインスタンスを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_many(&self, sql: &str) -> Result<Vec<Template>, InfraError> {
        let rows = sqlx::query_as::<_, TemplateRow>(sql)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Template::try_from).collect()
    }
}

#[async_trait]
impl TemplateRepository for PostgresTemplateRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn find_by_id(&self, id: &TemplateId) -> Result<Option<Template>, InfraError> {
        let sql = format!("{SELECT_COLUMNS} WHERE id = $1");
        let row = sqlx::query_as::<_, TemplateRow>(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Template::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%name))]
    async fn find_by_name(&self, name: &str) -> Result<Option<Template>, InfraError> {
        let sql = format!("{SELECT_COLUMNS} WHERE name = $1");
        let row = sqlx::query_as::<_, TemplateRow>(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Template::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn find_all(&self) -> Result<Vec<Template>, InfraError> {
        self.fetch_many(&format!("{SELECT_COLUMNS} ORDER BY name ASC"))
            .await
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn find_all_active(&self) -> Result<Vec<Template>, InfraError> {
        self.fetch_many(&format!(
            "{SELECT_COLUMNS} WHERE is_active = TRUE ORDER BY name ASC"
        ))
        .await
    }

    #[tracing::instrument(skip_all, level = "debug", fields(id = %template.id()))]
    async fn insert(&self, template: &Template) -> Result<(), InfraError> {
        sqlx::query(
            r#"
            INSERT INTO email_templates (
                id, name, subject, content, description, is_active, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(template.id().as_uuid())
        .bind(template.name().as_str())
        .bind(template.subject().as_str())
        .bind(template.content().as_str())
        .bind(template.description())
        .bind(template.is_active())
        .bind(template.created_at())
        .bind(template.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, template.name()))?;

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(id = %template.id()))]
    async fn update(&self, template: &Template) -> Result<(), InfraError> {
        sqlx::query(
            r#"
            UPDATE email_templates
            SET name = $2,
                subject = $3,
                content = $4,
                description = $5,
                is_active = $6,
                updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(template.id().as_uuid())
        .bind(template.name().as_str())
        .bind(template.subject().as_str())
        .bind(template.content().as_str())
        .bind(template.description())
        .bind(template.is_active())
        .bind(template.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, template.name()))?;

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn delete(&self, id: &TemplateId) -> Result<bool, InfraError> {
        let result = sqlx::query("DELETE FROM email_templates WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn トレイトはsendとsyncを実装している() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PostgresTemplateRepository>();
    }
}
