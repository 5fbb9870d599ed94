//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! ## 設計方針
//!
//! - 各ハンドラはサブモジュールに配置
//! - 親モジュールで re-export し、フラットな API を提供
//! - ハンドラは薄く保ち、ビジネスロジックは usecase 層に委譲
//!
//! ## ハンドラ一覧
//!
//! - `health`: ヘルスチェック
//! - `mail`: 配信と配信履歴
//! - `template`: テンプレート管理

pub mod health;
pub mod mail;
pub mod template;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, patch, post},
};
pub use health::{ReadinessState, health_check, readiness_check};
pub use mail::{
    DispatchState,
    history_by_date_range,
    history_by_recipient,
    send_bulk,
    send_mail,
    validate_email,
};
pub use template::{
    TemplateState,
    activate_template,
    create_template,
    deactivate_template,
    delete_template,
    get_template,
    get_template_by_name,
    list_active_templates,
    list_templates,
    update_template,
};

/// `/api/v1` 配下のルーターを構築する
///
/// ヘルスチェックは DB プールを必要とするため `main` で別途マージする。
pub fn api_routes(dispatch_state: Arc<DispatchState>, template_state: Arc<TemplateState>) -> Router {
    let mail = Router::new()
        .route("/api/v1/mail/send", post(send_mail))
        .route("/api/v1/mail/send/bulk", post(send_bulk))
        .route(
            "/api/v1/mail/history/recipient/{recipient}",
            get(history_by_recipient),
        )
        .route("/api/v1/mail/history/date-range", get(history_by_date_range))
        .route("/api/v1/mail/validate/{email}", get(validate_email))
        .with_state(dispatch_state);

    let templates = Router::new()
        .route("/api/v1/templates", get(list_templates).post(create_template))
        .route("/api/v1/templates/active", get(list_active_templates))
        .route("/api/v1/templates/name/{name}", get(get_template_by_name))
        .route(
            "/api/v1/templates/{id}",
            get(get_template)
                .put(update_template)
                .delete(delete_template),
        )
        .route("/api/v1/templates/{id}/activate", patch(activate_template))
        .route("/api/v1/templates/{id}/deactivate", patch(deactivate_template))
        .with_state(template_state);

    Router::new()
        .route("/health", get(health_check))
        .merge(mail)
        .merge(templates)
}
