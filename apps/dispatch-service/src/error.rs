//! # Dispatch Service エラー定義
//!
//! ユースケース層のエラーと、HTTP レスポンス（RFC 9457 Problem Details）への変換を定義する。
//!
//! 送信失敗（`TransportError`）はここに現れない。配信記録の `FAILED` として
//! データで表現され、呼び出しのエラーにはならない。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bulkmail_domain::DomainError;
use bulkmail_infra::InfraError;
use bulkmail_shared::{
    ErrorResponse,
    event_log::error::{category, kind},
};
use thiserror::Error;

/// Dispatch Service で発生するエラー
#[derive(Debug, Error)]
pub enum ServiceError {
    /// 入力値の不正（宛先アドレスの形式、空の宛先リストなど）
    #[error("バリデーションエラー: {0}")]
    Validation(String),

    /// リソースが見つからない
    #[error("リソースが見つかりません: {0}")]
    NotFound(String),

    /// テンプレートが無効化されている
    #[error("テンプレートが無効です: {0}")]
    Inactive(String),

    /// 競合（名前の重複、終端状態の配信記録の更新）
    #[error("競合が発生しました: {0}")]
    Conflict(String),

    /// 永続化エラー
    #[error("永続化エラー: {0}")]
    Persistence(#[source] InfraError),

    /// 内部エラー
    #[error("内部エラー: {0}")]
    Internal(String),
}

impl ServiceError {
    /// 外部に返してよいメッセージ
    ///
    /// 永続化エラーと内部エラーは詳細を隠す。
    pub fn public_message(&self) -> String {
        match self {
            Self::Validation(msg)
            | Self::NotFound(msg)
            | Self::Inactive(msg)
            | Self::Conflict(msg) => msg.clone(),
            Self::Persistence(_) | Self::Internal(_) => "内部エラーが発生しました".to_string(),
        }
    }

    pub fn to_error_response(&self) -> ErrorResponse {
        match self {
            Self::Validation(msg) => ErrorResponse::validation_error(msg.clone()),
            Self::NotFound(msg) => ErrorResponse::not_found(msg.clone()),
            Self::Inactive(msg) => {
                ErrorResponse::new("template-inactive", "Template Inactive", 400, msg.clone())
            }
            Self::Conflict(msg) => ErrorResponse::conflict(msg.clone()),
            Self::Persistence(_) | Self::Internal(_) => ErrorResponse::internal_error(),
        }
    }
}

impl From<DomainError> for ServiceError {
    fn from(error: DomainError) -> Self {
        match error {
            DomainError::Validation(msg) => Self::Validation(msg),
            e @ DomainError::NotFound { .. } => Self::NotFound(e.to_string()),
            DomainError::Conflict(msg) | DomainError::InvalidTransition(msg) => Self::Conflict(msg),
        }
    }
}

impl From<InfraError> for ServiceError {
    fn from(error: InfraError) -> Self {
        match error.as_conflict() {
            Some((entity, id)) => Self::Conflict(format!("{entity} が競合しています: {id}")),
            None => Self::Persistence(error),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        match &self {
            Self::Persistence(e) => {
                tracing::error!(
                    error.category = category::INFRASTRUCTURE,
                    error.kind = kind::DATABASE,
                    span_trace = %e.span_trace(),
                    "永続化エラー: {}",
                    e
                );
            }
            Self::Internal(msg) => {
                tracing::error!(
                    error.category = category::INFRASTRUCTURE,
                    error.kind = kind::INTERNAL,
                    "内部エラー: {}",
                    msg
                );
            }
            _ => {}
        }

        let body = self.to_error_response();
        let status =
            StatusCode::from_u16(body.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(body)).into_response()
    }
}
