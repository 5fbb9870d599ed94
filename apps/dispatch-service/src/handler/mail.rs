//! # 配信ハンドラ
//!
//! メール配信と配信履歴のエンドポイントを提供する。
//!
//! ## エンドポイント
//!
//! - `POST /api/v1/mail/send` - 1 通の配信
//! - `POST /api/v1/mail/send/bulk` - 一括配信
//! - `GET /api/v1/mail/history/recipient/{recipient}` - 宛先の配信履歴
//! - `GET /api/v1/mail/history/date-range?start_date&end_date` - 日付範囲の配信履歴
//! - `GET /api/v1/mail/validate/{email}` - メールアドレス形式の検証

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use bulkmail_domain::{
    delivery::{DeliveryRecord, DeliveryStatus},
    message::TemplateVariables,
    template::TemplateId,
};
use bulkmail_shared::{ApiResponse, ErrorResponse};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::ServiceError,
    usecase::{DispatchCoordinator, DispatchOutcome, DispatchRequest, HistoryQuery},
};

/// 配信ハンドラの共有状態
pub struct DispatchState {
    pub coordinator: Arc<DispatchCoordinator>,
    pub history:     HistoryQuery,
}

// --- リクエスト/レスポンス型 ---

/// 1 通の配信リクエスト
#[derive(Debug, Deserialize)]
pub struct SendMailRequest {
    pub recipient:   String,
    pub template_id: Uuid,
    /// 件名の上書き
    #[serde(default)]
    pub subject:     Option<String>,
    /// 省略または `null` は変数なし
    #[serde(default)]
    pub variables:   Option<TemplateVariables>,
}

/// 一括配信リクエスト
#[derive(Debug, Deserialize)]
pub struct BulkSendRequest {
    pub recipients:  Vec<String>,
    pub template_id: Uuid,
    /// 省略または `null` は変数なし
    #[serde(default)]
    pub variables:   Option<TemplateVariables>,
}

/// 日付範囲クエリ（UTC の日付、両端を含む）
#[derive(Debug, Deserialize)]
pub struct DateRangeQuery {
    pub start_date: NaiveDate,
    pub end_date:   NaiveDate,
}

/// 配信記録 DTO
#[derive(Debug, Serialize, Deserialize)]
pub struct DeliveryRecordDto {
    pub id:            Uuid,
    pub recipient:     String,
    pub subject:       String,
    pub template_id:   Uuid,
    pub sender:        String,
    pub status:        DeliveryStatus,
    pub error_message: Option<String>,
    /// テンプレート変数の JSON スナップショット
    pub variables:     Option<String>,
    pub created_at:    DateTime<Utc>,
    pub updated_at:    DateTime<Utc>,
}

impl From<DeliveryRecord> for DeliveryRecordDto {
    fn from(record: DeliveryRecord) -> Self {
        Self {
            id:            *record.id().as_uuid(),
            recipient:     record.recipient().as_str().to_string(),
            subject:       record.subject().to_string(),
            template_id:   *record.template_id().as_uuid(),
            sender:        record.sender().as_str().to_string(),
            status:        record.status(),
            error_message: record.error_message().map(str::to_string),
            variables:     record.variables().map(str::to_string),
            created_at:    record.created_at(),
            updated_at:    record.updated_at(),
        }
    }
}

/// 一括配信の宛先ごとの結果 DTO
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DispatchOutcomeDto {
    Recorded {
        record: DeliveryRecordDto,
    },
    Rejected {
        recipient: String,
        error:     ErrorResponse,
    },
}

impl From<DispatchOutcome> for DispatchOutcomeDto {
    fn from(outcome: DispatchOutcome) -> Self {
        match outcome {
            DispatchOutcome::Recorded(record) => Self::Recorded {
                record: record.into(),
            },
            DispatchOutcome::Rejected { recipient, error } => Self::Rejected {
                recipient,
                error: error.to_error_response(),
            },
        }
    }
}

/// メールアドレス検証レスポンス
#[derive(Debug, Serialize)]
pub struct ValidateEmailResponse {
    pub email: String,
    pub valid: bool,
}

// --- ハンドラ ---

/// POST /api/v1/mail/send
///
/// 送信に失敗した場合も 200 で `FAILED` の配信記録を返す。
pub async fn send_mail(
    State(state): State<Arc<DispatchState>>,
    Json(req): Json<SendMailRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let record = state
        .coordinator
        .send_one(DispatchRequest {
            recipient:   req.recipient,
            template_id: TemplateId::from_uuid(req.template_id),
            subject:     req.subject,
            variables:   req.variables.unwrap_or_default(),
        })
        .await?;

    Ok(Json(ApiResponse::new(DeliveryRecordDto::from(record))))
}

/// POST /api/v1/mail/send/bulk
///
/// 結果はリクエストの宛先と同じ順序で返す。
pub async fn send_bulk(
    State(state): State<Arc<DispatchState>>,
    Json(req): Json<BulkSendRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let outcomes = state
        .coordinator
        .send_bulk(
            req.recipients,
            TemplateId::from_uuid(req.template_id),
            req.variables.unwrap_or_default(),
        )
        .await?;

    let dtos: Vec<DispatchOutcomeDto> = outcomes.into_iter().map(Into::into).collect();
    Ok(Json(ApiResponse::new(dtos)))
}

/// GET /api/v1/mail/history/recipient/{recipient}
pub async fn history_by_recipient(
    State(state): State<Arc<DispatchState>>,
    Path(recipient): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let records = state.history.by_recipient(&recipient).await?;
    let dtos: Vec<DeliveryRecordDto> = records.into_iter().map(Into::into).collect();
    Ok(Json(ApiResponse::new(dtos)))
}

/// GET /api/v1/mail/history/date-range?start_date=YYYY-MM-DD&end_date=YYYY-MM-DD
pub async fn history_by_date_range(
    State(state): State<Arc<DispatchState>>,
    Query(query): Query<DateRangeQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let records = state
        .history
        .by_date_range(query.start_date, query.end_date)
        .await?;
    let dtos: Vec<DeliveryRecordDto> = records.into_iter().map(Into::into).collect();
    Ok(Json(ApiResponse::new(dtos)))
}

/// GET /api/v1/mail/validate/{email}
pub async fn validate_email(
    State(state): State<Arc<DispatchState>>,
    Path(email): Path<String>,
) -> impl IntoResponse {
    let valid = state.coordinator.validate_email(&email);
    Json(ApiResponse::new(ValidateEmailResponse { email, valid }))
}
