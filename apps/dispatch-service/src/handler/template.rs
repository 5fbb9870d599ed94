//! # テンプレートハンドラ
//!
//! メールテンプレートの管理エンドポイントを提供する。
//!
//! ## エンドポイント
//!
//! - `GET /api/v1/templates` - 全テンプレート
//! - `GET /api/v1/templates/active` - 有効なテンプレート
//! - `GET /api/v1/templates/{id}` - ID で取得
//! - `GET /api/v1/templates/name/{name}` - 名前で取得
//! - `POST /api/v1/templates` - 登録
//! - `PUT /api/v1/templates/{id}` - 更新
//! - `DELETE /api/v1/templates/{id}` - 削除
//! - `PATCH /api/v1/templates/{id}/activate` - 有効化
//! - `PATCH /api/v1/templates/{id}/deactivate` - 無効化

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use bulkmail_domain::template::{Template, TemplateId};
use bulkmail_shared::ApiResponse;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::ServiceError,
    usecase::{TemplateCatalog, TemplateInput},
};

/// テンプレートハンドラの共有状態
pub struct TemplateState {
    pub catalog: Arc<TemplateCatalog>,
}

// --- リクエスト/レスポンス型 ---

/// テンプレート登録・更新リクエスト
#[derive(Debug, Deserialize)]
pub struct TemplateRequest {
    pub name:        String,
    pub subject:     String,
    pub content:     String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_active:   Option<bool>,
}

impl From<TemplateRequest> for TemplateInput {
    fn from(req: TemplateRequest) -> Self {
        Self {
            name:        req.name,
            subject:     req.subject,
            content:     req.content,
            description: req.description,
            is_active:   req.is_active,
        }
    }
}

/// テンプレート DTO
#[derive(Debug, Serialize, Deserialize)]
pub struct TemplateDto {
    pub id:          Uuid,
    pub name:        String,
    pub subject:     String,
    pub content:     String,
    pub description: Option<String>,
    pub is_active:   bool,
    pub created_at:  DateTime<Utc>,
    pub updated_at:  DateTime<Utc>,
}

impl From<Template> for TemplateDto {
    fn from(template: Template) -> Self {
        Self {
            id:          *template.id().as_uuid(),
            name:        template.name().as_str().to_string(),
            subject:     template.subject().as_str().to_string(),
            content:     template.content().as_str().to_string(),
            description: template.description().map(str::to_string),
            is_active:   template.is_active(),
            created_at:  template.created_at(),
            updated_at:  template.updated_at(),
        }
    }
}

fn to_dtos(templates: Vec<Template>) -> Vec<TemplateDto> {
    templates.into_iter().map(TemplateDto::from).collect()
}

// --- ハンドラ ---

/// GET /api/v1/templates
pub async fn list_templates(
    State(state): State<Arc<TemplateState>>,
) -> Result<impl IntoResponse, ServiceError> {
    let templates = state.catalog.list_all().await?;
    Ok(Json(ApiResponse::new(to_dtos(templates))))
}

/// GET /api/v1/templates/active
pub async fn list_active_templates(
    State(state): State<Arc<TemplateState>>,
) -> Result<impl IntoResponse, ServiceError> {
    let templates = state.catalog.list_active().await?;
    Ok(Json(ApiResponse::new(to_dtos(templates))))
}

/// GET /api/v1/templates/{id}
pub async fn get_template(
    State(state): State<Arc<TemplateState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let template = state.catalog.get_by_id(&TemplateId::from_uuid(id)).await?;
    Ok(Json(ApiResponse::new(TemplateDto::from(template))))
}

/// GET /api/v1/templates/name/{name}
pub async fn get_template_by_name(
    State(state): State<Arc<TemplateState>>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let template = state.catalog.get_by_name(&name).await?;
    Ok(Json(ApiResponse::new(TemplateDto::from(template))))
}

/// POST /api/v1/templates
pub async fn create_template(
    State(state): State<Arc<TemplateState>>,
    Json(req): Json<TemplateRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let template = state.catalog.create(req.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(TemplateDto::from(template))),
    ))
}

/// PUT /api/v1/templates/{id}
pub async fn update_template(
    State(state): State<Arc<TemplateState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<TemplateRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let template = state
        .catalog
        .update(&TemplateId::from_uuid(id), req.into())
        .await?;
    Ok(Json(ApiResponse::new(TemplateDto::from(template))))
}

/// DELETE /api/v1/templates/{id}
///
/// 過去の配信記録は削除されない。
pub async fn delete_template(
    State(state): State<Arc<TemplateState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.catalog.delete(&TemplateId::from_uuid(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/v1/templates/{id}/activate
pub async fn activate_template(
    State(state): State<Arc<TemplateState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let template = state.catalog.activate(&TemplateId::from_uuid(id)).await?;
    Ok(Json(ApiResponse::new(TemplateDto::from(template))))
}

/// PATCH /api/v1/templates/{id}/deactivate
pub async fn deactivate_template(
    State(state): State<Arc<TemplateState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let template = state.catalog.deactivate(&TemplateId::from_uuid(id)).await?;
    Ok(Json(ApiResponse::new(TemplateDto::from(template))))
}
