//! # テンプレートリゾルバー
//!
//! 配信に使うテンプレートを取得し、有効であることを確認する。

use std::sync::Arc;

use bulkmail_domain::template::{Template, TemplateId};
use bulkmail_infra::repository::TemplateRepository;

use crate::error::ServiceError;

/// テンプレートリゾルバー
#[derive(Clone)]
pub struct TemplateResolver {
    repository: Arc<dyn TemplateRepository>,
}

impl TemplateResolver {
    pub fn new(repository: Arc<dyn TemplateRepository>) -> Self {
        Self { repository }
    }

    /// 配信に使用できるテンプレートを取得する
    ///
    /// # Errors
    ///
    /// - `ServiceError::NotFound`: テンプレートが存在しない
    /// - `ServiceError::Inactive`: テンプレートが無効化されている
    pub async fn resolve(&self, id: &TemplateId) -> Result<Template, ServiceError> {
        let template = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("テンプレートが見つかりません: {id}")))?;

        if !template.is_active() {
            return Err(ServiceError::Inactive(format!(
                "テンプレート {} は無効化されています",
                template.name()
            )));
        }

        Ok(template)
    }
}
