//! # テンプレートカタログ
//!
//! メールテンプレートの登録・更新・削除・有効化を行うユースケース。
//!
//! ## 設計方針
//!
//! - **名前の一意性**: 事前に名前で検索し、重複は `Conflict` とする。
//!   同時登録の競合は DB の一意制約（`InfraErrorKind::Conflict`）で検出する
//! - **物理削除**: 過去の配信記録はテンプレート ID のコピーを保持するため影響を受けない

use std::sync::Arc;

use bulkmail_domain::{
    clock::Clock,
    template::{
        NewTemplate,
        Template,
        TemplateChanges,
        TemplateContent,
        TemplateId,
        TemplateName,
        TemplateSubject,
    },
};
use bulkmail_infra::repository::TemplateRepository;
use bulkmail_shared::{event_log::event, log_business_event};

use crate::error::ServiceError;

/// テンプレート登録・更新の入力
#[derive(Debug, Clone)]
pub struct TemplateInput {
    pub name:        String,
    pub subject:     String,
    pub content:     String,
    pub description: Option<String>,
    /// 登録時は省略で有効、更新時は省略で現状維持
    pub is_active:   Option<bool>,
}

/// 検証済みのテンプレート属性
struct ValidatedInput {
    name:        TemplateName,
    subject:     TemplateSubject,
    content:     TemplateContent,
    description: Option<String>,
    is_active:   Option<bool>,
}

impl TryFrom<TemplateInput> for ValidatedInput {
    type Error = ServiceError;

    fn try_from(input: TemplateInput) -> Result<Self, Self::Error> {
        Ok(Self {
            name:        TemplateName::new(input.name)?,
            subject:     TemplateSubject::new(input.subject)?,
            content:     TemplateContent::new(input.content)?,
            description: input
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            is_active:   input.is_active,
        })
    }
}

/// テンプレートカタログ
pub struct TemplateCatalog {
    repository: Arc<dyn TemplateRepository>,
    clock:      Arc<dyn Clock>,
}

impl TemplateCatalog {
    pub fn new(repository: Arc<dyn TemplateRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// 全テンプレートを名前順で取得する
    pub async fn list_all(&self) -> Result<Vec<Template>, ServiceError> {
        Ok(self.repository.find_all().await?)
    }

    /// 有効なテンプレートを名前順で取得する
    pub async fn list_active(&self) -> Result<Vec<Template>, ServiceError> {
        Ok(self.repository.find_all_active().await?)
    }

    pub async fn get_by_id(&self, id: &TemplateId) -> Result<Template, ServiceError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("テンプレートが見つかりません: {id}")))
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Template, ServiceError> {
        self.repository
            .find_by_name(name)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("テンプレートが見つかりません: {name}")))
    }

    /// テンプレートを登録する
    ///
    /// # Errors
    ///
    /// - `ServiceError::Validation`: 名前・件名・本文が不正
    /// - `ServiceError::Conflict`: 同名のテンプレートが既に存在する
    pub async fn create(&self, input: TemplateInput) -> Result<Template, ServiceError> {
        let input = ValidatedInput::try_from(input)?;
        self.ensure_name_available(&input.name, None).await?;

        let template = Template::new(NewTemplate {
            id:          TemplateId::new(),
            name:        input.name,
            subject:     input.subject,
            content:     input.content,
            description: input.description,
            is_active:   input.is_active.unwrap_or(true),
            now:         self.clock.now(),
        });
        self.repository.insert(&template).await?;

        log_business_event!(
            event.category = event::category::TEMPLATE,
            event.action = event::action::TEMPLATE_CREATED,
            event.entity_type = event::entity_type::TEMPLATE,
            event.entity_id = %template.id(),
            event.result = event::result::SUCCESS,
            template.name = %template.name(),
            "テンプレートを登録しました"
        );

        Ok(template)
    }

    /// テンプレートを更新する
    ///
    /// # Errors
    ///
    /// - `ServiceError::NotFound`: テンプレートが存在しない
    /// - `ServiceError::Conflict`: 変更後の名前が他のテンプレートと重複する
    pub async fn update(&self, id: &TemplateId, input: TemplateInput) -> Result<Template, ServiceError> {
        let input = ValidatedInput::try_from(input)?;
        let current = self.get_by_id(id).await?;
        self.ensure_name_available(&input.name, Some(id)).await?;

        let template = current.updated(
            TemplateChanges {
                name:        input.name,
                subject:     input.subject,
                content:     input.content,
                description: input.description,
                is_active:   input.is_active,
            },
            self.clock.now(),
        );
        self.repository.update(&template).await?;

        log_business_event!(
            event.category = event::category::TEMPLATE,
            event.action = event::action::TEMPLATE_UPDATED,
            event.entity_type = event::entity_type::TEMPLATE,
            event.entity_id = %id,
            event.result = event::result::SUCCESS,
            "テンプレートを更新しました"
        );

        Ok(template)
    }

    /// テンプレートを削除する
    pub async fn delete(&self, id: &TemplateId) -> Result<(), ServiceError> {
        if !self.repository.delete(id).await? {
            return Err(ServiceError::NotFound(format!(
                "テンプレートが見つかりません: {id}"
            )));
        }

        log_business_event!(
            event.category = event::category::TEMPLATE,
            event.action = event::action::TEMPLATE_DELETED,
            event.entity_type = event::entity_type::TEMPLATE,
            event.entity_id = %id,
            event.result = event::result::SUCCESS,
            "テンプレートを削除しました"
        );

        Ok(())
    }

    /// テンプレートを有効化する
    pub async fn activate(&self, id: &TemplateId) -> Result<Template, ServiceError> {
        let template = self.get_by_id(id).await?.activated(self.clock.now());
        self.repository.update(&template).await?;

        log_business_event!(
            event.category = event::category::TEMPLATE,
            event.action = event::action::TEMPLATE_ACTIVATED,
            event.entity_type = event::entity_type::TEMPLATE,
            event.entity_id = %id,
            event.result = event::result::SUCCESS,
            "テンプレートを有効化しました"
        );

        Ok(template)
    }

    /// テンプレートを無効化する
    ///
    /// 無効化したテンプレートでの配信は `Inactive` で拒否される。
    pub async fn deactivate(&self, id: &TemplateId) -> Result<Template, ServiceError> {
        let template = self.get_by_id(id).await?.deactivated(self.clock.now());
        self.repository.update(&template).await?;

        log_business_event!(
            event.category = event::category::TEMPLATE,
            event.action = event::action::TEMPLATE_DEACTIVATED,
            event.entity_type = event::entity_type::TEMPLATE,
            event.entity_id = %id,
            event.result = event::result::SUCCESS,
            "テンプレートを無効化しました"
        );

        Ok(template)
    }

    /// 名前が未使用（または自分自身）であることを確認する
    async fn ensure_name_available(
        &self,
        name: &TemplateName,
        own_id: Option<&TemplateId>,
    ) -> Result<(), ServiceError> {
        match self.repository.find_by_name(name.as_str()).await? {
            Some(existing) if Some(existing.id()) != own_id => Err(ServiceError::Conflict(
                format!("テンプレート名が重複しています: {name}"),
            )),
            _ => Ok(()),
        }
    }
}
