//! # 配信コーディネーター
//!
//! 1 通の配信（検証 → テンプレート解決 → レンダリング → 台帳記録 → 送信 → 台帳更新）と、
//! それを宛先ごとに並行実行する一括配信を担当する。
//!
//! ## 処理の流れ
//!
//! ```text
//! VALIDATING ─▶ RESOLVING ─┬─▶ 拒否（記録なし）
//!                          └─▶ RENDERING ─▶ SENDING 記録 ─▶ 送信 ─▶ SUCCESS | FAILED 記録
//! ```
//!
//! ## 設計方針
//!
//! - **副作用の前に検証**: 宛先とテンプレートの検証に失敗した場合、配信記録は作らない
//! - **送信失敗はデータ**: `TransportError` は `FAILED` の記録になり、呼び出しのエラーにはならない
//! - **ワーカープール**: `MailTransport::send` はブロッキングのため `spawn_blocking` で実行し、
//!   同時実行数をセマフォで `worker_pool_size` に制限する
//! - **キャンセルなし**: 一括配信の各タスクは `tokio::spawn` で切り離され、
//!   呼び出し元が Future を破棄しても最後まで実行される

use std::sync::Arc;

use bulkmail_domain::{
    delivery::{DeliveryOutcome, DeliveryRecord, DeliveryStatus},
    email::{self, EmailAddress},
    message::{EmailMessage, TemplateVariables, TransportError},
    template::{TemplateId, TemplateSubject},
};
use bulkmail_infra::transport::MailTransport;
use bulkmail_shared::{event_log::event, log_business_event};
use tokio::sync::Semaphore;

use super::{
    delivery_ledger::{DeliveryLedger, NewDelivery},
    template_renderer::TemplateRenderer,
    template_resolver::TemplateResolver,
};
use crate::error::ServiceError;

/// 配信設定
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    /// 送信元アドレス
    pub sender_address:   EmailAddress,
    /// 同時に実行する送信の上限（1 以上）
    pub worker_pool_size: usize,
}

/// 1 通の配信リクエスト
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    /// 宛先（未検証）
    pub recipient:   String,
    pub template_id: TemplateId,
    /// 件名の上書き。空白のみの場合はテンプレートの件名を使う
    pub subject:     Option<String>,
    pub variables:   TemplateVariables,
}

/// 一括配信の宛先ごとの結果
#[derive(Debug)]
pub enum DispatchOutcome {
    /// 配信記録が作られた（`SUCCESS` または `FAILED`）
    Recorded(DeliveryRecord),
    /// 配信記録を作る前、または記録の途中で拒否された
    Rejected {
        recipient: String,
        error:     ServiceError,
    },
}

/// 配信コーディネーター
pub struct DispatchCoordinator {
    resolver:  TemplateResolver,
    renderer:  TemplateRenderer,
    ledger:    DeliveryLedger,
    transport: Arc<dyn MailTransport>,
    settings:  DispatchSettings,
    workers:   Arc<Semaphore>,
}

impl DispatchCoordinator {
    pub fn new(
        resolver: TemplateResolver,
        ledger: DeliveryLedger,
        transport: Arc<dyn MailTransport>,
        settings: DispatchSettings,
    ) -> Self {
        let workers = Arc::new(Semaphore::new(settings.worker_pool_size.max(1)));
        Self {
            resolver,
            renderer: TemplateRenderer::new(),
            ledger,
            transport,
            settings,
            workers,
        }
    }

    /// メールアドレスの形式を検証する
    pub fn validate_email(&self, address: &str) -> bool {
        email::is_valid(address)
    }

    /// 1 通を配信する
    ///
    /// 送信に失敗した場合も `Ok` で `FAILED` の配信記録を返す。
    ///
    /// # Errors
    ///
    /// - `ServiceError::Validation`: 宛先の形式、または件名の上書きが不正（記録なし）
    /// - `ServiceError::NotFound` / `ServiceError::Inactive`: テンプレートが使えない（記録なし）
    /// - `ServiceError::Persistence`: 配信記録の保存に失敗
    #[tracing::instrument(skip_all, fields(template_id = %request.template_id))]
    pub async fn send_one(&self, request: DispatchRequest) -> Result<DeliveryRecord, ServiceError> {
        let recipient = request.recipient.clone();
        let template_id = request.template_id.clone();

        let result = self.dispatch(request).await;
        if let Err(e) = &result {
            log_business_event!(
                event.category = event::category::MAIL,
                event.action = event::action::MAIL_REJECTED,
                event.entity_type = event::entity_type::DELIVERY_RECORD,
                event.result = event::result::FAILURE,
                mail.recipient = %masked_recipient(&recipient),
                mail.template_id = %template_id,
                error = %e,
                "配信を拒否しました"
            );
        }
        result
    }

    /// 同じテンプレートと変数で複数の宛先に配信する
    ///
    /// 結果は宛先リストと同じ順序・同じ件数で返す。宛先ごとの失敗は
    /// [`DispatchOutcome::Rejected`] または `FAILED` の記録として表現され、
    /// 他の宛先の配信には影響しない。
    ///
    /// # Errors
    ///
    /// - `ServiceError::Validation`: 宛先リストが空
    pub async fn send_bulk(
        self: &Arc<Self>,
        recipients: Vec<String>,
        template_id: TemplateId,
        variables: TemplateVariables,
    ) -> Result<Vec<DispatchOutcome>, ServiceError> {
        if recipients.is_empty() {
            return Err(ServiceError::Validation(
                "宛先を 1 件以上指定してください".to_string(),
            ));
        }

        let tasks: Vec<_> = recipients
            .into_iter()
            .map(|recipient| {
                let coordinator = Arc::clone(self);
                let request = DispatchRequest {
                    recipient:   recipient.clone(),
                    template_id: template_id.clone(),
                    subject:     None,
                    variables:   variables.clone(),
                };
                let handle = tokio::spawn(async move { coordinator.send_one(request).await });
                (recipient, handle)
            })
            .collect();

        let mut outcomes = Vec::with_capacity(tasks.len());
        for (recipient, handle) in tasks {
            let outcome = match handle.await {
                Ok(Ok(record)) => DispatchOutcome::Recorded(record),
                Ok(Err(error)) => DispatchOutcome::Rejected { recipient, error },
                Err(join_error) => {
                    tracing::error!(error = %join_error, "配信タスクが異常終了しました");
                    DispatchOutcome::Rejected {
                        recipient,
                        error: ServiceError::Internal(join_error.to_string()),
                    }
                }
            };
            outcomes.push(outcome);
        }

        let succeeded = outcomes
            .iter()
            .filter(|o| matches!(o, DispatchOutcome::Recorded(r) if r.status() == DeliveryStatus::Success))
            .count();
        log_business_event!(
            event.category = event::category::MAIL,
            event.action = event::action::BULK_DISPATCHED,
            event.result = event::result::SUCCESS,
            mail.template_id = %template_id,
            mail.total = outcomes.len(),
            mail.succeeded = succeeded,
            "一括配信が完了しました"
        );

        Ok(outcomes)
    }

    async fn dispatch(&self, request: DispatchRequest) -> Result<DeliveryRecord, ServiceError> {
        let recipient = EmailAddress::new(request.recipient)?;
        let subject_override = request
            .subject
            .filter(|s| !s.trim().is_empty())
            .map(TemplateSubject::new)
            .transpose()?;
        let template = self.resolver.resolve(&request.template_id).await?;

        let subject = subject_override
            .map(TemplateSubject::into_string)
            .unwrap_or_else(|| template.subject().as_str().to_string());
        let html_body = self
            .renderer
            .render(template.content().as_str(), &request.variables);

        let record = self
            .ledger
            .create(NewDelivery {
                recipient: recipient.clone(),
                subject: subject.clone(),
                template_id: request.template_id,
                sender: self.settings.sender_address.clone(),
                variables: snapshot(&request.variables),
            })
            .await?;

        let message = EmailMessage {
            from: self.settings.sender_address.clone(),
            to: recipient,
            subject,
            html_body,
        };
        let outcome = match self.transmit(message).await {
            Ok(()) => DeliveryOutcome::Success,
            Err(e) => DeliveryOutcome::Failed(e.to_string()),
        };

        let record = self.ledger.update_status(record.id(), outcome).await?;
        log_outcome(&record);

        Ok(record)
    }

    /// ワーカープールで送信する
    ///
    /// 許可証は送信が終わるまで blocking タスク側で保持する。
    async fn transmit(&self, message: EmailMessage) -> Result<(), TransportError> {
        let permit = Arc::clone(&self.workers)
            .acquire_owned()
            .await
            .map_err(|e| TransportError::WorkerUnavailable(e.to_string()))?;
        let transport = Arc::clone(&self.transport);

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            transport.send(&message)
        })
        .await
        .map_err(|e| TransportError::WorkerUnavailable(e.to_string()))?
    }
}

/// 変数のスナップショットを作る（失敗はログのみ）
fn snapshot(variables: &TemplateVariables) -> Option<String> {
    if variables.is_empty() {
        return None;
    }
    match variables.to_snapshot() {
        Ok(json) => Some(json),
        Err(e) => {
            tracing::warn!(error = %e, "テンプレート変数のシリアライズに失敗しました");
            None
        }
    }
}

fn masked_recipient(raw: &str) -> String {
    EmailAddress::new(raw)
        .map(|address| address.masked())
        .unwrap_or_else(|_| "<invalid>".to_string())
}

fn log_outcome(record: &DeliveryRecord) {
    match record.error_message() {
        None => log_business_event!(
            event.category = event::category::MAIL,
            event.action = event::action::MAIL_SENT,
            event.entity_type = event::entity_type::DELIVERY_RECORD,
            event.entity_id = %record.id(),
            event.result = event::result::SUCCESS,
            mail.recipient = %record.recipient().masked(),
            mail.template_id = %record.template_id(),
            "メールを送信しました"
        ),
        Some(error) => log_business_event!(
            event.category = event::category::MAIL,
            event.action = event::action::MAIL_FAILED,
            event.entity_type = event::entity_type::DELIVERY_RECORD,
            event.entity_id = %record.id(),
            event.result = event::result::FAILURE,
            mail.recipient = %record.recipient().masked(),
            mail.template_id = %record.template_id(),
            error = %error,
            "メール送信に失敗しました"
        ),
    }
}
