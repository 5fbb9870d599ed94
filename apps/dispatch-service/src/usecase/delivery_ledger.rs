//! # 配信台帳
//!
//! 送信試行ごとに 1 件の配信記録を作成し、送信結果で 1 回だけ更新する。
//!
//! ## 状態遷移
//!
//! ```text
//! create ──▶ SENDING ──update_status──▶ SUCCESS | FAILED（終端）
//! ```
//!
//! 終端状態の記録への更新はドメイン層（`DeliveryRecord::apply`）と
//! ストアの条件付き UPDATE の両方で拒否される。

use std::sync::Arc;

use bulkmail_domain::{
    clock::Clock,
    delivery::{DeliveryOutcome, DeliveryRecord, DeliveryRecordId, NewDeliveryRecord},
    email::EmailAddress,
    template::TemplateId,
};
use bulkmail_infra::repository::DeliveryRecordRepository;
use chrono::NaiveDate;

use crate::error::ServiceError;

/// 配信記録の作成パラメータ
///
/// ステータスは常に `SENDING` で作成されるため指定できない。
#[derive(Debug, Clone)]
pub struct NewDelivery {
    pub recipient:   EmailAddress,
    pub subject:     String,
    pub template_id: TemplateId,
    pub sender:      EmailAddress,
    /// テンプレート変数の JSON スナップショット
    pub variables:   Option<String>,
}

/// 配信台帳
#[derive(Clone)]
pub struct DeliveryLedger {
    repository: Arc<dyn DeliveryRecordRepository>,
    clock:      Arc<dyn Clock>,
}

impl DeliveryLedger {
    pub fn new(repository: Arc<dyn DeliveryRecordRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// `SENDING` の配信記録を作成する
    pub async fn create(&self, new: NewDelivery) -> Result<DeliveryRecord, ServiceError> {
        let record = DeliveryRecord::new(NewDeliveryRecord {
            id:          DeliveryRecordId::new(),
            recipient:   new.recipient,
            subject:     new.subject,
            template_id: new.template_id,
            sender:      new.sender,
            variables:   new.variables,
            now:         self.clock.now(),
        });
        self.repository.insert(&record).await?;

        tracing::debug!(record_id = %record.id(), "配信記録を作成しました");
        Ok(record)
    }

    /// 送信結果を記録する
    ///
    /// # Errors
    ///
    /// - `ServiceError::NotFound`: 配信記録が存在しない
    /// - `ServiceError::Conflict`: 配信記録が既に終端状態
    pub async fn update_status(
        &self,
        id: &DeliveryRecordId,
        outcome: DeliveryOutcome,
    ) -> Result<DeliveryRecord, ServiceError> {
        let current = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("配信記録が見つかりません: {id}")))?;

        let updated = current.apply(outcome, self.clock.now())?;
        self.repository.update_status(&updated).await?;

        tracing::debug!(record_id = %id, status = %updated.status(), "配信記録を更新しました");
        Ok(updated)
    }

    /// 宛先の配信記録を新しい順で取得する
    pub async fn find_by_recipient(&self, recipient: &str) -> Result<Vec<DeliveryRecord>, ServiceError> {
        Ok(self.repository.find_by_recipient(recipient.trim()).await?)
    }

    /// 作成日（UTC）が `start`〜`end`（両端含む）の配信記録を取得する
    ///
    /// `start > end` の場合は空を返す。
    pub async fn find_by_sent_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DeliveryRecord>, ServiceError> {
        if start > end {
            return Ok(Vec::new());
        }
        Ok(self
            .repository
            .find_by_created_date_between(start, end)
            .await?)
    }
}
