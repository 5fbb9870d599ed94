//! # 配信記録
//!
//! 1 回の送信試行ごとに 1 件作成される監査レコード。
//!
//! ## 状態遷移
//!
//! ```text
//! SENDING ──(送信成功)──▶ SUCCESS
//!    │
//!    └────(送信失敗)───▶ FAILED
//! ```
//!
//! - 記録は必ず `SENDING` で作成される（トランスポート呼び出し前の永続化チェックポイント）
//! - `SUCCESS` / `FAILED` は終端状態で、以降の遷移は `DomainError::InvalidTransition`
//! - ストア側でも `WHERE status = 'SENDING'` の条件付き更新で同じ不変条件を守る
//!
//! ## 使用例
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use bulkmail_domain::{
//!     delivery::{DeliveryRecord, DeliveryRecordId, DeliveryStatus, NewDeliveryRecord},
//!     email::EmailAddress,
//!     template::TemplateId,
//! };
//!
//! let now = chrono::Utc::now();
//! let record = DeliveryRecord::new(NewDeliveryRecord {
//!     id:          DeliveryRecordId::new(),
//!     recipient:   EmailAddress::new("user@example.com")?,
//!     subject:     "Welcome".to_string(),
//!     template_id: TemplateId::new(),
//!     sender:      EmailAddress::new("noreply@example.com")?,
//!     variables:   None,
//!     now,
//! });
//! assert_eq!(record.status(), DeliveryStatus::Sending);
//!
//! let record = record.complete(now)?;
//! assert_eq!(record.status(), DeliveryStatus::Success);
//! assert!(record.complete(now).is_err());
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::{DomainError, email::EmailAddress, template::TemplateId};

define_uuid_id! {
    /// 配信記録 ID
    ///
    /// delivery_records テーブルの主キー。台帳が作成時に採番する（UUID v7）。
    pub struct DeliveryRecordId;
}

/// 配信ステータス
///
/// delivery_records テーブルの `status` カラムに格納される値。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, IntoStaticStr, strum::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    /// 送信中（トランスポート呼び出し前に記録される）
    Sending,
    /// 送信成功
    Success,
    /// 送信失敗
    Failed,
}

impl DeliveryStatus {
    /// 終端状態か
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }
}

impl std::str::FromStr for DeliveryStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SENDING" => Ok(Self::Sending),
            "SUCCESS" => Ok(Self::Success),
            "FAILED" => Ok(Self::Failed),
            _ => Err(DomainError::Validation(format!(
                "不正な配信ステータス: {}",
                s
            ))),
        }
    }
}

/// 送信結果
///
/// `DeliveryLedger::update_status` に渡す終端状態。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// 送信成功
    Success,
    /// 送信失敗（トランスポートのエラー文言を保持）
    Failed(String),
}

impl DeliveryOutcome {
    pub fn status(&self) -> DeliveryStatus {
        match self {
            Self::Success => DeliveryStatus::Success,
            Self::Failed(_) => DeliveryStatus::Failed,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Success => None,
            Self::Failed(message) => Some(message),
        }
    }
}

/// 配信記録エンティティ
///
/// # 不変条件
///
/// - 作成時のステータスは常に `Sending`
/// - `error_message` は `Failed` のときのみ `Some`
/// - 終端状態（`Success` / `Failed`）からは遷移しない
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryRecord {
    id:            DeliveryRecordId,
    recipient:     EmailAddress,
    subject:       String,
    template_id:   TemplateId,
    sender:        EmailAddress,
    status:        DeliveryStatus,
    error_message: Option<String>,
    variables:     Option<String>,
    created_at:    DateTime<Utc>,
    updated_at:    DateTime<Utc>,
}

/// 配信記録の新規作成パラメータ
///
/// ステータスは含まない（常に `Sending` で作成される）。
pub struct NewDeliveryRecord {
    pub id:          DeliveryRecordId,
    pub recipient:   EmailAddress,
    pub subject:     String,
    pub template_id: TemplateId,
    pub sender:      EmailAddress,
    /// 変数のシリアライズ済みスナップショット（JSON テキスト）
    pub variables:   Option<String>,
    pub now:         DateTime<Utc>,
}

/// 配信記録の DB 復元パラメータ
pub struct DeliveryRecordRecord {
    pub id:            DeliveryRecordId,
    pub recipient:     EmailAddress,
    pub subject:       String,
    pub template_id:   TemplateId,
    pub sender:        EmailAddress,
    pub status:        DeliveryStatus,
    pub error_message: Option<String>,
    pub variables:     Option<String>,
    pub created_at:    DateTime<Utc>,
    pub updated_at:    DateTime<Utc>,
}

impl DeliveryRecord {
    /// 新しい配信記録を `Sending` で作成する
    pub fn new(params: NewDeliveryRecord) -> Self {
        Self {
            id:            params.id,
            recipient:     params.recipient,
            subject:       params.subject,
            template_id:   params.template_id,
            sender:        params.sender,
            status:        DeliveryStatus::Sending,
            error_message: None,
            variables:     params.variables,
            created_at:    params.now,
            updated_at:    params.now,
        }
    }

    /// 既存のデータから復元する
    pub fn from_db(record: DeliveryRecordRecord) -> Self {
        Self {
            id:            record.id,
            recipient:     record.recipient,
            subject:       record.subject,
            template_id:   record.template_id,
            sender:        record.sender,
            status:        record.status,
            error_message: record.error_message,
            variables:     record.variables,
            created_at:    record.created_at,
            updated_at:    record.updated_at,
        }
    }

    /// 送信成功として終端状態に遷移する
    ///
    /// # Errors
    ///
    /// - `DomainError::InvalidTransition`: 既に終端状態の場合
    pub fn complete(self, now: DateTime<Utc>) -> Result<Self, DomainError> {
        self.apply(DeliveryOutcome::Success, now)
    }

    /// 送信失敗として終端状態に遷移する
    ///
    /// # Errors
    ///
    /// - `DomainError::InvalidTransition`: 既に終端状態の場合
    pub fn fail(self, error_message: impl Into<String>, now: DateTime<Utc>) -> Result<Self, DomainError> {
        self.apply(DeliveryOutcome::Failed(error_message.into()), now)
    }

    /// 送信結果を適用する
    pub fn apply(self, outcome: DeliveryOutcome, now: DateTime<Utc>) -> Result<Self, DomainError> {
        if self.status.is_terminal() {
            return Err(DomainError::InvalidTransition(format!(
                "配信記録 {} は既に {} です",
                self.id, self.status
            )));
        }

        let status = outcome.status();
        let error_message = match outcome {
            DeliveryOutcome::Success => None,
            DeliveryOutcome::Failed(message) => Some(message),
        };

        Ok(Self {
            status,
            error_message,
            updated_at: now,
            ..self
        })
    }

    // Getter メソッド

    pub fn id(&self) -> &DeliveryRecordId {
        &self.id
    }

    pub fn recipient(&self) -> &EmailAddress {
        &self.recipient
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn template_id(&self) -> &TemplateId {
        &self.template_id
    }

    pub fn sender(&self) -> &EmailAddress {
        &self.sender
    }

    pub fn status(&self) -> DeliveryStatus {
        self.status
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn variables(&self) -> Option<&str> {
        self.variables.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
