//! # テスト用モック
//!
//! ユースケーステストで使用するインメモリのリポジトリとトランスポート。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! bulkmail-infra = { workspace = true, features = ["test-utils"] }
//! ```

use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc,
        Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use bulkmail_domain::{
    delivery::{DeliveryRecord, DeliveryRecordId, DeliveryStatus},
    message::{EmailMessage, TransportError},
    template::{Template, TemplateId},
};
use chrono::NaiveDate;

use crate::{
    error::InfraError,
    repository::{DeliveryRecordRepository, TemplateRepository},
    transport::MailTransport,
};

// ===== MockTemplateRepository =====

#[derive(Clone, Default)]
pub struct MockTemplateRepository {
    templates: Arc<Mutex<Vec<Template>>>,
}

impl MockTemplateRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_template(&self, template: Template) {
        self.templates.lock().unwrap().push(template);
    }

    pub fn templates(&self) -> Vec<Template> {
        self.templates.lock().unwrap().clone()
    }
}

#[async_trait]
impl TemplateRepository for MockTemplateRepository {
    async fn find_by_id(&self, id: &TemplateId) -> Result<Option<Template>, InfraError> {
        Ok(self
            .templates
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id() == id)
            .cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Template>, InfraError> {
        Ok(self
            .templates
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.name().as_str() == name)
            .cloned())
    }

    async fn find_all(&self) -> Result<Vec<Template>, InfraError> {
        let mut templates = self.templates.lock().unwrap().clone();
        templates.sort_by(|a, b| a.name().as_str().cmp(b.name().as_str()));
        Ok(templates)
    }

    async fn find_all_active(&self) -> Result<Vec<Template>, InfraError> {
        let mut templates: Vec<Template> = self
            .templates
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.is_active())
            .cloned()
            .collect();
        templates.sort_by(|a, b| a.name().as_str().cmp(b.name().as_str()));
        Ok(templates)
    }

    async fn insert(&self, template: &Template) -> Result<(), InfraError> {
        let mut templates = self.templates.lock().unwrap();
        if templates.iter().any(|t| t.name() == template.name()) {
            return Err(InfraError::conflict("Template", template.name().as_str()));
        }
        templates.push(template.clone());
        Ok(())
    }

    async fn update(&self, template: &Template) -> Result<(), InfraError> {
        let mut templates = self.templates.lock().unwrap();
        if templates
            .iter()
            .any(|t| t.id() != template.id() && t.name() == template.name())
        {
            return Err(InfraError::conflict("Template", template.name().as_str()));
        }
        if let Some(pos) = templates.iter().position(|t| t.id() == template.id()) {
            templates[pos] = template.clone();
        }
        Ok(())
    }

    async fn delete(&self, id: &TemplateId) -> Result<bool, InfraError> {
        let mut templates = self.templates.lock().unwrap();
        let before = templates.len();
        templates.retain(|t| t.id() != id);
        Ok(templates.len() < before)
    }
}

// ===== MockDeliveryRecordRepository =====

/// テスト用のモック DeliveryRecordRepository
///
/// `fail_writes(true)` で書き込みを `InfraError` にし、永続化失敗を再現できる。
#[derive(Clone, Default)]
pub struct MockDeliveryRecordRepository {
    records:     Arc<Mutex<Vec<DeliveryRecord>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MockDeliveryRecordRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<DeliveryRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn add_record(&self, record: DeliveryRecord) {
        self.records.lock().unwrap().push(record);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), InfraError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(InfraError::unexpected("書き込み失敗（モック）"));
        }
        Ok(())
    }
}

#[async_trait]
impl DeliveryRecordRepository for MockDeliveryRecordRepository {
    async fn insert(&self, record: &DeliveryRecord) -> Result<(), InfraError> {
        self.check_writable()?;
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn update_status(&self, record: &DeliveryRecord) -> Result<(), InfraError> {
        self.check_writable()?;
        let mut records = self.records.lock().unwrap();
        match records
            .iter()
            .position(|r| r.id() == record.id() && r.status() == DeliveryStatus::Sending)
        {
            Some(pos) => {
                records[pos] = record.clone();
                Ok(())
            }
            None => Err(InfraError::conflict(
                "DeliveryRecord",
                record.id().to_string(),
            )),
        }
    }

    async fn find_by_id(&self, id: &DeliveryRecordId) -> Result<Option<DeliveryRecord>, InfraError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id() == id)
            .cloned())
    }

    async fn find_by_recipient(&self, recipient: &str) -> Result<Vec<DeliveryRecord>, InfraError> {
        let mut records: Vec<DeliveryRecord> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.recipient().as_str() == recipient)
            .cloned()
            .collect();
        records.sort_by_key(|r| std::cmp::Reverse((r.created_at(), *r.id().as_uuid())));
        Ok(records)
    }

    async fn find_by_created_date_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DeliveryRecord>, InfraError> {
        let mut records: Vec<DeliveryRecord> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| {
                let date = r.created_at().date_naive();
                start <= date && date <= end
            })
            .cloned()
            .collect();
        records.sort_by_key(|r| (r.created_at(), *r.id().as_uuid()));
        Ok(records)
    }
}

// ===== MockMailTransport =====

/// テスト用のモック MailTransport
///
/// - 送信したメッセージを記録する
/// - `fail_for` に登録した宛先への送信は `TransportError::SendFailed` を返す
/// - `with_delay` で 1 通あたりの送信時間を模擬し、同時送信数のピークを計測できる
/// - `delay_for` で宛先ごとに送信時間を変え、完了順を入れ替えられる
#[derive(Clone, Default)]
pub struct MockMailTransport {
    sent:          Arc<Mutex<Vec<EmailMessage>>>,
    failing:       Arc<Mutex<HashSet<String>>>,
    delay:         Option<Duration>,
    delays:        Arc<Mutex<HashMap<String, Duration>>>,
    in_flight:     Arc<AtomicUsize>,
    peak_inflight: Arc<AtomicUsize>,
}

impl MockMailTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// 指定した宛先への送信を失敗させる
    pub fn fail_for(&self, recipient: &str) {
        self.failing.lock().unwrap().insert(recipient.to_string());
    }

    /// 指定した宛先への送信だけ `delay` かける（`with_delay` より優先）
    pub fn delay_for(&self, recipient: &str, delay: Duration) {
        self.delays
            .lock()
            .unwrap()
            .insert(recipient.to_string(), delay);
    }

    /// 送信が完了した順のメッセージ
    pub fn sent_messages(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// 同時に実行された送信数の最大値
    pub fn peak_in_flight(&self) -> usize {
        self.peak_inflight.load(Ordering::SeqCst)
    }
}

impl MailTransport for MockMailTransport {
    fn send(&self, message: &EmailMessage) -> Result<(), TransportError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_inflight.fetch_max(current, Ordering::SeqCst);

        let delay = self
            .delays
            .lock()
            .unwrap()
            .get(message.to.as_str())
            .copied()
            .or(self.delay);
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }

        let result = if self.failing.lock().unwrap().contains(message.to.as_str()) {
            Err(TransportError::SendFailed(format!(
                "mailbox unavailable: {}",
                message.to
            )))
        } else {
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
