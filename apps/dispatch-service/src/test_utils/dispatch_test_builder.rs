//! 配信テストビルダー
//!
//! インメモリのモックで配信コーディネーター一式を組み立てる。

use std::{sync::Arc, time::Duration};

use bulkmail_domain::{
    clock::SteppingClock,
    email::EmailAddress,
    template::{NewTemplate, Template, TemplateContent, TemplateId, TemplateName, TemplateSubject},
};
use bulkmail_infra::mock::{MockDeliveryRecordRepository, MockMailTransport, MockTemplateRepository};
use chrono::{DateTime, TimeZone, Utc};

use crate::usecase::{
    DeliveryLedger,
    DispatchCoordinator,
    DispatchSettings,
    HistoryQuery,
    NewDelivery,
    TemplateCatalog,
    TemplateResolver,
};

/// 配信テストビルダー
///
/// # 使用例
///
/// ```ignore
/// let builder = DispatchTestBuilder::new();
/// let setup = builder.build();
/// let template = setup.add_template("welcome", true);
/// let record = setup.sut.send_one(request).await?;
/// ```
pub struct DispatchTestBuilder {
    now:              DateTime<Utc>,
    worker_pool_size: usize,
}

/// 組み立て済みのコーディネーターとモック
pub struct DispatchTestSetup {
    pub sut:           Arc<DispatchCoordinator>,
    pub catalog:       Arc<TemplateCatalog>,
    pub history:       HistoryQuery,
    pub ledger:        DeliveryLedger,
    pub template_repo: MockTemplateRepository,
    pub record_repo:   MockDeliveryRecordRepository,
    pub transport:     MockMailTransport,
    pub clock:         Arc<SteppingClock>,
    now:               DateTime<Utc>,
}

impl DispatchTestBuilder {
    /// 2026-03-10 09:00 UTC を基準時刻とするビルダーを作成
    pub fn new() -> Self {
        Self {
            now:              Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap(),
            worker_pool_size: 4,
        }
    }

    pub fn with_worker_pool_size(mut self, size: usize) -> Self {
        self.worker_pool_size = size;
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// 件名 `Welcome`、本文 `<p>Hello {{name}}</p>` のテンプレートを作る
    pub fn template(&self, name: &str, is_active: bool) -> Template {
        build_template(name, is_active, self.now)
    }

    pub fn new_delivery(&self, recipient: &str) -> NewDelivery {
        NewDelivery {
            recipient:   EmailAddress::new(recipient).unwrap(),
            subject:     "Welcome".to_string(),
            template_id: TemplateId::new(),
            sender:      EmailAddress::new("noreply@bulkmail.example.com").unwrap(),
            variables:   None,
        }
    }

    pub fn build(&self) -> DispatchTestSetup {
        self.build_with(MockMailTransport::new())
    }

    /// 1 通あたり `delay` かかるトランスポートで組み立てる
    pub fn build_with_transport_delay(&self, delay: Duration) -> DispatchTestSetup {
        self.build_with(MockMailTransport::new().with_delay(delay))
    }

    fn build_with(&self, transport: MockMailTransport) -> DispatchTestSetup {
        let template_repo = MockTemplateRepository::new();
        let record_repo = MockDeliveryRecordRepository::new();
        let clock = Arc::new(SteppingClock::new(self.now));

        let ledger = DeliveryLedger::new(Arc::new(record_repo.clone()), clock.clone());
        let sut = Arc::new(DispatchCoordinator::new(
            TemplateResolver::new(Arc::new(template_repo.clone())),
            ledger.clone(),
            Arc::new(transport.clone()),
            DispatchSettings {
                sender_address:   EmailAddress::new("noreply@bulkmail.example.com").unwrap(),
                worker_pool_size: self.worker_pool_size,
            },
        ));
        let catalog = Arc::new(TemplateCatalog::new(
            Arc::new(template_repo.clone()),
            clock.clone(),
        ));

        DispatchTestSetup {
            sut,
            catalog,
            history: HistoryQuery::new(ledger.clone()),
            ledger,
            template_repo,
            record_repo,
            transport,
            clock,
            now: self.now,
        }
    }
}

impl Default for DispatchTestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchTestSetup {
    /// テンプレートを作ってリポジトリに登録する
    pub fn add_template(&self, name: &str, is_active: bool) -> Template {
        let template = build_template(name, is_active, self.now);
        self.template_repo.add_template(template.clone());
        template
    }
}

fn build_template(name: &str, is_active: bool, now: DateTime<Utc>) -> Template {
    Template::new(NewTemplate {
        id: TemplateId::new(),
        name: TemplateName::new(name).unwrap(),
        subject: TemplateSubject::new("Welcome").unwrap(),
        content: TemplateContent::new("<p>Hello {{name}}</p>").unwrap(),
        description: None,
        is_active,
        now,
    })
}
