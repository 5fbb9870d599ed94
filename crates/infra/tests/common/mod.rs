//! テスト共通フィクスチャ
//!
//! DB を使用する統合テストで共通利用するエンティティ生成ヘルパー。

// 各テストファイルが独立したクレートとしてコンパイルされるため、
// 使用しない関数に dead_code 警告が出る。モジュール全体で抑制する。
#![allow(dead_code)]

use bulkmail_domain::{
    delivery::{DeliveryRecord, DeliveryRecordId, NewDeliveryRecord},
    email::EmailAddress,
    template::{NewTemplate, Template, TemplateContent, TemplateId, TemplateName, TemplateSubject},
};
use chrono::{DateTime, TimeZone, Utc};

/// テスト用の固定タイムスタンプ（2026-03-10 09:00:00 UTC）
pub fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap()
}

/// テスト用テンプレートを作成する
pub fn build_template(name: &str, is_active: bool) -> Template {
    Template::new(NewTemplate {
        id: TemplateId::new(),
        name: TemplateName::new(name).unwrap(),
        subject: TemplateSubject::new("ようこそ").unwrap(),
        content: TemplateContent::new("<p>Hello {{name}}</p>").unwrap(),
        description: None,
        is_active,
        now: test_now(),
    })
}

/// テスト用の SENDING 配信記録を作成する
pub fn build_record(recipient: &str, template_id: &TemplateId, now: DateTime<Utc>) -> DeliveryRecord {
    DeliveryRecord::new(NewDeliveryRecord {
        id: DeliveryRecordId::new(),
        recipient: EmailAddress::new(recipient).unwrap(),
        subject: "ようこそ".to_string(),
        template_id: template_id.clone(),
        sender: EmailAddress::new("noreply@example.com").unwrap(),
        variables: Some(r#"{"name":"Ann"}"#.to_string()),
        now,
    })
}
