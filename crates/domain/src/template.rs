//! # メールテンプレート
//!
//! 件名と本文（プレースホルダ付き）の組を名前付きで管理するドメインモデル。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 説明 |
//! |---|------------|------|
//! | [`Template`] | テンプレート | 再利用可能な件名 + 本文。有効 / 無効を切り替えられる |
//! | [`TemplateName`] | テンプレート名 | システム内で一意 |
//! | プレースホルダ | `{{key}}` | 送信時に変数で置換されるマーカー |
//!
//! ## 設計方針
//!
//! - **明示的な更新のみ**: 状態の変更は `updated` / `activated` / `deactivated` を経由し、
//!   変更後の新インスタンスを返す
//! - **配信記録との独立**: 削除しても過去の配信記録は変更されない（記録側は ID のコピーを持つ）

use chrono::{DateTime, Utc};

define_uuid_id! {
    /// テンプレート ID
    ///
    /// email_templates テーブルの主キー。UUID v7 を使用。
    pub struct TemplateId;
}

define_validated_string! {
    /// テンプレート名（1〜100 文字、システム内で一意）
    pub struct TemplateName {
        label: "テンプレート名",
        max_length: 100,
    }
}

define_validated_string! {
    /// テンプレートの件名（1〜255 文字）
    pub struct TemplateSubject {
        label: "件名",
        max_length: 255,
    }
}

define_validated_string! {
    /// テンプレート本文（HTML、プレースホルダを含む）
    pub struct TemplateContent {
        label: "本文",
        max_length: 100_000,
    }
}

/// メールテンプレートエンティティ
///
/// # 不変条件
///
/// - `name` はシステム内で一意（リポジトリ層の UNIQUE 制約で保証）
/// - `updated_at >= created_at`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    id:          TemplateId,
    name:        TemplateName,
    subject:     TemplateSubject,
    content:     TemplateContent,
    description: Option<String>,
    is_active:   bool,
    created_at:  DateTime<Utc>,
    updated_at:  DateTime<Utc>,
}

/// テンプレートの新規作成パラメータ
pub struct NewTemplate {
    pub id:          TemplateId,
    pub name:        TemplateName,
    pub subject:     TemplateSubject,
    pub content:     TemplateContent,
    pub description: Option<String>,
    pub is_active:   bool,
    pub now:         DateTime<Utc>,
}

/// テンプレートの DB 復元パラメータ
pub struct TemplateRecord {
    pub id:          TemplateId,
    pub name:        TemplateName,
    pub subject:     TemplateSubject,
    pub content:     TemplateContent,
    pub description: Option<String>,
    pub is_active:   bool,
    pub created_at:  DateTime<Utc>,
    pub updated_at:  DateTime<Utc>,
}

/// テンプレートの更新内容
///
/// `is_active` が `None` の場合、有効フラグは変更しない。
pub struct TemplateChanges {
    pub name:        TemplateName,
    pub subject:     TemplateSubject,
    pub content:     TemplateContent,
    pub description: Option<String>,
    pub is_active:   Option<bool>,
}

impl Template {
    /// 新しいテンプレートを作成する
    pub fn new(params: NewTemplate) -> Self {
        Self {
            id:          params.id,
            name:        params.name,
            subject:     params.subject,
            content:     params.content,
            description: params.description,
            is_active:   params.is_active,
            created_at:  params.now,
            updated_at:  params.now,
        }
    }

    /// 既存のデータから復元する
    pub fn from_db(record: TemplateRecord) -> Self {
        Self {
            id:          record.id,
            name:        record.name,
            subject:     record.subject,
            content:     record.content,
            description: record.description,
            is_active:   record.is_active,
            created_at:  record.created_at,
            updated_at:  record.updated_at,
        }
    }

    /// 内容を更新した新インスタンスを返す
    pub fn updated(self, changes: TemplateChanges, now: DateTime<Utc>) -> Self {
        Self {
            name: changes.name,
            subject: changes.subject,
            content: changes.content,
            description: changes.description,
            is_active: changes.is_active.unwrap_or(self.is_active),
            updated_at: now,
            ..self
        }
    }

    /// 有効化した新インスタンスを返す
    pub fn activated(self, now: DateTime<Utc>) -> Self {
        Self {
            is_active: true,
            updated_at: now,
            ..self
        }
    }

    /// 無効化した新インスタンスを返す
    pub fn deactivated(self, now: DateTime<Utc>) -> Self {
        Self {
            is_active: false,
            updated_at: now,
            ..self
        }
    }

    // --- ゲッター ---

    pub fn id(&self) -> &TemplateId {
        &self.id
    }

    pub fn name(&self) -> &TemplateName {
        &self.name
    }

    pub fn subject(&self) -> &TemplateSubject {
        &self.subject
    }

    pub fn content(&self) -> &TemplateContent {
        &self.content
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
