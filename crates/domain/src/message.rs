//! # メールメッセージ
//!
//! トランスポートに渡す送信単位と、テンプレート変数・送信エラーを定義する。
//!
//! ## 設計方針
//!
//! - **送信失敗はデータ**: [`TransportError`] は呼び出し元のエラーにならず、
//!   配信記録の `FAILED` + エラーメッセージとして残る
//! - **変数は JSON 値**: 文字列以外（数値、真偽値）もそのまま受け取り、レンダリング時に文字列化する

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::email::EmailAddress;

/// メールメッセージ
///
/// テンプレートレンダリングの出力。`MailTransport` に渡される。
/// 本文は常に HTML として送信する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    /// 送信元メールアドレス
    pub from:      EmailAddress,
    /// 送信先メールアドレス
    pub to:        EmailAddress,
    /// 件名
    pub subject:   String,
    /// HTML 本文
    pub html_body: String,
}

/// メール送信エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// メール送信に失敗（SMTP 応答エラー、接続失敗など）
    #[error("メール送信に失敗: {0}")]
    SendFailed(String),

    /// 送信ワーカーを確保できなかった
    #[error("送信ワーカーを利用できません: {0}")]
    WorkerUnavailable(String),
}

/// テンプレート変数
///
/// プレースホルダ名 → 値 のマッピング。キーは一意で、順序に意味はない。
/// スナップショットの再現性のため、内部は `BTreeMap`（キー順）で保持する。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateVariables(BTreeMap<String, JsonValue>);

impl TemplateVariables {
    pub fn new() -> Self {
        Self::default()
    }

    /// 変数を追加する（同名キーは上書き）
    pub fn with(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 配信記録に保存する JSON テキストに変換する
    pub fn to_snapshot(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.0)
    }
}

impl From<BTreeMap<String, JsonValue>> for TemplateVariables {
    fn from(value: BTreeMap<String, JsonValue>) -> Self {
        Self(value)
    }
}

impl<K: Into<String>, V: Into<JsonValue>> FromIterator<(K, V)> for TemplateVariables {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
