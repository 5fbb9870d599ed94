//! # テンプレートレンダラー
//!
//! テンプレート本文の `{{key}}` プレースホルダをテンプレート変数で置換する。
//!
//! ## 置換規則
//!
//! - キーは完全一致（前後の空白も含めて比較する）
//! - 値が文字列ならそのまま、`null` は空文字列、数値・真偽値・配列・オブジェクトは JSON 表現
//! - 変数に存在しないキーは空文字列
//! - 置換は 1 パスのみで、置換後の値に含まれる `{{...}}` は展開しない
//! - エスケープは行わない
//! - 変数が空の場合は本文をそのまま返す

use std::sync::LazyLock;

use bulkmail_domain::message::TemplateVariables;
use regex::{Captures, Regex};
use serde_json::Value as JsonValue;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([^{}]*)\}\}").expect("プレースホルダの正規表現が不正"));

/// テンプレートレンダラー
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateRenderer;

impl TemplateRenderer {
    pub fn new() -> Self {
        Self
    }

    /// 本文のプレースホルダを置換する
    pub fn render(&self, content: &str, variables: &TemplateVariables) -> String {
        if variables.is_empty() {
            return content.to_string();
        }

        PLACEHOLDER
            .replace_all(content, |caps: &Captures<'_>| {
                substitution(variables.get(&caps[1]))
            })
            .into_owned()
    }
}

fn substitution(value: Option<&JsonValue>) -> String {
    match value {
        None | Some(JsonValue::Null) => String::new(),
        Some(JsonValue::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
