//! # ビジネスイベントログとエラーコンテキストの構造化ヘルパー
//!
//! 配信結果やテンプレート操作を `jq` で追跡できるよう、
//! ログフィールドの命名規約とヘルパーマクロを提供する。
//!
//! ## ビジネスイベント
//!
//! [`log_business_event!`] マクロで出力する。`event.kind = "business_event"` マーカーが
//! 自動付与され、`jq 'select(.["event.kind"] == "business_event")'` でフィルタできる。
//!
//! ## エラーコンテキスト
//!
//! `tracing::error!` に `error.category` + `error.kind` フィールドを直接追加する。
//! 定数は [`error`] モジュールで提供。
//!
//! ## フィールド命名規約
//!
//! ドット記法（`event.category`、`error.kind`）を使用する。
//! 宛先アドレスは必ずマスクした値（`EmailAddress::masked`）を出力すること。

/// ビジネスイベントを構造化ログとして出力する。
///
/// `event.kind = "business_event"` マーカーを自動付与し、
/// `tracing::info!` レベルで出力する。
///
/// ## 必須フィールド（慣例）
///
/// - `event.category`: イベントカテゴリ（[`event::category`] の定数を使用）
/// - `event.action`: アクション名（[`event::action`] の定数を使用）
/// - `event.result`: 結果（[`event::result`] の定数を使用）
///
/// ## 推奨フィールド
///
/// - `event.entity_type`: エンティティ種別（[`event::entity_type`] の定数を使用）
/// - `event.entity_id`: エンティティ ID
#[macro_export]
macro_rules! log_business_event {
    ($($args:tt)*) => {
        ::tracing::info!(
            event.kind = "business_event",
            $($args)*
        )
    };
}

/// イベントフィールドの定数
pub mod event {
    /// イベントカテゴリ
    pub mod category {
        pub const MAIL: &str = "mail";
        pub const TEMPLATE: &str = "template";
    }

    /// イベントアクション
    pub mod action {
        // 配信
        pub const MAIL_SENT: &str = "mail.sent";
        pub const MAIL_FAILED: &str = "mail.failed";
        pub const MAIL_REJECTED: &str = "mail.rejected";
        pub const BULK_DISPATCHED: &str = "mail.bulk_dispatched";

        // テンプレート
        pub const TEMPLATE_CREATED: &str = "template.created";
        pub const TEMPLATE_UPDATED: &str = "template.updated";
        pub const TEMPLATE_DELETED: &str = "template.deleted";
        pub const TEMPLATE_ACTIVATED: &str = "template.activated";
        pub const TEMPLATE_DEACTIVATED: &str = "template.deactivated";
    }

    /// エンティティ種別
    pub mod entity_type {
        pub const DELIVERY_RECORD: &str = "delivery_record";
        pub const TEMPLATE: &str = "template";
    }

    /// イベント結果
    pub mod result {
        pub const SUCCESS: &str = "success";
        pub const FAILURE: &str = "failure";
    }
}

/// エラーコンテキストフィールドの定数
pub mod error {
    /// エラーカテゴリ
    pub mod category {
        /// インフラストラクチャ（DB、SMTP、ワーカープール）
        pub const INFRASTRUCTURE: &str = "infrastructure";
    }

    /// エラー種別
    pub mod kind {
        pub const DATABASE: &str = "database";
        pub const INTERNAL: &str = "internal";
    }
}

#[cfg(test)]
mod tests {
    use super::event;

    #[test]
    fn test_配信アクションはmailプレフィックスを持つ() {
        for action in [
            event::action::MAIL_SENT,
            event::action::MAIL_FAILED,
            event::action::MAIL_REJECTED,
            event::action::BULK_DISPATCHED,
        ] {
            assert!(action.starts_with("mail."), "{action}");
        }
    }
}
