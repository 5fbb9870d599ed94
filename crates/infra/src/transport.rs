//! # メール送信トランスポート
//!
//! 実際のネットワーク送信を担当するインフラストラクチャモジュール。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: `MailTransport` trait でメール送信を抽象化
//! - **ブロッキング API**: `send` は同期呼び出しで、呼び出し側（配信コーディネーター）が
//!   `tokio::task::spawn_blocking` 上で実行する
//! - **2 つの実装**: SMTP（lettre、Mailpit 等）、Noop（送信しない）
//! - **環境変数切替**: `MAIL_BACKEND` でランタイム選択

mod noop;
mod smtp;

use bulkmail_domain::message::{EmailMessage, TransportError};
pub use noop::NoopMailTransport;
pub use smtp::{SmtpCredentials, SmtpMailTransport};

/// メール送信トレイト
///
/// 実装はブロッキングしてよい。非同期ランタイムのワーカースレッドから直接呼ばないこと。
pub trait MailTransport: Send + Sync {
    /// メールを送信する
    fn send(&self, message: &EmailMessage) -> Result<(), TransportError>;
}
