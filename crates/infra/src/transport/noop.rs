//! Noop 送信実装
//!
//! メールを実際に送信せず、ログ出力のみ行う。
//! ローカル開発や配信無効化時に使用する。

use bulkmail_domain::message::{EmailMessage, TransportError};

use super::MailTransport;

/// Noop 送信（ログ出力のみ）
#[derive(Debug, Clone)]
pub struct NoopMailTransport;

impl MailTransport for NoopMailTransport {
    fn send(&self, message: &EmailMessage) -> Result<(), TransportError> {
        tracing::info!(
            to = %message.to.masked(),
            subject = %message.subject,
            "Noop: メール送信をスキップ"
        );
        Ok(())
    }
}
