//! SMTP 送信実装
//!
//! lettre の同期 `SmtpTransport` を使用してメールを送信する。
//! 開発環境では Mailpit（ローカル SMTP サーバー）に接続する。

use bulkmail_domain::message::{EmailMessage, TransportError};
use lettre::{
    SmtpTransport,
    Transport,
    message::{Message, header::ContentType},
    transport::smtp::authentication::Credentials,
};

use super::MailTransport;

/// SMTP 認証情報
#[derive(Clone)]
pub struct SmtpCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for SmtpCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// SMTP 送信
///
/// `lettre::SmtpTransport` をラップする。
pub struct SmtpMailTransport {
    transport: SmtpTransport,
}

impl SmtpMailTransport {
    /// 新しい SMTP 送信インスタンスを作成
    ///
    /// # 引数
    ///
    /// - `host`: SMTP サーバーのホスト名（例: "localhost"）
    /// - `port`: SMTP サーバーのポート番号（例: 1025 for Mailpit）
    /// - `credentials`: 認証が必要なリレーの場合のみ指定
    pub fn new(host: &str, port: u16, credentials: Option<SmtpCredentials>) -> Self {
        // builder_dangerous: TLS なしで接続（Mailpit 等のローカル SMTP 向け）
        let mut builder = SmtpTransport::builder_dangerous(host).port(port);
        if let Some(creds) = credentials {
            builder = builder.credentials(Credentials::new(creds.username, creds.password));
        }

        Self {
            transport: builder.build(),
        }
    }
}

/// ドメインのメッセージを lettre のメッセージに変換する
fn build_message(message: &EmailMessage) -> Result<Message, TransportError> {
    Message::builder()
        .from(
            message
                .from
                .as_str()
                .parse()
                .map_err(|e| TransportError::SendFailed(format!("送信元アドレス不正: {e}")))?,
        )
        .to(message
            .to
            .as_str()
            .parse()
            .map_err(|e| TransportError::SendFailed(format!("宛先アドレス不正: {e}")))?)
        .subject(&message.subject)
        .header(ContentType::TEXT_HTML)
        .body(message.html_body.clone())
        .map_err(|e| TransportError::SendFailed(format!("メッセージ構築失敗: {e}")))
}

impl MailTransport for SmtpMailTransport {
    fn send(&self, message: &EmailMessage) -> Result<(), TransportError> {
        let email = build_message(message)?;

        self.transport
            .send(&email)
            .map_err(|e| TransportError::SendFailed(format!("SMTP 送信失敗: {e}")))?;

        Ok(())
    }
}
