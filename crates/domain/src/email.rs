//! # メールアドレス検証
//!
//! 宛先メールアドレスの構文チェックとドメイン部の抽出を行う。
//!
//! ## 設計方針
//!
//! - **構文のみ**: DNS / MX レコードの問い合わせは行わない（ネットワーク非依存）
//! - **正規表現グレード**: RFC 5322 の完全実装ではなく、実運用で十分な範囲に絞る
//! - **決定的**: 同じ入力に対して常に同じ結果を返し、失敗モードを持たない
//!
//! ## 受理する形式
//!
//! ```text
//! local-part  = atom *("." atom)        atom = 1*[A-Za-z0-9_+&*-]
//! domain      = 1*(label ".") tld       label = 1*[A-Za-z0-9-]
//! tld         = 2*7[A-Za-z]
//! ```
//!
//! ## 使用例
//!
//! ```rust
//! use bulkmail_domain::email::{extract_domain, is_valid};
//!
//! assert!(is_valid("user@example.com"));
//! assert!(!is_valid("not-an-email"));
//! assert_eq!(extract_domain("user@example.com"), Some("example.com"));
//! assert_eq!(extract_domain("not-an-email"), None);
//! ```

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::DomainError;

/// メールアドレスの最大長（RFC 5321 のパス長上限）
pub const MAX_EMAIL_LENGTH: usize = 254;

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9_+&*-]+(?:\.[a-zA-Z0-9_+&*-]+)*@(?:[a-zA-Z0-9-]+\.)+[a-zA-Z]{2,7}$")
        .expect("EMAIL_REGEX: invalid regex pattern")
});

/// メールアドレスが構文的に正しいかを判定する
pub fn is_valid(address: &str) -> bool {
    address.len() <= MAX_EMAIL_LENGTH && EMAIL_REGEX.is_match(address)
}

/// `@` より後ろのドメイン部を返す
///
/// 不正なアドレスの場合は `None`。
pub fn extract_domain(address: &str) -> Option<&str> {
    if !is_valid(address) {
        return None;
    }
    address.split_once('@').map(|(_, domain)| domain)
}

/// 検証済みメールアドレス（値オブジェクト）
///
/// # 不変条件
///
/// - [`is_valid`] が `true` を返す文字列のみを保持する
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// メールアドレスを作成する
    ///
    /// 前後の空白は除去してから検証する。
    ///
    /// # エラー
    ///
    /// 形式が不正な場合は `DomainError::Validation` を返す。
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into().trim().to_string();

        if value.is_empty() {
            return Err(DomainError::Validation(
                "メールアドレスは必須です".to_string(),
            ));
        }

        if !is_valid(&value) {
            return Err(DomainError::Validation(format!(
                "メールアドレスの形式が不正です: {value}"
            )));
        }

        Ok(Self(value))
    }

    /// ドメイン部を取得する
    pub fn domain(&self) -> &str {
        self.0
            .split_once('@')
            .map(|(_, domain)| domain)
            .unwrap_or_default()
    }

    /// ログ出力用にローカル部をマスクした表現を返す
    ///
    /// 例: `alice@example.com` → `a****@example.com`、`al@example.com` → `a***@example.com`
    pub fn masked(&self) -> String {
        let (local, domain) = self.0.split_once('@').unwrap_or((self.0.as_str(), ""));
        let head: String = local.chars().take(1).collect();
        if local.chars().count() <= 2 {
            format!("{head}***@{domain}")
        } else {
            format!("{head}****@{domain}")
        }
    }

    /// 文字列参照を取得する
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 所有権を持つ文字列に変換する
    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("user@example.com")]
    #[case("first.last@example.co.jp")]
    #[case("user+tag@mail.example.org")]
    #[case("a_b-c@sub-domain.example.io")]
    fn test_正しい形式のアドレスを受け入れる(#[case] address: &str) {
        assert!(is_valid(address));
    }

    #[rstest]
    #[case("")]
    #[case("not-an-email")]
    #[case("@example.com")]
    #[case("user@")]
    #[case("user@example")]
    #[case("user@example.c")]
    #[case("user@example.toolongtld")]
    #[case("user..name@example.com")]
    #[case(".user@example.com")]
    #[case("user name@example.com")]
    #[case("user@exa_mple.com")]
    fn test_不正な形式のアドレスを拒否する(#[case] address: &str) {
        assert!(!is_valid(address));
    }

    #[test]
    fn test_254文字を超えるアドレスを拒否する() {
        let local = "a".repeat(70);
        let label = "b".repeat(60);
        let address = format!("{local}@{label}.{label}.{label}.com");
        assert!(address.len() > MAX_EMAIL_LENGTH);
        assert!(!is_valid(&address));
    }

    #[test]
    fn test_extract_domainはアット以降を返す() {
        assert_eq!(extract_domain("user@mail.example.com"), Some("mail.example.com"));
    }

    #[test]
    fn test_extract_domainは不正なアドレスでnoneを返す() {
        assert_eq!(extract_domain("user@localhost"), None);
    }

    #[test]
    fn test_email_addressは前後の空白を除去する() {
        let email = EmailAddress::new("  user@example.com ").unwrap();
        assert_eq!(email.as_str(), "user@example.com");
        assert_eq!(email.domain(), "example.com");
    }

    #[test]
    fn test_email_addressは不正な形式でバリデーションエラー() {
        let result = EmailAddress::new("not-an-email");
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[rstest]
    #[case("alice@example.com", "a****@example.com")]
    #[case("al@example.com", "a***@example.com")]
    #[case("a@example.com", "a***@example.com")]
    fn test_maskedはローカル部を伏せる(#[case] input: &str, #[case] expected: &str) {
        let email = EmailAddress::new(input).unwrap();
        assert_eq!(email.masked(), expected);
    }

    #[test]
    fn test_デシリアライズ時にも検証される() {
        let ok: Result<EmailAddress, _> = serde_json::from_str("\"user@example.com\"");
        let ng: Result<EmailAddress, _> = serde_json::from_str("\"broken\"");

        assert!(ok.is_ok());
        assert!(ng.is_err());
    }
}
