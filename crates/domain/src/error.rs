//! # ドメイン層エラー定義
//!
//! ビジネスルール違反やドメイン固有の例外状態を表現するエラー型。
//!
//! ## 設計方針
//!
//! - **型による分類**: エラーの種類を列挙型で明示し、パターンマッチで処理可能に
//! - **thiserror 活用**: `#[error(...)]` マクロでエラーメッセージを自動生成
//! - **HTTP ステータスへのマッピング**: ユースケース層で `ServiceError` に変換する
//!
//! ## エラーの種類と HTTP ステータスの対応
//!
//! | エラー種別 | HTTP ステータス | 用途 |
//! |-----------|----------------|------|
//! | `Validation` | 400 Bad Request | 入力値の検証失敗 |
//! | `NotFound` | 404 Not Found | エンティティが存在しない |
//! | `Conflict` | 409 Conflict | 一意制約違反 |
//! | `InvalidTransition` | 409 Conflict | 終端状態の配信記録に対する状態遷移 |
//!
//! ## 使用例
//!
//! ```rust
//! use bulkmail_domain::DomainError;
//!
//! fn validate_name(name: &str) -> Result<(), DomainError> {
//!     if name.is_empty() {
//!         return Err(DomainError::Validation("名前は必須です".to_string()));
//!     }
//!     Ok(())
//! }
//!
//! let error = DomainError::NotFound {
//!     entity_type: "Template",
//!     id:          "0190a2b4-0000-7000-8000-000000000000".to_string(),
//! };
//! assert!(error.to_string().contains("Template"));
//! ```

use thiserror::Error;

/// ドメイン層で発生するエラー
///
/// ビジネスロジックの実行中に発生する例外状態を表現する。
/// ユースケース層でこのエラーを受け取り、`ServiceError` に変換する。
#[derive(Debug, Error)]
pub enum DomainError {
    /// バリデーションエラー
    ///
    /// 入力値がビジネスルールに違反している場合に使用する。
    ///
    /// # 例
    ///
    /// - メールアドレスの形式不正
    /// - テンプレート名の文字数超過
    #[error("バリデーションエラー: {0}")]
    Validation(String),

    /// エンティティが見つからない
    ///
    /// # フィールド
    ///
    /// - `entity_type`: エンティティの種類（コンパイル時に決定される `&'static str`）
    /// - `id`: 検索に使用した識別子
    #[error("{entity_type} が見つかりません: {id}")]
    NotFound {
        /// エンティティの種類（"Template", "DeliveryRecord" など）
        entity_type: &'static str,
        /// 検索に使用した識別子
        id:          String,
    },

    /// 競合エラー
    ///
    /// テンプレート名の重複など、既存データとの衝突時に使用する。
    #[error("競合が発生しました: {0}")]
    Conflict(String),

    /// 不正な状態遷移
    ///
    /// 配信記録が `SUCCESS` / `FAILED` に到達した後の再遷移を拒否する。
    #[error("不正な状態遷移: {0}")]
    InvalidTransition(String),
}
