//! # Bulkmail ドメイン層
//!
//! テンプレートメール一括配信のドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! このクレートは DDD（ドメイン駆動設計）の原則に従い、以下を提供する:
//!
//! - **エンティティ**: 一意の識別子を持つオブジェクト（Template, DeliveryRecord）
//! - **値オブジェクト**: 識別子を持たない不変オブジェクト（EmailAddress, TemplateName）
//! - **ドメインエラー**: ビジネスルール違反を表現するエラー型
//!
//! ## 依存関係の方向
//!
//! ```text
//! dispatch-service → infra → domain
//! ```
//!
//! ドメイン層はインフラ層（DB、SMTP）には一切依存しない。
//!
//! ## モジュール構成
//!
//! - [`email`] - メールアドレスの構文検証とドメイン抽出
//! - [`template`] - メールテンプレート
//! - [`delivery`] - 配信記録と配信ステータス
//! - [`message`] - 送信メッセージ、テンプレート変数、送信エラー
//! - [`clock`] - 時刻プロバイダ
//! - [`error`] - ドメイン層で発生するエラーの定義

#[macro_use]
mod macros;

pub mod clock;
pub mod delivery;
pub mod email;
pub mod error;
pub mod message;
pub mod template;

pub use error::DomainError;
