//! # リポジトリ実装
//!
//! テンプレートストアと配信記録ストアの具体的な実装を提供する。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: ユースケース層は `Arc<dyn XRepository>` 経由で利用する
//! - **データベース抽象化**: sqlx を使用し、PostgreSQL 固有の処理をカプセル化
//! - **テスタビリティ**: `test-utils` feature でインメモリ実装（[`crate::mock`]）を公開

pub mod delivery_record_repository;
pub mod template_repository;

pub use delivery_record_repository::{DeliveryRecordRepository, PostgresDeliveryRecordRepository};
pub use template_repository::{PostgresTemplateRepository, TemplateRepository};
