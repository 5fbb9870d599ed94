//! # Dispatch Service ライブラリ
//!
//! テンプレートを使った一括メール配信サービスのコアモジュール。
//!
//! ## モジュール構成
//!
//! - `config`: 環境変数からの設定読み込み
//! - `error`: サービス層エラーと HTTP レスポンスへの変換
//! - `handler`: HTTP ハンドラ
//! - `usecase`: 配信パイプラインとテンプレート管理
//! - `test_utils`: テスト用ビルダー（`test-utils` feature 有効時のみ）

pub mod config;
pub mod error;
pub mod handler;
#[cfg(any(test, feature = "test-utils"))]
#[doc(hidden)]
pub mod test_utils;
pub mod usecase;
