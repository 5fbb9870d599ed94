//! # テストユーティリティ
//!
//! ユースケース・ハンドラのテストで共通のセットアップを提供する。

mod dispatch_test_builder;

pub use dispatch_test_builder::{DispatchTestBuilder, DispatchTestSetup};
