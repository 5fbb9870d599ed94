//! # ユースケース層
//!
//! 配信パイプラインとテンプレート管理のビジネスロジックを実装する。
//!
//! ## 構成
//!
//! - [`template_resolver`]: 配信に使うテンプレートの取得と有効性確認
//! - [`template_renderer`]: `{{key}}` プレースホルダの置換
//! - [`delivery_ledger`]: 配信記録の作成・更新・検索
//! - [`dispatch_coordinator`]: 1 通の配信と一括配信
//! - [`history_query`]: 配信履歴の検索
//! - [`template_catalog`]: テンプレートの CRUD と有効化・無効化

pub mod delivery_ledger;
pub mod dispatch_coordinator;
pub mod history_query;
pub mod template_catalog;
pub mod template_renderer;
pub mod template_resolver;

pub use delivery_ledger::{DeliveryLedger, NewDelivery};
pub use dispatch_coordinator::{
    DispatchCoordinator,
    DispatchOutcome,
    DispatchRequest,
    DispatchSettings,
};
pub use history_query::HistoryQuery;
pub use template_catalog::{TemplateCatalog, TemplateInput};
pub use template_renderer::TemplateRenderer;
pub use template_resolver::TemplateResolver;
