//! # Dispatch Service サーバー
//!
//! テンプレートを使ったメール配信を担当する API サーバー。
//!
//! ## 役割
//!
//! - **配信**: 1 通の配信と、宛先ごとに並行実行する一括配信
//! - **配信台帳**: 送信試行ごとの配信記録と履歴検索
//! - **テンプレート管理**: テンプレートの CRUD と有効化・無効化
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `DISPATCH_HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `DISPATCH_PORT` | **Yes** | ポート番号 |
//! | `DATABASE_URL` | **Yes** | PostgreSQL 接続 URL |
//! | `MAIL_BACKEND` | No | `smtp` / `noop`（デフォルト: `noop`） |
//! | `MAIL_FROM_ADDRESS` | No | 送信元メールアドレス |
//! | `MAIL_WORKER_POOL_SIZE` | No | 同時送信数の上限（デフォルト: `10`） |
//!
//! ## 起動方法
//!
//! ```bash
//! # 開発環境
//! cargo run -p bulkmail-dispatch-service
//!
//! # 本番環境
//! DISPATCH_PORT=13010 DATABASE_URL=postgres://... cargo run -p bulkmail-dispatch-service --release
//! ```

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{Router, routing::get};
use bulkmail_dispatch_service::{
    config::{DispatchConfig, MailBackend, MailConfig},
    handler::{DispatchState, ReadinessState, TemplateState, api_routes, readiness_check},
    usecase::{
        DeliveryLedger,
        DispatchCoordinator,
        DispatchSettings,
        HistoryQuery,
        TemplateCatalog,
        TemplateResolver,
    },
};
use bulkmail_domain::clock::{Clock, SystemClock};
use bulkmail_infra::{
    db,
    repository::{
        DeliveryRecordRepository,
        PostgresDeliveryRecordRepository,
        PostgresTemplateRepository,
        TemplateRepository,
    },
    transport::{MailTransport, NoopMailTransport, SmtpMailTransport},
};
use bulkmail_shared::observability::{TracingConfig, init_tracing};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Dispatch Service サーバーのエントリーポイント
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    // トレーシング初期化
    init_tracing(TracingConfig::from_env("dispatch-service"));
    let _tracing_guard = tracing::info_span!("app", service = "dispatch-service").entered();

    // 設定読み込み
    let config = DispatchConfig::from_env().context("設定の読み込みに失敗しました")?;

    tracing::info!(
        "Dispatch Service サーバーを起動します: {}:{}",
        config.host,
        config.port
    );

    // データベース接続プールを作成
    let pool = db::create_pool(&config.database_url, config.database_max_connections)
        .await
        .context("データベース接続に失敗しました")?;
    tracing::info!("データベースに接続しました");

    // マイグレーション実行
    db::run_migrations(&pool)
        .await
        .context("マイグレーションの実行に失敗しました")?;
    tracing::info!("マイグレーションを適用しました");

    // Readiness Check 用 State（pool が move される前に clone）
    let readiness_state = Arc::new(ReadinessState { pool: pool.clone() });

    // 依存コンポーネントを初期化
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let template_repo: Arc<dyn TemplateRepository> =
        Arc::new(PostgresTemplateRepository::new(pool.clone()));
    let record_repo: Arc<dyn DeliveryRecordRepository> =
        Arc::new(PostgresDeliveryRecordRepository::new(pool));
    let transport = build_transport(&config.mail);

    let ledger = DeliveryLedger::new(record_repo, clock.clone());
    let coordinator = Arc::new(DispatchCoordinator::new(
        TemplateResolver::new(template_repo.clone()),
        ledger.clone(),
        transport,
        DispatchSettings {
            sender_address:   config.mail.from_address.clone(),
            worker_pool_size: config.mail.worker_pool_size,
        },
    ));
    let dispatch_state = Arc::new(DispatchState {
        coordinator,
        history: HistoryQuery::new(ledger),
    });
    let template_state = Arc::new(TemplateState {
        catalog: Arc::new(TemplateCatalog::new(template_repo, clock)),
    });

    // ルーター構築
    let app = api_routes(dispatch_state, template_state)
        .merge(
            Router::new()
                .route("/health/ready", get(readiness_check))
                .with_state(readiness_state),
        )
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("アドレスのパースに失敗しました")?;

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Dispatch Service サーバーが起動しました: {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// 設定に応じた送信トランスポートを作成する
fn build_transport(config: &MailConfig) -> Arc<dyn MailTransport> {
    match config.backend {
        MailBackend::Smtp => {
            tracing::info!(
                "SMTP で送信します: {}:{}",
                config.smtp_host,
                config.smtp_port
            );
            Arc::new(SmtpMailTransport::new(
                &config.smtp_host,
                config.smtp_port,
                config.smtp_credentials.clone(),
            ))
        }
        MailBackend::Noop => {
            tracing::info!("メールは送信されません（MAIL_BACKEND=noop）");
            Arc::new(NoopMailTransport)
        }
    }
}
