//! # Furnish Service サーバー
//!
//! 交通違反通知書に対する申告（furnish）の受付・審査・照会を担当する
//! 内部サービス。
//!
//! ## 役割
//!
//! - **申告受付**: eService からの申告を検証し、自動承認または手動審査に振り分ける
//! - **審査処分**: 審査担当官による承認・却下と、それに伴う通知・ポータル連携
//! - **照会**: 審査ダッシュボード向けの一覧・詳細プロジェクション
//!
//! ## アクセス制御
//!
//! Furnish Service は内部ネットワークからのみアクセス可能とする。
//! 外部からのリクエストは eService ポータル / 審査ダッシュボードの
//! BFF を経由する必要がある。
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `FURNISH_HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `FURNISH_PORT` | **Yes** | ポート番号 |
//! | `DATABASE_URL` | **Yes** | PostgreSQL 接続 URL |
//! | `PORTAL_BASE_URL` | No | eService ポータル内部 API のベース URL |
//! | `NOTIFICATION_BACKEND` | No | `smtp` または `noop`（デフォルト: `noop`） |
//!
//! ## 起動方法
//!
//! ```bash
//! FURNISH_PORT=3002 DATABASE_URL=postgres://... cargo run -p noticeflow-furnish-service
//! ```

use std::{net::SocketAddr, sync::Arc};

use axum::{
    Router,
    routing::{get, post},
};
use noticeflow_domain::clock::SystemClock;
use noticeflow_furnish_service::{
    config::FurnishConfig,
    handler::{
        DashboardState,
        FurnishState,
        approve_furnish,
        get_application_detail,
        health_check,
        list_furnish_applications,
        reject_furnish,
        submit_furnish,
    },
    usecase::{
        FurnishApprovalService,
        FurnishDashboardService,
        FurnishRejectionService,
        FurnishSubmissionService,
        NotificationService,
        furnish::FurnishPersistenceService,
        notification::TemplateRenderer,
    },
};
use noticeflow_infra::{
    db::{self, PgTransactionManager},
    notification::{NoopNotificationSender, NotificationSender, SmtpNotificationSender},
    portal::HttpEservicePortalClient,
    repository::{
        PostgresExclusionListRepository,
        PostgresFurnishApplicationRepository,
        PostgresFurnishDocumentRepository,
        PostgresNoticeRepository,
        PostgresOwnerDriverRepository,
        PostgresSuspensionRepository,
    },
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Furnish Service サーバーのエントリーポイント
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    // トレーシング初期化
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,noticeflow=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 設定読み込み
    let config = FurnishConfig::from_env().expect("設定の読み込みに失敗しました");

    tracing::info!(
        "Furnish Service サーバーを起動します: {}:{}",
        config.host,
        config.port
    );

    // データベース接続プールを作成
    let pool = db::create_pool(&config.database_url)
        .await
        .expect("データベース接続に失敗しました");
    tracing::info!("データベースに接続しました");

    // リポジトリと共有コンポーネント
    let notice_repo = Arc::new(PostgresNoticeRepository::new(pool.clone()));
    let application_repo = Arc::new(PostgresFurnishApplicationRepository::new(pool.clone()));
    let document_repo = Arc::new(PostgresFurnishDocumentRepository::new(pool.clone()));
    let owner_driver_repo = Arc::new(PostgresOwnerDriverRepository::new(pool.clone()));
    let suspension_repo = Arc::new(PostgresSuspensionRepository::new(pool.clone()));
    let exclusion_repo = Arc::new(PostgresExclusionListRepository::new(pool.clone()));
    let tx_manager = Arc::new(PgTransactionManager::new(pool.clone()));
    let clock = Arc::new(SystemClock);

    // 通知バックエンドの選択
    let sender: Arc<dyn NotificationSender> = match config.notification.backend.as_str() {
        "smtp" => Arc::new(SmtpNotificationSender::new(
            &config.notification.smtp_host,
            config.notification.smtp_port,
            config.notification.from_address.clone(),
        )),
        _ => Arc::new(NoopNotificationSender),
    };
    let template_renderer =
        TemplateRenderer::new().expect("メールテンプレートの初期化に失敗しました");
    let notification = NotificationService::new(sender, template_renderer);

    let portal = Arc::new(HttpEservicePortalClient::new(config.portal.base_url.clone()));

    // 申告パイプラインの組み立て
    let persistence = || {
        FurnishPersistenceService::new(
            application_repo.clone(),
            document_repo.clone(),
            owner_driver_repo.clone(),
            suspension_repo.clone(),
            clock.clone(),
        )
    };

    let submission = FurnishSubmissionService::new(
        notice_repo.clone(),
        application_repo.clone(),
        owner_driver_repo.clone(),
        exclusion_repo.clone(),
        persistence(),
        tx_manager.clone(),
    );
    let rejection = FurnishRejectionService::new(
        application_repo.clone(),
        notice_repo.clone(),
        persistence(),
        notification,
        portal,
        tx_manager.clone(),
        clock.clone(),
    );
    let approval = FurnishApprovalService::new(
        application_repo.clone(),
        persistence(),
        tx_manager.clone(),
        clock.clone(),
    );
    let furnish_state = Arc::new(FurnishState {
        submission,
        rejection,
        approval,
    });

    // ダッシュボード
    let dashboard = FurnishDashboardService::new(
        application_repo.clone(),
        notice_repo.clone(),
        document_repo.clone(),
        clock.clone(),
    );
    let dashboard_state = Arc::new(DashboardState { dashboard });

    // ルーター構築
    let app = Router::new()
        .route("/health", get(health_check))
        // 申告 API
        .route("/internal/furnish/submissions", post(submit_furnish))
        .route(
            "/internal/furnish/applications/{txn_no}/reject",
            post(reject_furnish),
        )
        .route(
            "/internal/furnish/applications/{txn_no}/approve",
            post(approve_furnish),
        )
        .with_state(furnish_state)
        // ダッシュボード API
        .route(
            "/internal/furnish/applications",
            get(list_furnish_applications),
        )
        .route(
            "/internal/furnish/applications/{txn_no}",
            get(get_application_detail),
        )
        .with_state(dashboard_state)
        .layer(TraceLayer::new_for_http());

    // サーバー起動
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("アドレスのパースに失敗しました");

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Furnish Service サーバーが起動しました: {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
