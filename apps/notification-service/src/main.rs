//! # Vybbi 通知サービス サーバー
//!
//! 通知の保存とメール配信、およびそれを起動するユーザー操作
//! （アフィリエイトリンク、イベント参加表明、代理人招待）を提供する。
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `NOTIFICATION_HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `NOTIFICATION_PORT` | **Yes** | ポート番号 |
//! | `DATABASE_URL` | **Yes** | PostgreSQL 接続 URL |
//! | `SITE_URL` | No | メール内リンクのベース URL |
//! | `EMAIL_BACKEND` | No | `resend` / `brevo` / `smtp` / `noop`（デフォルト: `noop`） |
//! | `EMAIL_FALLBACK_BACKEND` | No | 主バックエンド失敗時の副バックエンド |
//! | `AUTH_ADMIN_URL` | **Yes** | 認証プロバイダ管理 API の URL |
//! | `AUTH_SERVICE_ROLE_KEY` | **Yes** | 管理 API のサービスキー |
//!
//! ## 起動方法
//!
//! ```bash
//! NOTIFICATION_PORT=3003 DATABASE_URL=postgres://... cargo run -p vybbi-notification-service
//! ```

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use tokio::net::TcpListener;
use vybbi_domain::clock::{Clock, SystemClock};
use vybbi_infra::{
    db,
    directory::AuthAdminUserDirectory,
    repository::{
        PostgresEmailTemplateRepository,
        PostgresEventRsvpRepository,
        PostgresInfluencerLinkRepository,
        PostgresNotificationPreferenceRepository,
        PostgresNotificationRepository,
        PostgresRepresentationInvitationRepository,
    },
};
use vybbi_notification_service::{
    app::{self, AppStates},
    config::NotificationServiceConfig,
    handler::{
        EmailTemplateState,
        InfluencerLinkState,
        InvitationState,
        NotificationState,
        RsvpState,
    },
    transport::build_transport,
    usecase::{
        EmailTemplateUseCase,
        InfluencerLinkUseCase,
        InvitationUseCase,
        NotificationDispatcher,
        RsvpUseCase,
        TemplateResolver,
    },
};
use vybbi_shared::observability::{TracingConfig, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    init_tracing(TracingConfig::from_env("vybbi-notification-service"))
        .context("トレーシングの初期化に失敗しました")?;

    let config = NotificationServiceConfig::from_env().context("設定の読み込みに失敗しました")?;

    tracing::info!(
        "通知サービスを起動します: {}:{}",
        config.host,
        config.port
    );

    let pool_settings = db::PoolSettings {
        max_connections: config.db_max_connections,
        ..Default::default()
    };
    let pool = db::create_pool(&config.database_url, pool_settings)
        .await
        .context("データベース接続に失敗しました")?;
    db::run_migrations(&pool)
        .await
        .context("マイグレーションの実行に失敗しました")?;
    tracing::info!("データベースに接続しました");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let http = reqwest::Client::new();

    // テンプレートと配信
    let templates = Arc::new(PostgresEmailTemplateRepository::new(pool.clone()));
    let resolver = Arc::new(
        TemplateResolver::new(templates.clone(), &config.site_url)
            .context("メールレイアウトの読み込みに失敗しました")?,
    );
    let transport = build_transport(&config.email, http.clone())
        .context("メール送信バックエンドの構築に失敗しました")?;
    let directory = Arc::new(AuthAdminUserDirectory::new(
        http,
        &config.auth.base_url,
        &config.auth.service_role_key,
    ));
    let dispatcher = Arc::new(NotificationDispatcher::new(
        Arc::new(PostgresNotificationRepository::new(pool.clone())),
        Arc::new(PostgresNotificationPreferenceRepository::new(pool.clone())),
        directory,
        resolver.clone(),
        transport,
        clock.clone(),
    ));

    // トリガーポイント
    let influencer_link = InfluencerLinkUseCase::new(
        Arc::new(PostgresInfluencerLinkRepository::new(pool.clone())),
        clock.clone(),
    );
    let rsvp = RsvpUseCase::new(
        Arc::new(PostgresEventRsvpRepository::new(pool.clone())),
        clock.clone(),
    );
    let invitation = InvitationUseCase::new(
        Arc::new(PostgresRepresentationInvitationRepository::new(pool)),
        dispatcher.clone(),
        clock.clone(),
    );
    let email_template = EmailTemplateUseCase::new(templates, resolver, clock);

    let app = app::router(AppStates {
        notification:    Arc::new(NotificationState { dispatcher }),
        influencer_link: Arc::new(InfluencerLinkState {
            usecase: influencer_link,
        }),
        rsvp:            Arc::new(RsvpState { usecase: rsvp }),
        invitation:      Arc::new(InvitationState {
            usecase: invitation,
        }),
        email_template:  Arc::new(EmailTemplateState {
            usecase: email_template,
        }),
    });

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("バインドアドレスが不正です")?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("{addr} にバインドできませんでした"))?;
    tracing::info!("通知サービスが起動しました: {}", addr);

    axum::serve(listener, app).await.context("サーバーが異常終了しました")?;

    Ok(())
}
