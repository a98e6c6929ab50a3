use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use kiosk_core::GateConfig;
use kiosk_service::clients::{
    CloudinaryClient, ContentStore, MediaUploader, NewsClient, ParseClient, WeatherClient,
};
use kiosk_service::config::Config;
use kiosk_service::kiosk::{KioskRuntime, NewsJob, PostsJob, RefreshJob, RuntimeOptions, WeatherJob};
use kiosk_service::services::{
    AuthService, ContentService, LocalSettingsCache, SessionStore, SettingsService,
};
use kiosk_service::{build_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::load()?;
    tracing::info!("Configuration loaded successfully");

    let store: Arc<dyn ContentStore> = Arc::new(ParseClient::new(&config.store)?);
    let uploader: Arc<dyn MediaUploader> = Arc::new(CloudinaryClient::new(&config.media)?);
    let weather = Arc::new(WeatherClient::new(&config.weather)?);
    let news = Arc::new(NewsClient::new(&config.news)?);

    let settings = SettingsService::new(
        store.clone(),
        LocalSettingsCache::new(config.kiosk.settings_cache_path.clone()),
        config.kiosk.default_rotation_ms,
    );
    let initial = settings.rotation_interval().await;
    tracing::info!(interval_ms = initial.interval_ms, "Rotation interval resolved");

    let options = RuntimeOptions {
        title: config.kiosk.title.clone(),
        city: config.weather.city.clone(),
        interval: initial.interval(),
        fade: Duration::from_millis(config.kiosk.fade_ms),
        gate: GateConfig::from(&config.kiosk.gate),
        welcome_post: config.kiosk.welcome_post,
    };
    let jobs: Vec<Arc<dyn RefreshJob>> = vec![
        Arc::new(PostsJob::new(
            store.clone(),
            settings.clone(),
            Duration::from_secs(config.kiosk.posts_refresh_secs),
        )),
        Arc::new(WeatherJob::new(
            weather,
            config.weather.city.clone(),
            Duration::from_secs(config.weather.refresh_secs),
        )),
        Arc::new(NewsJob::new(
            news,
            config.news.feed_url.clone(),
            Duration::from_secs(config.news.refresh_secs),
        )),
    ];
    let (kiosk, tasks) = KioskRuntime::start(options, jobs);

    let state = AppState {
        content: ContentService::new(store, uploader),
        settings,
        auth: AuthService::new(&config.admin),
        sessions: SessionStore::new(Duration::from_secs(config.admin.session_ttl_secs)),
        kiosk,
        max_upload_bytes: config.media.max_upload_bytes,
    };
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tasks.shutdown().await;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "kiosk_service=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    if std::env::var("LOG_FORMAT").is_ok_and(|format| format == "json") {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
