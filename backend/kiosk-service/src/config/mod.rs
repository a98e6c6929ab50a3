use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use kiosk_core::GateConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub media: MediaConfig,
    pub weather: WeatherConfig,
    pub news: NewsConfig,
    pub kiosk: KioskConfig,
    pub admin: AdminConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Backend-as-a-service holding posts and settings
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub server_url: String,
    pub app_id: String,
    pub rest_api_key: String,
    #[serde(default = "default_request_timeout_secs")]
    pub timeout_secs: u64,
}

/// Media CDN upload endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    pub api_base: String,
    pub cloud_name: String,
    pub upload_preset: String,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    #[serde(default = "default_upload_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherConfig {
    pub api_base: String,
    pub api_key: String,
    pub city: String,
    pub country: String,
    pub refresh_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewsConfig {
    pub bridge_url: String,
    pub feed_url: String,
    pub refresh_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KioskConfig {
    pub title: String,
    pub posts_refresh_secs: u64,
    pub default_rotation_ms: u64,
    pub fade_ms: u64,
    pub settings_cache_path: PathBuf,
    pub welcome_post: bool,
    pub gate: GateSettings,
}

/// Five-tap gesture tuning
#[derive(Debug, Clone, Deserialize)]
pub struct GateSettings {
    pub corner_px: f64,
    pub tap_window_ms: u64,
    pub reveal_ms: u64,
    pub required_taps: u32,
}

impl From<&GateSettings> for GateConfig {
    fn from(settings: &GateSettings) -> Self {
        GateConfig {
            corner_size: settings.corner_px,
            window: Duration::from_millis(settings.tap_window_ms),
            reveal_for: Duration::from_millis(settings.reveal_ms),
            required_taps: settings.required_taps,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    pub username: String,
    pub password: String,
    /// Idle time after which a dashboard session ends
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
}

const DEV_ADMIN_PASSWORD: &str = "development-password-change-in-production";

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_upload_timeout_secs() -> u64 {
    120
}

fn default_session_ttl_secs() -> u64 {
    8 * 60 * 60
}

fn default_max_upload_bytes() -> usize {
    50 * 1024 * 1024
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::Environment::default().separator("__"))
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("store.server_url", "https://parseapi.back4app.com")?
            .set_default("store.app_id", "")?
            .set_default("store.rest_api_key", "")?
            .set_default("store.timeout_secs", 15)?
            .set_default("media.api_base", "https://api.cloudinary.com")?
            .set_default("media.cloud_name", "")?
            .set_default("media.upload_preset", "")?
            .set_default("media.max_upload_bytes", 50 * 1024 * 1024)?
            .set_default("media.timeout_secs", 120)?
            .set_default("weather.api_base", "https://api.openweathermap.org")?
            .set_default("weather.api_key", "")?
            .set_default("weather.city", "Alkmaar")?
            .set_default("weather.country", "nl")?
            .set_default("weather.refresh_secs", 3600)?
            .set_default("news.bridge_url", "https://api.rss2json.com/v1/api.json")?
            .set_default("news.feed_url", "https://feeds.nos.nl/nosnieuwsalgemeen")?
            .set_default("news.refresh_secs", 1800)?
            .set_default("kiosk.title", "RAPENBURG PLAZA NEWS")?
            .set_default("kiosk.posts_refresh_secs", 300)?
            .set_default("kiosk.default_rotation_ms", 30_000)?
            .set_default("kiosk.fade_ms", 1000)?
            .set_default("kiosk.settings_cache_path", "./data/kiosk-settings.json")?
            .set_default("kiosk.welcome_post", true)?
            .set_default("kiosk.gate.corner_px", 100.0)?
            .set_default("kiosk.gate.tap_window_ms", 3000)?
            .set_default("kiosk.gate.reveal_ms", 5000)?
            .set_default("kiosk.gate.required_taps", 5)?
            .set_default("admin.username", "admin")?
            .set_default("admin.password", DEV_ADMIN_PASSWORD)?
            .set_default("admin.session_ttl_secs", 8 * 60 * 60)?
            .build()?;

        let config: Config = config.try_deserialize()?;

        if config.admin.password == DEV_ADMIN_PASSWORD {
            tracing::warn!("Admin password is the development default, set ADMIN__PASSWORD");
        }

        Ok(config)
    }
}
