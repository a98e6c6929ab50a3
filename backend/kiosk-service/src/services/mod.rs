mod auth_service;
mod content_service;
mod settings_service;

pub use auth_service::{AuthService, SessionStore};
pub use content_service::ContentService;
pub use settings_service::{LocalSettingsCache, SettingsService};
