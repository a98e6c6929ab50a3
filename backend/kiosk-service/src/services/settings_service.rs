use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use kiosk_core::models::ROTATION_SETTING_NAME;
use kiosk_core::RotationSetting;

use crate::clients::ContentStore;
use crate::error::{AppError, Result};

/// Device-local copy of display settings, kept as a flat JSON object of
/// string values.
#[derive(Debug, Clone)]
pub struct LocalSettingsCache {
    path: PathBuf,
}

impl LocalSettingsCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn load(&self) -> HashMap<String, String> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(path = %self.path.display(), error = %e, "Ignoring corrupt settings cache");
                HashMap::new()
            }),
            Err(_) => HashMap::new(),
        }
    }

    pub async fn get(&self, name: &str) -> Option<String> {
        self.load().await.remove(name)
    }

    pub async fn set(&self, name: &str, value: &str) -> anyhow::Result<()> {
        let mut values = self.load().await;
        values.insert(name.to_string(), value.to_string());

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, serde_json::to_vec_pretty(&values)?).await?;
        Ok(())
    }
}

/// Rotation interval lookup and persistence.
///
/// Reads prefer the local cache, then the store, then the default. A value
/// read from the store is not copied into the local cache. Writes go to the
/// local cache first; the store write decides success.
#[derive(Clone)]
pub struct SettingsService {
    store: Arc<dyn ContentStore>,
    cache: LocalSettingsCache,
    default: RotationSetting,
}

impl SettingsService {
    pub fn new(store: Arc<dyn ContentStore>, cache: LocalSettingsCache, default_ms: u64) -> Self {
        let default = RotationSetting::parse(&default_ms.to_string()).unwrap_or_default();
        Self {
            store,
            cache,
            default,
        }
    }

    /// Interval for display, falling back to the default when the store
    /// cannot be read.
    pub async fn rotation_interval(&self) -> RotationSetting {
        self.load_rotation_interval().await.unwrap_or(self.default)
    }

    /// Current interval, or `None` when it could not be determined because
    /// the store failed. An absent or invalid stored value gives the default.
    pub async fn load_rotation_interval(&self) -> Option<RotationSetting> {
        if let Some(setting) = self
            .cache
            .get(ROTATION_SETTING_NAME)
            .await
            .and_then(|raw| RotationSetting::parse(&raw))
        {
            debug!(interval_ms = setting.interval_ms, "Rotation interval from local cache");
            return Some(setting);
        }

        match self.store.get_setting(ROTATION_SETTING_NAME).await {
            Ok(Some(raw)) => match RotationSetting::parse(&raw) {
                Some(setting) => Some(setting),
                None => {
                    warn!(value = %raw, "Stored rotation interval is invalid, using default");
                    Some(self.default)
                }
            },
            Ok(None) => Some(self.default),
            Err(e) => {
                warn!(error = %e, "Failed to read rotation interval");
                None
            }
        }
    }

    pub async fn save_rotation_seconds(&self, seconds: u64) -> Result<RotationSetting> {
        let setting = RotationSetting::from_seconds(seconds)
            .map_err(|e| AppError::Validation(e.to_string()))?;
        let value = setting.to_stored();

        if let Err(e) = self.cache.set(ROTATION_SETTING_NAME, &value).await {
            warn!(error = %e, "Failed to write local settings cache");
        }
        self.store.set_setting(ROTATION_SETTING_NAME, &value).await?;

        info!(interval_ms = setting.interval_ms, "Saved rotation interval");
        Ok(setting)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{MockContentStore, StoreError};
    use tempfile::TempDir;

    fn cache(dir: &TempDir) -> LocalSettingsCache {
        LocalSettingsCache::new(dir.path().join("nested").join("settings.json"))
    }

    #[tokio::test]
    async fn test_local_cache_wins_over_store() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir);
        cache.set(ROTATION_SETTING_NAME, "45000").await.unwrap();

        let mut store = MockContentStore::new();
        store.expect_get_setting().never();

        let service = SettingsService::new(Arc::new(store), cache, 30_000);
        assert_eq!(service.rotation_interval().await.interval_ms, 45_000);
    }

    #[tokio::test]
    async fn test_store_value_is_not_cached_locally() {
        let dir = TempDir::new().unwrap();
        let mut store = MockContentStore::new();
        store
            .expect_get_setting()
            .times(2)
            .returning(|_| Ok(Some("20000".to_string())));

        let service = SettingsService::new(Arc::new(store), cache(&dir), 30_000);
        assert_eq!(service.rotation_interval().await.interval_ms, 20_000);
        assert_eq!(service.rotation_interval().await.interval_ms, 20_000);
        assert_eq!(cache(&dir).get(ROTATION_SETTING_NAME).await, None);
    }

    #[tokio::test]
    async fn test_falls_back_to_default() {
        let dir = TempDir::new().unwrap();
        let mut store = MockContentStore::new();
        store
            .expect_get_setting()
            .returning(|_| Err(StoreError::Network("offline".to_string())));

        let service = SettingsService::new(Arc::new(store), cache(&dir), 30_000);
        assert_eq!(service.load_rotation_interval().await, None);
        assert_eq!(service.rotation_interval().await.interval_ms, 30_000);
    }

    #[tokio::test]
    async fn test_corrupt_cache_is_ignored() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir);
        cache.set("other", "x").await.unwrap();
        tokio::fs::write(dir.path().join("nested").join("settings.json"), b"{not json")
            .await
            .unwrap();

        let mut store = MockContentStore::new();
        store.expect_get_setting().returning(|_| Ok(None));

        let service = SettingsService::new(Arc::new(store), cache, 30_000);
        assert_eq!(service.rotation_interval().await.interval_ms, 30_000);
    }

    #[tokio::test]
    async fn test_save_rejects_out_of_range() {
        let dir = TempDir::new().unwrap();
        let mut store = MockContentStore::new();
        store.expect_set_setting().never();

        let service = SettingsService::new(Arc::new(store), cache(&dir), 30_000);
        let err = service.save_rotation_seconds(121).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_save_writes_local_then_remote() {
        let dir = TempDir::new().unwrap();
        let mut store = MockContentStore::new();
        store
            .expect_set_setting()
            .withf(|name, value| name == ROTATION_SETTING_NAME && value == "60000")
            .times(1)
            .returning(|_, _| Err(StoreError::Network("offline".to_string())));

        let service = SettingsService::new(Arc::new(store), cache(&dir), 30_000);
        let err = service.save_rotation_seconds(60).await.unwrap_err();
        assert!(matches!(err, AppError::Network(_)));

        // The local copy is already updated even though the store failed
        let local = cache(&dir).get(ROTATION_SETTING_NAME).await;
        assert_eq!(local.as_deref(), Some("60000"));
    }
}
