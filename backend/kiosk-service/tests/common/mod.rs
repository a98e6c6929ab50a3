#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use chrono::{Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

use kiosk_core::{GateConfig, Media, MediaKind, Post, PostDraft, PostPatch};
use kiosk_service::clients::{ContentStore, MediaFile, MediaUploader, StoreError, UploadError};
use kiosk_service::config::AdminConfig;
use kiosk_service::kiosk::{KioskHandle, KioskRuntime, KioskTasks, RefreshJob, RuntimeOptions};
use kiosk_service::services::{
    AuthService, ContentService, LocalSettingsCache, SessionStore, SettingsService,
};
use kiosk_service::{build_router, AppState};

pub const ADMIN_USER: &str = "admin";
pub const ADMIN_PASSWORD: &str = "correct-horse";

/// In-memory stand-in for the hosted store
#[derive(Default)]
pub struct MemoryStore {
    posts: Mutex<Vec<Post>>,
    settings: Mutex<HashMap<String, String>>,
    next_id: AtomicU32,
}

impl MemoryStore {
    pub fn with_posts(titles: &[&str]) -> Self {
        let store = Self::default();
        let base = Utc::now();
        {
            let mut posts = store.posts.lock().unwrap();
            for (i, title) in titles.iter().enumerate() {
                posts.push(Post {
                    id: format!("seed-{i}"),
                    title: title.to_string(),
                    text: format!("{title} body"),
                    media: Media::new(MediaKind::Image, "", ""),
                    // First title is the newest
                    created_at: base - ChronoDuration::minutes(i as i64),
                });
            }
        }
        store
    }

    pub fn post_count(&self) -> usize {
        self.posts.lock().unwrap().len()
    }

    pub fn setting(&self, name: &str) -> Option<String> {
        self.settings.lock().unwrap().get(name).cloned()
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn list_posts(&self) -> Result<Vec<Post>, StoreError> {
        let mut posts = self.posts.lock().unwrap().clone();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }

    async fn get_post(&self, id: &str) -> Result<Post, StoreError> {
        self.posts
            .lock()
            .unwrap()
            .iter()
            .find(|post| post.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("Post {id}")))
    }

    async fn create_post(&self, draft: &PostDraft) -> Result<Post, StoreError> {
        let id = format!("post-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let post = Post {
            id,
            title: draft.title.clone(),
            text: draft.text.clone(),
            media: Media::new(draft.media_kind, draft.media_url.clone(), draft.media_caption.clone()),
            created_at: Utc::now(),
        };
        self.posts.lock().unwrap().push(post.clone());
        Ok(post)
    }

    async fn update_post(&self, id: &str, patch: &PostPatch) -> Result<Post, StoreError> {
        let mut posts = self.posts.lock().unwrap();
        let post = posts
            .iter_mut()
            .find(|post| post.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("Post {id}")))?;
        *post = post.apply(patch);
        Ok(post.clone())
    }

    async fn delete_post(&self, id: &str) -> Result<(), StoreError> {
        let mut posts = self.posts.lock().unwrap();
        let before = posts.len();
        posts.retain(|post| post.id != id);
        if posts.len() == before {
            return Err(StoreError::NotFound(format!("Post {id}")));
        }
        Ok(())
    }

    async fn get_setting(&self, name: &str) -> Result<Option<String>, StoreError> {
        Ok(self.setting(name))
    }

    async fn set_setting(&self, name: &str, value: &str) -> Result<(), StoreError> {
        self.settings
            .lock()
            .unwrap()
            .insert(name.to_string(), value.to_string());
        Ok(())
    }
}

/// Uploader that hands back a CDN-like URL, or fails when told to
pub struct FakeUploader {
    pub fail: bool,
}

#[async_trait]
impl MediaUploader for FakeUploader {
    async fn upload(&self, file: MediaFile) -> Result<String, UploadError> {
        if self.fail {
            return Err(UploadError::Rejected {
                status: 500,
                body: "cdn unavailable".to_string(),
            });
        }
        Ok(format!("https://cdn.example/{}", file.file_name))
    }
}

pub fn runtime_options() -> RuntimeOptions {
    RuntimeOptions {
        title: "RAPENBURG PLAZA NEWS".to_string(),
        city: "Alkmaar".to_string(),
        interval: Duration::from_secs(30),
        fade: Duration::from_secs(1),
        gate: GateConfig::default(),
        welcome_post: true,
    }
}

pub fn start_kiosk(jobs: Vec<Arc<dyn RefreshJob>>) -> (KioskHandle, KioskTasks) {
    KioskRuntime::start(runtime_options(), jobs)
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub kiosk: KioskHandle,
    pub dir: TempDir,
    _tasks: KioskTasks,
}

pub fn test_app(store: MemoryStore, upload_fails: bool) -> TestApp {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(store);
    let content_store: Arc<dyn ContentStore> = store.clone();

    let settings = SettingsService::new(
        content_store.clone(),
        LocalSettingsCache::new(dir.path().join("settings.json")),
        30_000,
    );
    let (kiosk, tasks) = start_kiosk(Vec::new());

    let state = AppState {
        content: ContentService::new(
            content_store,
            Arc::new(FakeUploader { fail: upload_fails }),
        ),
        settings,
        auth: AuthService::new(&AdminConfig {
            username: ADMIN_USER.to_string(),
            password: ADMIN_PASSWORD.to_string(),
            session_ttl_secs: 3600,
        }),
        sessions: SessionStore::new(Duration::from_secs(3600)),
        kiosk: kiosk.clone(),
        max_upload_bytes: 1024 * 1024,
    };

    TestApp {
        router: build_router(state),
        store,
        kiosk,
        dir,
        _tasks: tasks,
    }
}
