use std::sync::Arc;
use tracing::info;
use validator::Validate;

use kiosk_core::{MediaKind, Post, PostDraft, PostPatch};

use crate::clients::{ContentStore, MediaFile, MediaUploader};
use crate::error::Result;

/// Post management for the admin dashboard.
///
/// Inputs are validated before any store call. Writes are not re-read into a
/// local cache: the kiosk picks changes up on its next refresh.
#[derive(Clone)]
pub struct ContentService {
    store: Arc<dyn ContentStore>,
    uploader: Arc<dyn MediaUploader>,
}

impl ContentService {
    pub fn new(store: Arc<dyn ContentStore>, uploader: Arc<dyn MediaUploader>) -> Self {
        Self { store, uploader }
    }

    pub async fn list_posts(&self) -> Result<Vec<Post>> {
        Ok(self.store.list_posts().await?)
    }

    pub async fn get_post(&self, id: &str) -> Result<Post> {
        Ok(self.store.get_post(id).await?)
    }

    pub async fn create_post(&self, draft: PostDraft) -> Result<Post> {
        draft.validate()?;
        let post = self.store.create_post(&draft).await?;
        info!(post_id = %post.id, kind = draft.media_kind.as_str(), "Created post");
        Ok(post)
    }

    pub async fn update_post(&self, id: &str, patch: PostPatch) -> Result<Post> {
        patch.validate()?;
        let post = self.store.update_post(id, &patch).await?;
        info!(post_id = %id, "Updated post");
        Ok(post)
    }

    pub async fn delete_post(&self, id: &str) -> Result<()> {
        self.store.delete_post(id).await?;
        info!(post_id = %id, "Deleted post");
        Ok(())
    }

    pub async fn upload(&self, file: MediaFile) -> Result<String> {
        Ok(self.uploader.upload(file).await?)
    }

    /// Upload a file and point the post at it. The post is only touched once
    /// the upload has produced a URL.
    pub async fn attach_media(
        &self,
        id: &str,
        kind: Option<MediaKind>,
        file: MediaFile,
    ) -> Result<Post> {
        // Fail fast on unknown posts before spending an upload
        self.store.get_post(id).await?;

        let url = self.uploader.upload(file).await?;
        let patch = PostPatch {
            media_kind: kind,
            media_url: Some(url),
            ..Default::default()
        };
        self.update_post(id, patch).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{MockContentStore, StoreError, UploadError};
    use crate::error::AppError;
    use async_trait::async_trait;
    use bytes::Bytes;
    use chrono::Utc;
    use kiosk_core::Media;

    struct FixedUploader(std::result::Result<String, ()>);

    #[async_trait]
    impl MediaUploader for FixedUploader {
        async fn upload(&self, _file: MediaFile) -> std::result::Result<String, UploadError> {
            self.0
                .clone()
                .map_err(|_| UploadError::Network("connection reset".to_string()))
        }
    }

    fn service(store: MockContentStore, upload: std::result::Result<String, ()>) -> ContentService {
        ContentService::new(Arc::new(store), Arc::new(FixedUploader(upload)))
    }

    fn post(id: &str) -> Post {
        Post {
            id: id.to_string(),
            title: "Market day".to_string(),
            text: "Saturday from 9".to_string(),
            media: Media::new(MediaKind::Image, "https://cdn/old.jpg", ""),
            created_at: Utc::now(),
        }
    }

    fn file() -> MediaFile {
        MediaFile {
            file_name: "poster.jpg".to_string(),
            content_type: Some("image/jpeg".to_string()),
            bytes: Bytes::from_static(b"jpeg"),
        }
    }

    #[tokio::test]
    async fn test_create_rejects_empty_title_without_store_call() {
        let mut store = MockContentStore::new();
        store.expect_create_post().never();

        let draft = PostDraft {
            title: String::new(),
            text: "body".to_string(),
            media_kind: MediaKind::Image,
            media_url: String::new(),
            media_caption: String::new(),
        };
        let err = service(store, Ok(String::new()))
            .create_post(draft)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_passes_patch_through() {
        let mut store = MockContentStore::new();
        store
            .expect_update_post()
            .withf(|id, patch| id == "p1" && patch.title.as_deref() == Some("New"))
            .times(1)
            .returning(|id, patch| Ok(post(id).apply(patch)));

        let patch = PostPatch {
            title: Some("New".to_string()),
            ..Default::default()
        };
        let updated = service(store, Ok(String::new()))
            .update_post("p1", patch)
            .await
            .unwrap();
        assert_eq!(updated.title, "New");
    }

    #[tokio::test]
    async fn test_missing_post_maps_to_not_found() {
        let mut store = MockContentStore::new();
        store
            .expect_get_post()
            .returning(|id| Err(StoreError::NotFound(format!("Post {id}"))));

        let err = service(store, Ok(String::new()))
            .get_post("gone")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_attach_media_updates_after_upload() {
        let mut store = MockContentStore::new();
        store.expect_get_post().returning(|id| Ok(post(id)));
        store
            .expect_update_post()
            .withf(|_, patch| {
                patch.media_url.as_deref() == Some("https://cdn/new.pdf")
                    && patch.media_kind == Some(MediaKind::Pdf)
            })
            .times(1)
            .returning(|id, patch| Ok(post(id).apply(patch)));

        let updated = service(store, Ok("https://cdn/new.pdf".to_string()))
            .attach_media("p1", Some(MediaKind::Pdf), file())
            .await
            .unwrap();
        assert_eq!(updated.media.url(), Some("https://cdn/new.pdf"));
    }

    #[tokio::test]
    async fn test_failed_upload_leaves_post_untouched() {
        let mut store = MockContentStore::new();
        store.expect_get_post().returning(|id| Ok(post(id)));
        store.expect_update_post().never();

        let err = service(store, Err(()))
            .attach_media("p1", None, file())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Upload(_)));
    }
}
