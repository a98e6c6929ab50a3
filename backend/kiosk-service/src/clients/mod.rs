//! Clients for the hosted services the kiosk depends on.
//!
//! Each collaborator sits behind a trait so services, jobs and tests can swap
//! in fakes. The reqwest-backed implementations live in the submodules.

mod cloudinary;
mod news;
mod parse;
mod weather;

use async_trait::async_trait;
use bytes::Bytes;

use kiosk_core::{Post, PostDraft, PostPatch};

pub use cloudinary::CloudinaryClient;
pub use news::NewsClient;
pub use parse::ParseClient;
pub use weather::WeatherClient;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Store request failed: {0}")]
    Network(String),
}

/// Post and settings persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// All posts, newest first
    async fn list_posts(&self) -> Result<Vec<Post>, StoreError>;

    async fn get_post(&self, id: &str) -> Result<Post, StoreError>;

    /// Persist a new post; the store assigns id and creation time
    async fn create_post(&self, draft: &PostDraft) -> Result<Post, StoreError>;

    async fn update_post(&self, id: &str, patch: &PostPatch) -> Result<Post, StoreError>;

    async fn delete_post(&self, id: &str) -> Result<(), StoreError>;

    async fn get_setting(&self, name: &str) -> Result<Option<String>, StoreError>;

    /// Create the setting if absent, overwrite otherwise
    async fn set_setting(&self, name: &str, value: &str) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Invalid file: {0}")]
    InvalidFile(String),

    #[error("Upload request failed: {0}")]
    Network(String),

    #[error("Upload rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Upload response did not contain a URL")]
    MissingUrl,
}

/// A file received from the dashboard
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

#[async_trait]
pub trait MediaUploader: Send + Sync {
    /// Upload the file and return its durable URL
    async fn upload(&self, file: MediaFile) -> Result<String, UploadError>;
}

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("Feed request failed: {0}")]
    Network(String),

    #[error("Feed returned status {0}")]
    Status(u16),

    #[error("Feed response malformed: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    /// Rounded down to whole degrees
    pub temp_celsius: i32,
    pub condition: String,
}

#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn fetch_weather(&self, city: &str) -> Result<WeatherReport, FeedError>;
}

#[async_trait]
pub trait HeadlineSource: Send + Sync {
    /// Headline titles in feed order
    async fn fetch_headlines(&self, feed_url: &str) -> Result<Vec<String>, FeedError>;
}
