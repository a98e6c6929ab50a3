use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

/// Name of the settings record holding the rotation interval
pub const ROTATION_SETTING_NAME: &str = "rotationTime";

/// Rotation interval used when neither the local cache nor the store has one
pub const DEFAULT_ROTATION_MS: u64 = 30_000;

/// Bounds accepted from the dashboard, in seconds
pub const MIN_ROTATION_SECS: u64 = 5;
pub const MAX_ROTATION_SECS: u64 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[default]
    Image,
    Video,
    Pdf,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Pdf => "pdf",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "image" => Some(MediaKind::Image),
            "video" => Some(MediaKind::Video),
            "pdf" => Some(MediaKind::Pdf),
            _ => None,
        }
    }
}

/// Media attached to a post.
///
/// Records written by older dashboards may carry a kind this kiosk cannot
/// show; those land in `Unsupported` and keep only their caption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Media {
    Image { url: String, caption: String },
    Video { url: String, caption: String },
    Pdf { url: String, caption: String },
    Unsupported { caption: String },
}

impl Media {
    pub fn new(kind: MediaKind, url: impl Into<String>, caption: impl Into<String>) -> Self {
        let (url, caption) = (url.into(), caption.into());
        match kind {
            MediaKind::Image => Media::Image { url, caption },
            MediaKind::Video => Media::Video { url, caption },
            MediaKind::Pdf => Media::Pdf { url, caption },
        }
    }

    /// Build from the raw stored kind. A missing kind means image.
    pub fn from_stored(kind: Option<&str>, url: String, caption: String) -> Self {
        match kind.map(MediaKind::parse) {
            None => Media::new(MediaKind::Image, url, caption),
            Some(Some(kind)) => Media::new(kind, url, caption),
            Some(None) => Media::Unsupported { caption },
        }
    }

    pub fn kind(&self) -> Option<MediaKind> {
        match self {
            Media::Image { .. } => Some(MediaKind::Image),
            Media::Video { .. } => Some(MediaKind::Video),
            Media::Pdf { .. } => Some(MediaKind::Pdf),
            Media::Unsupported { .. } => None,
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            Media::Image { url, .. } | Media::Video { url, .. } | Media::Pdf { url, .. } => {
                Some(url)
            }
            Media::Unsupported { .. } => None,
        }
    }

    pub fn caption(&self) -> &str {
        match self {
            Media::Image { caption, .. }
            | Media::Video { caption, .. }
            | Media::Pdf { caption, .. }
            | Media::Unsupported { caption } => caption,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub text: String,
    pub media: Media,
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Built-in post shown until the store has content of its own
    pub fn welcome() -> Self {
        Self {
            id: "welcome".to_string(),
            title: "Stay tuned!".to_string(),
            text: "We'll publish new posts frequently with updates from our projects!".to_string(),
            media: Media::new(MediaKind::Image, "", ""),
            created_at: DateTime::<Utc>::default(),
        }
    }

    /// Apply a partial edit, leaving untouched fields as they are.
    pub fn apply(&self, patch: &PostPatch) -> Post {
        let kind = patch
            .media_kind
            .or_else(|| self.media.kind())
            .unwrap_or_default();
        let url = patch
            .media_url
            .clone()
            .unwrap_or_else(|| self.media.url().unwrap_or_default().to_string());
        let caption = patch
            .media_caption
            .clone()
            .unwrap_or_else(|| self.media.caption().to_string());

        let media = match (&self.media, patch.media_kind) {
            _ if !patch.touches_media() => self.media.clone(),
            // Unknown stored kinds stay unknown until a kind is chosen
            (Media::Unsupported { .. }, None) => Media::Unsupported { caption },
            _ => Media::new(kind, url, caption),
        };

        Post {
            id: self.id.clone(),
            title: patch.title.clone().unwrap_or_else(|| self.title.clone()),
            text: patch.text.clone().unwrap_or_else(|| self.text.clone()),
            media,
            created_at: self.created_at,
        }
    }
}

/// Fields of a post about to be created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct PostDraft {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Text is required"))]
    pub text: String,
    #[serde(default)]
    pub media_kind: MediaKind,
    #[serde(default)]
    pub media_url: String,
    #[serde(default)]
    pub media_caption: String,
}

/// Partial edit of an existing post; `None` leaves the field unchanged
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct PostPatch {
    #[validate(length(min = 1, message = "Title cannot be empty"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "Text cannot be empty"))]
    pub text: Option<String>,
    pub media_kind: Option<MediaKind>,
    pub media_url: Option<String>,
    pub media_caption: Option<String>,
}

impl PostPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.text.is_none() && !self.touches_media()
    }

    pub fn touches_media(&self) -> bool {
        self.media_kind.is_some() || self.media_url.is_some() || self.media_caption.is_some()
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SettingError {
    #[error("Rotation time must be between 5 and 120 seconds, got {0}")]
    OutOfRange(u64),
}

/// Rotation interval setting, stored as milliseconds in a string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationSetting {
    pub interval_ms: u64,
}

impl Default for RotationSetting {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_ROTATION_MS,
        }
    }
}

impl RotationSetting {
    /// Parse a stored value. Zero and garbage are treated as absent.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().parse::<u64>() {
            Ok(0) | Err(_) => None,
            Ok(interval_ms) => Some(Self { interval_ms }),
        }
    }

    pub fn from_seconds(seconds: u64) -> Result<Self, SettingError> {
        if !(MIN_ROTATION_SECS..=MAX_ROTATION_SECS).contains(&seconds) {
            return Err(SettingError::OutOfRange(seconds));
        }
        Ok(Self {
            interval_ms: seconds * 1000,
        })
    }

    pub fn seconds(&self) -> u64 {
        self.interval_ms / 1000
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn to_stored(&self) -> String {
        self.interval_ms.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub username: String,
    pub role: Role,
}

impl SessionUser {
    pub fn admin(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            role: Role::Admin,
        }
    }
}

/// Latest weather reading as far as the kiosk knows
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WeatherStatus {
    #[default]
    Loading,
    Ready {
        temp_celsius: i32,
        condition: String,
    },
    Unavailable,
}

pub const HEADLINES_LOADING: &str = "Loading the latest news...";
pub const HEADLINES_FAILED: &str = "Unable to load news feed. Please check your connection.";

/// News ticker contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Headlines(Vec<String>);

impl Default for Headlines {
    fn default() -> Self {
        Self(vec![HEADLINES_LOADING.to_string()])
    }
}

impl Headlines {
    /// Fold a fetch result in. An empty successful fetch keeps what is shown.
    pub fn update<E>(&mut self, fetched: Result<Vec<String>, E>) {
        match fetched {
            Ok(titles) if titles.is_empty() => {}
            Ok(titles) => self.0 = titles,
            Err(_) => self.0 = vec![HEADLINES_FAILED.to_string()],
        }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}
