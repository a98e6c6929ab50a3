//! Kiosk snapshot served to displays.

use serde::Serialize;

use crate::models::{Media, Post, WeatherStatus};

/// Media URL shown when a post has none
pub const PLACEHOLDER_MEDIA_URL: &str = "/api/placeholder/800/600";

/// Fragment that hides the browser PDF viewer chrome
const PDF_VIEWER_FRAGMENT: &str = "#toolbar=0&navpanes=0";

pub const MEDIA_UNAVAILABLE: &str = "Media not available";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MediaView {
    Image { src: String, alt: String },
    Video { src: String },
    Pdf { src: String, title: String },
    Unavailable { message: String },
}

impl MediaView {
    pub fn render(media: &Media) -> Self {
        match media {
            Media::Image { url, caption } => MediaView::Image {
                src: or_placeholder(url),
                alt: caption.clone(),
            },
            Media::Video { url, .. } => MediaView::Video {
                src: or_placeholder(url),
            },
            Media::Pdf { url, caption } => MediaView::Pdf {
                src: format!("{}{}", or_placeholder(url), PDF_VIEWER_FRAGMENT),
                title: caption.clone(),
            },
            Media::Unsupported { .. } => MediaView::Unavailable {
                message: MEDIA_UNAVAILABLE.to_string(),
            },
        }
    }
}

fn or_placeholder(url: &str) -> String {
    if url.is_empty() {
        PLACEHOLDER_MEDIA_URL.to_string()
    } else {
        url.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostView {
    pub title: String,
    pub text: String,
    pub media: MediaView,
    pub caption: String,
}

impl PostView {
    pub fn from_post(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            text: post.text.clone(),
            media: MediaView::render(&post.media),
            caption: post.media.caption().to_string(),
        }
    }

    /// Stand-in shown when there is nothing to rotate
    pub fn no_content() -> Self {
        Self {
            title: "No Content Available".to_string(),
            text: "Stay tuned.".to_string(),
            media: MediaView::Image {
                src: PLACEHOLDER_MEDIA_URL.to_string(),
                alt: "No content available".to_string(),
            },
            caption: "No content available".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeatherView {
    pub temp: String,
    pub condition: String,
    pub city: String,
}

impl WeatherView {
    pub fn render(status: &WeatherStatus, city: &str) -> Self {
        let (temp, condition) = match status {
            WeatherStatus::Loading => ("Loading...".to_string(), "Loading...".to_string()),
            WeatherStatus::Ready {
                temp_celsius,
                condition,
            } => (format!("{temp_celsius}°C"), condition.clone()),
            WeatherStatus::Unavailable => ("N/A".to_string(), "Unavailable".to_string()),
        };
        Self {
            temp,
            condition,
            city: city.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KioskSnapshot {
    pub header: String,
    pub post: PostView,
    pub post_visible: bool,
    pub post_index: usize,
    pub post_count: usize,
    pub remaining_seconds: u64,
    pub paused: bool,
    pub rotation_interval_ms: u64,
    pub weather: WeatherView,
    pub headlines: Vec<String>,
    pub admin_control_visible: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaKind;

    #[test]
    fn test_render_every_media_kind() {
        let image = Media::new(MediaKind::Image, "", "Plaza");
        assert_eq!(
            MediaView::render(&image),
            MediaView::Image {
                src: PLACEHOLDER_MEDIA_URL.to_string(),
                alt: "Plaza".to_string()
            }
        );

        let pdf = Media::new(MediaKind::Pdf, "https://cdn/menu.pdf", "Menu");
        assert_eq!(
            MediaView::render(&pdf),
            MediaView::Pdf {
                src: "https://cdn/menu.pdf#toolbar=0&navpanes=0".to_string(),
                title: "Menu".to_string()
            }
        );

        let video = Media::new(MediaKind::Video, "https://cdn/v.mp4", "");
        assert_eq!(
            MediaView::render(&video),
            MediaView::Video {
                src: "https://cdn/v.mp4".to_string()
            }
        );

        let unknown = Media::Unsupported {
            caption: String::new(),
        };
        assert_eq!(
            MediaView::render(&unknown),
            MediaView::Unavailable {
                message: MEDIA_UNAVAILABLE.to_string()
            }
        );
    }

    #[test]
    fn test_weather_view() {
        let view = WeatherView::render(&WeatherStatus::Unavailable, "Alkmaar");
        assert_eq!(view.temp, "N/A");
        assert_eq!(view.condition, "Unavailable");

        let ready = WeatherStatus::Ready {
            temp_celsius: -3,
            condition: "light snow".to_string(),
        };
        assert_eq!(WeatherView::render(&ready, "Alkmaar").temp, "-3°C");
    }

    #[test]
    fn test_media_view_serializes_tagged() {
        let view = MediaView::Video {
            src: "v.mp4".to_string(),
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["kind"], "video");
        assert_eq!(json["src"], "v.mp4");
    }
}
