//! Content store client for a Parse-compatible REST backend
//!
//! Posts live in the `Post` class, settings in the `Settings` class keyed by
//! `name` with the value stored as a string.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use kiosk_core::{Media, Post, PostDraft, PostPatch};

use super::{ContentStore, StoreError};
use crate::config::StoreConfig;

const POST_CLASS: &str = "classes/Post";
const SETTINGS_CLASS: &str = "classes/Settings";
/// Parse caps unqualified queries at 100 rows
const LIST_LIMIT: &str = "1000";

/// Path of a single post. Object ids are alphanumeric, so anything else
/// cannot name a post and is kept out of the URL.
fn post_path(id: &str) -> Result<String, StoreError> {
    if !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(format!("{POST_CLASS}/{id}"))
    } else {
        warn!(post_id = %id, "Rejected malformed post id");
        Err(StoreError::NotFound(format!("Post {id}")))
    }
}

#[derive(Debug, Deserialize)]
struct QueryResults<T> {
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostRecord {
    object_id: String,
    title: Option<String>,
    content: Option<String>,
    media_type: Option<String>,
    media_url: Option<String>,
    image_comment: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<PostRecord> for Post {
    fn from(record: PostRecord) -> Self {
        Post {
            id: record.object_id,
            title: record.title.unwrap_or_default(),
            text: record.content.unwrap_or_default(),
            media: Media::from_stored(
                record.media_type.as_deref(),
                record.media_url.unwrap_or_default(),
                record.image_comment.unwrap_or_default(),
            ),
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct PostBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    media_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    media_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_comment: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedRecord {
    object_id: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingRecord {
    object_id: String,
    #[serde(default)]
    value: Option<serde_json::Value>,
}

impl SettingRecord {
    fn value_string(&self) -> Option<String> {
        match &self.value {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(serde_json::Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize)]
struct SettingBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    value: &'a str,
}

/// Parse REST API client
#[derive(Clone)]
pub struct ParseClient {
    client: Client,
    server_url: String,
    app_id: String,
    rest_api_key: String,
}

impl ParseClient {
    pub fn new(config: &StoreConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            server_url: config.server_url.trim_end_matches('/').to_string(),
            app_id: config.app_id.clone(),
            rest_api_key: config.rest_api_key.clone(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/{}", self.server_url, path))
            .header("X-Parse-Application-Id", &self.app_id)
            .header("X-Parse-REST-API-Key", &self.rest_api_key)
    }

    /// Send a request and decode the JSON body. `what` names the target for
    /// NotFound errors.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> Result<T, StoreError> {
        let response = request.send().await.map_err(|e| {
            warn!(target_object = %what, error = %e, "Store request failed");
            StoreError::Network(e.to_string())
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(what.to_string()));
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            warn!(target_object = %what, status = %status, body = %body, "Store returned error");
            return Err(StoreError::Network(format!("status {status}: {body}")));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| StoreError::Network(format!("Invalid store response: {e}")))
    }

    async fn find_setting(&self, name: &str) -> Result<Option<SettingRecord>, StoreError> {
        let filter = serde_json::json!({ "name": name }).to_string();
        let request = self
            .request(Method::GET, SETTINGS_CLASS)
            .query(&[("where", filter.as_str()), ("limit", "1")]);

        let results: QueryResults<SettingRecord> = self.send(request, "Settings").await?;
        Ok(results.results.into_iter().next())
    }
}

#[async_trait]
impl ContentStore for ParseClient {
    async fn list_posts(&self) -> Result<Vec<Post>, StoreError> {
        let request = self
            .request(Method::GET, POST_CLASS)
            .query(&[("order", "-createdAt"), ("limit", LIST_LIMIT)]);

        let results: QueryResults<PostRecord> = self.send(request, "Posts").await?;
        debug!(count = results.results.len(), "Fetched posts");
        Ok(results.results.into_iter().map(Post::from).collect())
    }

    async fn get_post(&self, id: &str) -> Result<Post, StoreError> {
        let request = self.request(Method::GET, &post_path(id)?);
        let record: PostRecord = self.send(request, &format!("Post {id}")).await?;
        Ok(record.into())
    }

    async fn create_post(&self, draft: &PostDraft) -> Result<Post, StoreError> {
        let body = PostBody {
            title: Some(&draft.title),
            content: Some(&draft.text),
            media_type: Some(draft.media_kind.as_str()),
            media_url: Some(&draft.media_url),
            image_comment: Some(&draft.media_caption),
        };
        let request = self.request(Method::POST, POST_CLASS).json(&body);
        let created: CreatedRecord = self.send(request, "Post").await?;

        Ok(Post {
            id: created.object_id,
            title: draft.title.clone(),
            text: draft.text.clone(),
            media: Media::new(draft.media_kind, draft.media_url.clone(), draft.media_caption.clone()),
            created_at: created.created_at,
        })
    }

    async fn update_post(&self, id: &str, patch: &PostPatch) -> Result<Post, StoreError> {
        let path = post_path(id)?;
        if !patch.is_empty() {
            let body = PostBody {
                title: patch.title.as_deref(),
                content: patch.text.as_deref(),
                media_type: patch.media_kind.map(|kind| kind.as_str()),
                media_url: patch.media_url.as_deref(),
                image_comment: patch.media_caption.as_deref(),
            };
            let request = self
                .request(Method::PUT, &path)
                .json(&body);
            let _: serde_json::Value = self.send(request, &format!("Post {id}")).await?;
        }

        self.get_post(id).await
    }

    async fn delete_post(&self, id: &str) -> Result<(), StoreError> {
        let request = self.request(Method::DELETE, &post_path(id)?);
        let _: serde_json::Value = self.send(request, &format!("Post {id}")).await?;
        Ok(())
    }

    async fn get_setting(&self, name: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .find_setting(name)
            .await?
            .and_then(|record| record.value_string()))
    }

    async fn set_setting(&self, name: &str, value: &str) -> Result<(), StoreError> {
        let request = match self.find_setting(name).await? {
            Some(record) => self
                .request(Method::PUT, &format!("{SETTINGS_CLASS}/{}", record.object_id))
                .json(&SettingBody { name: None, value }),
            None => self
                .request(Method::POST, SETTINGS_CLASS)
                .json(&SettingBody {
                    name: Some(name),
                    value,
                }),
        };

        let _: serde_json::Value = self.send(request, &format!("Setting {name}")).await?;
        Ok(())
    }
}
