/// Headlines from an RSS feed, read through an RSS-to-JSON bridge
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::{FeedError, HeadlineSource};
use crate::config::NewsConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct BridgeResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    items: Vec<FeedItem>,
}

#[derive(Debug, Deserialize)]
struct FeedItem {
    #[serde(default)]
    title: String,
}

impl BridgeResponse {
    fn into_titles(self) -> Result<Vec<String>, FeedError> {
        if self.status.as_deref() == Some("error") {
            return Err(FeedError::Malformed(
                self.message.unwrap_or_else(|| "bridge reported an error".to_string()),
            ));
        }

        Ok(self
            .items
            .into_iter()
            .map(|item| item.title.trim().to_string())
            .filter(|title| !title.is_empty())
            .collect())
    }
}

#[derive(Clone)]
pub struct NewsClient {
    client: Client,
    bridge_url: String,
}

impl NewsClient {
    pub fn new(config: &NewsConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            bridge_url: config.bridge_url.clone(),
        })
    }
}

#[async_trait]
impl HeadlineSource for NewsClient {
    async fn fetch_headlines(&self, feed_url: &str) -> Result<Vec<String>, FeedError> {
        let response = self
            .client
            .get(&self.bridge_url)
            .query(&[("rss_url", feed_url)])
            .send()
            .await
            .map_err(|e| FeedError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status.as_u16()));
        }

        response
            .json::<BridgeResponse>()
            .await
            .map_err(|e| FeedError::Malformed(e.to_string()))?
            .into_titles()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bridge_error_status() {
        let response: BridgeResponse = serde_json::from_value(serde_json::json!({
            "status": "error",
            "message": "rss_url parameter is required"
        }))
        .unwrap();

        assert!(matches!(response.into_titles(), Err(FeedError::Malformed(_))));
    }

    #[test]
    fn test_blank_titles_are_dropped() {
        let response: BridgeResponse = serde_json::from_value(serde_json::json!({
            "status": "ok",
            "items": [{ "title": " Storm warning " }, { "title": "" }, { "link": "x" }]
        }))
        .unwrap();

        assert_eq!(response.into_titles().unwrap(), vec!["Storm warning"]);
    }
}
