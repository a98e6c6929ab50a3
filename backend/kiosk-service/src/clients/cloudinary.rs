/// Unsigned media upload to a Cloudinary-style CDN
///
/// POSTs the file as multipart form data with an upload preset and returns the
/// `secure_url` of the stored asset.
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{error, info};

use super::{MediaFile, MediaUploader, UploadError};
use crate::config::MediaConfig;

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
}

#[derive(Clone)]
pub struct CloudinaryClient {
    client: Client,
    upload_url: String,
    upload_preset: String,
}

impl CloudinaryClient {
    pub fn new(config: &MediaConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            upload_url: format!(
                "{}/v1_1/{}/upload",
                config.api_base.trim_end_matches('/'),
                config.cloud_name
            ),
            upload_preset: config.upload_preset.clone(),
        })
    }

    fn form(&self, file: MediaFile) -> Result<Form, UploadError> {
        let size = file.bytes.len();
        let mut part = Part::bytes(file.bytes.to_vec()).file_name(file.file_name);
        if let Some(content_type) = file.content_type.as_deref() {
            part = part
                .mime_str(content_type)
                .map_err(|_| UploadError::InvalidFile(format!("Bad content type: {content_type}")))?;
        }
        tracing::debug!(size, "Prepared upload form");

        Ok(Form::new()
            .part("file", part)
            .text("upload_preset", self.upload_preset.clone()))
    }
}

#[async_trait]
impl MediaUploader for CloudinaryClient {
    async fn upload(&self, file: MediaFile) -> Result<String, UploadError> {
        if file.bytes.is_empty() {
            return Err(UploadError::InvalidFile("File is empty".to_string()));
        }
        let file_name = file.file_name.clone();

        let response = self
            .client
            .post(&self.upload_url)
            .multipart(self.form(file)?)
            .send()
            .await
            .map_err(|e| {
                error!(file = %file_name, error = %e, "Failed to send upload request");
                UploadError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(file = %file_name, status = %status, "Upload rejected");
            return Err(UploadError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: UploadResponse = response
            .json()
            .await
            .map_err(|e| UploadError::Network(format!("Invalid upload response: {e}")))?;

        let url = parsed
            .secure_url
            .filter(|url| !url.is_empty())
            .ok_or(UploadError::MissingUrl)?;

        info!(file = %file_name, url = %url, "Uploaded media");
        Ok(url)
    }
}
