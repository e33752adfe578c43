//! Webhook transport - mỗi chunk là một attachment của một webhook message.
//!
//! Flow:
//! 1. POST multipart (`files[0]`) lên `<webhook>?wait=true`
//! 2. Server trả về message JSON, lấy `attachments[0].url`
//! 3. Download bằng GET trực tiếp attachment URL

use super::ChunkStore;
use crate::storage::{FsError, Result};
use reqwest::blocking::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;

/// Timeout cho mỗi request (chunk lớn nhất 8 MiB)
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Tên file của attachment (server không quan tâm nội dung)
const CHUNK_FILE_NAME: &str = "chunk.bin";

/// Message trả về sau khi POST với `wait=true`
#[derive(Debug, Deserialize)]
struct WebhookMessage {
    #[serde(default)]
    attachments: Vec<Attachment>,
}

/// Thông tin attachment trong message
#[derive(Debug, Deserialize)]
struct Attachment {
    url: String,
    size: u64,
}

/// Chunk backend dùng HTTP webhook
pub struct WebhookStore {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl WebhookStore {
    /// Tạo store mới cho webhook endpoint
    pub fn new(endpoint: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

/// Lấy locator từ message, kiểm tra server đã nhận đủ bytes
fn attachment_url(message: WebhookMessage, expected_size: usize) -> Result<String> {
    let attachment = message
        .attachments
        .into_iter()
        .next()
        .ok_or_else(|| FsError::Remote("webhook response has no attachment".to_string()))?;

    if attachment.size != expected_size as u64 {
        return Err(FsError::Remote(format!(
            "webhook stored {} bytes, expected {}",
            attachment.size, expected_size
        )));
    }

    Ok(attachment.url)
}

impl ChunkStore for WebhookStore {
    fn name(&self) -> &'static str {
        "webhook"
    }

    fn put(&self, data: &[u8]) -> Result<String> {
        let part = Part::bytes(data.to_vec()).file_name(CHUNK_FILE_NAME);
        let form = Form::new().part("files[0]", part);

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("wait", "true")])
            .multipart(form)
            .send()?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(FsError::Remote(format!(
                "webhook returned error {}: {}",
                status, body
            )));
        }

        let message: WebhookMessage = response.json()?;
        let url = attachment_url(message, data.len())?;
        tracing::debug!("Stored {} bytes at {}", data.len(), url);

        Ok(url)
    }

    fn get(&self, locator: &str) -> Result<Vec<u8>> {
        let response = self.client.get(locator).send()?;

        if !response.status().is_success() {
            return Err(FsError::Remote(format!(
                "chunk download failed with status {}",
                response.status()
            )));
        }

        Ok(response.bytes()?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_creation() -> Result<()> {
        let store = WebhookStore::new("https://example.com/api/webhooks/1/token")?;
        assert_eq!(store.name(), "webhook");
        Ok(())
    }

    #[test]
    fn test_attachment_url_parsing() -> Result<()> {
        let message: WebhookMessage = serde_json::from_str(
            r#"{"id": "1", "attachments": [{"url": "https://cdn.example.com/a/chunk.bin", "size": 4}]}"#,
        )?;

        let url = attachment_url(message, 4)?;
        assert_eq!(url, "https://cdn.example.com/a/chunk.bin");
        Ok(())
    }

    #[test]
    fn test_attachment_size_mismatch() -> Result<()> {
        let message: WebhookMessage =
            serde_json::from_str(r#"{"attachments": [{"url": "u", "size": 3}]}"#)?;
        assert!(attachment_url(message, 4).is_err());
        Ok(())
    }

    #[test]
    fn test_missing_attachment() -> Result<()> {
        let message: WebhookMessage = serde_json::from_str(r#"{"id": "1"}"#)?;
        assert!(matches!(attachment_url(message, 0), Err(FsError::Remote(_))));
        Ok(())
    }
}
