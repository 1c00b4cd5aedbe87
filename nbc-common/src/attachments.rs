//! Photo and audio attachments
//!
//! Browsers submit attachments as base64 text (optionally as a `data:` URL).
//! Photos are stored as plain base64 with any `data:` prefix removed; audio is
//! pushed to object storage and only the resulting URL is kept. Attachments are held fully in memory.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::UploadConfig;
use crate::{Error, Result};

/// Decoded attachment payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub extension: String,
}

/// Strip an optional `data:<mime>;base64,` prefix
pub fn strip_data_url(data: &str) -> &str {
    let data = data.trim();
    match data.strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map(|(_, payload)| payload).unwrap_or(""),
        None => data,
    }
}

/// Decode base64 (or a base64 `data:` URL) and detect the file type
pub fn decode(data: &str) -> Result<Attachment> {
    let payload = strip_data_url(data);
    if payload.is_empty() {
        return Err(Error::InvalidInput("Empty attachment".to_string()));
    }

    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| Error::InvalidInput(format!("Attachment is not valid base64: {}", e)))?;

    let (mime_type, extension) = match infer::get(&bytes) {
        Some(kind) => (kind.mime_type().to_string(), kind.extension().to_string()),
        None => ("application/octet-stream".to_string(), "bin".to_string()),
    };

    Ok(Attachment {
        bytes,
        mime_type,
        extension,
    })
}

/// Object-storage client for audio clips
///
/// Uploads with `PUT <endpoint>/<uuid>.<ext>`; the object URL is the same path.
#[derive(Clone)]
pub struct Uploader {
    client: reqwest::Client,
    config: Option<UploadConfig>,
}

impl Uploader {
    pub fn new(config: Option<UploadConfig>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    /// Uploader with no endpoint; every upload reports `Upload` error
    pub fn disabled() -> Self {
        Self {
            client: reqwest::Client::new(),
            config: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.is_some()
    }

    /// Upload one attachment and return its URL
    pub async fn upload(&self, attachment: &Attachment) -> Result<String> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| Error::Upload("Attachment storage is not configured".to_string()))?;

        let url = format!(
            "{}/{}.{}",
            config.endpoint.trim_end_matches('/'),
            Uuid::new_v4(),
            attachment.extension
        );

        let mut request = self
            .client
            .put(&url)
            .header(reqwest::header::CONTENT_TYPE, attachment.mime_type.as_str())
            .body(attachment.bytes.clone());
        if let Some(token) = &config.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Upload(format!("Upload request failed: {}", e)))?;

        if !response.status().is_success() {
            warn!("Attachment upload rejected: {} {}", response.status(), url);
            return Err(Error::Upload(format!(
                "Storage responded with {}",
                response.status()
            )));
        }

        info!("Uploaded attachment ({} bytes) to {}", attachment.bytes.len(), url);
        Ok(url)
    }
}
