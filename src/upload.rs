//! Asset upload.
//!
//! The rewritten stylesheet is re-hosted next to the journal so the HTML can
//! reference it with a plain `<link>`. Where it goes is up to the host:
//!
//! - [`HttpUploader`] posts a multipart form to a Foundry-style `/upload`
//!   endpoint (`source=data`, `target=<dir>`, `upload=<file>`).
//! - [`DirectoryUploader`] writes the file below a local root, which is what
//!   the CLI uses when no endpoint is configured.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("upload endpoint {url} returned status {status}")]
    Status { url: String, status: u16 },
    #[error("invalid upload target: {0}")]
    InvalidTarget(String),
}

/// Outcome of a successful upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadResult {
    /// Where the asset now lives, as reported by the uploader
    pub path: String,
    pub message: Option<String>,
}

/// Stores a named blob under a target directory.
#[async_trait]
pub trait AssetUploader: Send + Sync {
    async fn upload(
        &self,
        file_name: &str,
        target: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadResult, UploadError>;
}

/// Multipart upload to an HTTP endpoint.
pub struct HttpUploader {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpUploader {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl AssetUploader for HttpUploader {
    async fn upload(
        &self,
        file_name: &str,
        target: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadResult, UploadError> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("text/css")?;
        let form = reqwest::multipart::Form::new()
            .text("source", "data")
            .text("target", target.to_string())
            .part("upload", part);

        let response = self.client.post(&self.endpoint).multipart(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::Status {
                url: self.endpoint.clone(),
                status: status.as_u16(),
            });
        }

        // Foundry answers with {"status": "success", "message": "...", "path": "..."}
        let body: serde_json::Value = response.json().await.unwrap_or_default();
        let path = body
            .get("path")
            .and_then(|p| p.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}/{}", target.trim_matches('/'), file_name));
        let message = body
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string);

        tracing::debug!(endpoint = %self.endpoint, path = %path, "asset uploaded");
        Ok(UploadResult { path, message })
    }
}

/// Writes assets to `{root}/{target}/{file_name}`.
pub struct DirectoryUploader {
    root: PathBuf,
}

impl DirectoryUploader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn destination(&self, file_name: &str, target: &str) -> Result<PathBuf, UploadError> {
        let mut dir = self.root.clone();
        for segment in target.split('/').filter(|s| !s.is_empty()) {
            if segment == ".." || segment == "." {
                return Err(UploadError::InvalidTarget(target.to_string()));
            }
            dir.push(segment);
        }
        if file_name.is_empty() || file_name.contains(['/', '\\']) {
            return Err(UploadError::InvalidTarget(file_name.to_string()));
        }
        Ok(dir.join(file_name))
    }
}

#[async_trait]
impl AssetUploader for DirectoryUploader {
    async fn upload(
        &self,
        file_name: &str,
        target: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadResult, UploadError> {
        let destination = self.destination(file_name, target)?;
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&destination, bytes).await?;

        tracing::debug!(path = %destination.display(), "asset written");
        Ok(UploadResult {
            path: destination.display().to_string(),
            message: None,
        })
    }
}
