//! Image storage for message attachments.

use std::path::PathBuf;

use base64::{engine::general_purpose, Engine as _};
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use courier_config::MediaConfig;

use crate::types::{StoreError, StoreResult};

/// Writes inline image payloads to disk and hands back servable URLs.
///
/// Payloads that already point at a reachable URL pass through untouched.
#[derive(Clone)]
pub struct MediaStore {
    upload_dir: PathBuf,
    public_base_path: String,
}

impl MediaStore {
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            upload_dir: PathBuf::from(&config.upload_dir),
            public_base_path: config.public_base_path.trim_end_matches('/').to_string(),
        }
    }

    /// Directory uploads land in, for serving them back over HTTP
    pub fn upload_dir(&self) -> &PathBuf {
        &self.upload_dir
    }

    /// Path prefix stored references start with
    pub fn public_base_path(&self) -> &str {
        &self.public_base_path
    }

    /// Resolve an image payload into a stable reference
    pub async fn store(&self, payload: &str, owner_id: i64) -> StoreResult<String> {
        if payload.starts_with("http://") || payload.starts_with("https://") {
            return Ok(payload.to_string());
        }

        let (mime, data) = parse_data_uri(payload)
            .ok_or_else(|| StoreError::storage("Unsupported image payload"))?;

        let bytes = general_purpose::STANDARD
            .decode(data)
            .map_err(|e| StoreError::storage(format!("Invalid base64 image data: {}", e)))?;

        let filename = format!("{}.{}", Uuid::new_v4(), extension_for(mime));

        fs::create_dir_all(&self.upload_dir)
            .await
            .map_err(|e| StoreError::storage(format!("Failed to create upload dir: {}", e)))?;
        fs::write(self.upload_dir.join(&filename), &bytes)
            .await
            .map_err(|e| StoreError::storage(format!("Failed to write image: {}", e)))?;

        debug!(owner_id, %filename, size = bytes.len(), "stored image upload");
        Ok(format!("{}/{}", self.public_base_path, filename))
    }
}

/// Split a `data:<mime>;base64,<payload>` URI into mime and payload
fn parse_data_uri(payload: &str) -> Option<(&str, &str)> {
    let rest = payload.strip_prefix("data:")?;
    rest.split_once(";base64,")
}

fn extension_for(mime: &str) -> &str {
    match mime {
        "image/jpeg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "png",
    }
}
