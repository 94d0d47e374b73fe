//! # Image Storage
//!
//! Tenant document photos (ID card, vehicle registration, contract). The
//! database keeps only the returned key; bytes live in the store.

use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::simulation::Simulator;
use nhatro_core::validation::validate_document_upload;

#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredImage {
    pub key: String,
    pub url: String,
}

/// Checks type and size before anything is sent to the store.
pub fn validate_upload(upload: &ImageUpload) -> GatewayResult<()> {
    validate_document_upload(&upload.content_type, upload.bytes.len() as i64)
        .map_err(|e| GatewayError::InvalidUpload(format!("{}: {}", upload.file_name, e)))
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Stores the image under `prefix` and returns its key and public URL.
    async fn put(&self, prefix: &str, upload: &ImageUpload) -> GatewayResult<StoredImage>;

    async fn delete(&self, key: &str) -> GatewayResult<()>;

    fn url_for(&self, key: &str) -> String;
}

// =============================================================================
// Simulated Store
// =============================================================================

#[derive(Debug)]
pub struct SimulatedImageStore {
    sim: Simulator,
    base_url: String,
    objects: Mutex<HashMap<String, usize>>,
}

impl SimulatedImageStore {
    pub fn new(config: &GatewayConfig, seed: Option<u64>) -> Self {
        SimulatedImageStore {
            sim: Simulator::new("image-store", config, seed),
            base_url: "https://storage.nhatro.local".to_string(),
            objects: Mutex::new(HashMap::new()),
        }
    }

    pub fn simulator(&self) -> &Simulator {
        &self.sim
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects
            .lock()
            .map(|o| o.contains_key(key))
            .unwrap_or(false)
    }
}

#[async_trait]
impl ImageStore for SimulatedImageStore {
    async fn put(&self, prefix: &str, upload: &ImageUpload) -> GatewayResult<StoredImage> {
        validate_upload(upload)?;
        self.sim.round_trip().await?;

        let extension = upload
            .content_type
            .strip_prefix("image/")
            .map(|sub| if sub == "jpeg" { "jpg" } else { sub })
            .unwrap_or("bin");
        let key = format!("{}/{}.{}", prefix.trim_matches('/'), Uuid::new_v4(), extension);

        self.objects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.clone(), upload.bytes.len());

        info!(key = %key, bytes = upload.bytes.len(), "Image stored");
        Ok(StoredImage {
            url: self.url_for(&key),
            key,
        })
    }

    async fn delete(&self, key: &str) -> GatewayResult<()> {
        self.sim.round_trip().await?;

        let removed = self
            .objects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(key);
        match removed {
            Some(_) => {
                debug!(key, "Image deleted");
                Ok(())
            }
            None => Err(GatewayError::NotFound(key.to_string())),
        }
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nhatro_core::MAX_DOCUMENT_BYTES;

    fn upload(content_type: &str, size: usize) -> ImageUpload {
        ImageUpload {
            file_name: "cccd-front.jpg".to_string(),
            content_type: content_type.to_string(),
            bytes: vec![0xFF; size],
        }
    }

    #[test]
    fn test_validate_upload() {
        assert!(validate_upload(&upload("image/jpeg", 1024)).is_ok());
        assert!(validate_upload(&upload("application/pdf", 1024)).is_err());
        assert!(validate_upload(&upload("image/png", 0)).is_err());
        assert!(validate_upload(&upload("image/png", MAX_DOCUMENT_BYTES as usize + 1)).is_err());
        assert!(validate_upload(&upload("image/png", MAX_DOCUMENT_BYTES as usize)).is_ok());
    }

    #[tokio::test]
    async fn test_put_and_delete() {
        let store = SimulatedImageStore::new(&GatewayConfig::instant(), Some(9));
        let stored = store.put("rooms/12/id_front", &upload("image/jpeg", 2048)).await.unwrap();

        assert!(stored.key.starts_with("rooms/12/id_front/"));
        assert!(stored.key.ends_with(".jpg"));
        assert_eq!(stored.url, format!("https://storage.nhatro.local/{}", stored.key));
        assert!(store.contains(&stored.key));

        store.delete(&stored.key).await.unwrap();
        assert!(!store.contains(&stored.key));
        assert!(matches!(
            store.delete(&stored.key).await,
            Err(GatewayError::NotFound(_))
        ));
    }
}
