//! # Document Commands
//!
//! Tenant paperwork photos: ID card front/back, vehicle registration and
//! the signed contract.
//!
//! ```text
//! upload_document(room, slot, upload)
//!   1. room must have a tenant
//!   2. gateway.store_document()    validates type/size, then uploads
//!   3. rooms().set_document()      stores the key, returns the old key
//!   4. old image removed from the store (best effort)
//! ```

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::state::{DbState, GatewayState};
use nhatro_core::DocumentSlot;
use nhatro_gateway::{ImageUpload, StoredImage};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentLink {
    pub slot: DocumentSlot,
    pub key: Option<String>,
    pub url: Option<String>,
}

fn storage_prefix(room_id: i64, slot: DocumentSlot) -> String {
    format!("rooms/{}/{}", room_id, slot.as_str())
}

pub async fn list_documents(
    db: &DbState,
    gateway: &GatewayState,
    room_id: i64,
) -> Result<Vec<DocumentLink>, ApiError> {
    let room = db.inner().rooms().get(room_id).await?;
    let tenant = room.occupant()?;

    Ok(DocumentSlot::ALL
        .iter()
        .map(|&slot| {
            let key = tenant.documents.get(slot).map(str::to_string);
            DocumentLink {
                slot,
                url: key.as_deref().map(|k| gateway.inner().document_url(k)),
                key,
            }
        })
        .collect())
}

pub async fn upload_document(
    db: &DbState,
    gateway: &GatewayState,
    room_id: i64,
    slot: DocumentSlot,
    upload: ImageUpload,
) -> Result<StoredImage, ApiError> {
    let room = db.inner().rooms().get(room_id).await?;
    room.occupant()?;

    let cancel = CancellationToken::new();
    let stored = gateway
        .inner()
        .store_document(&storage_prefix(room_id, slot), &upload, &cancel)
        .await?;

    let previous = match db.inner().rooms().set_document(room_id, slot, Some(&stored.key)).await {
        Ok(previous) => previous,
        Err(e) => {
            // Nothing references the new image; do not leave it behind
            if let Err(cleanup) = gateway.inner().remove_document(&stored.key, &cancel).await {
                warn!(key = %stored.key, error = %cleanup, "Failed to remove orphaned image");
            }
            return Err(e.into());
        }
    };

    if let Some(old) = previous.filter(|old| old != &stored.key) {
        if let Err(e) = gateway.inner().remove_document(&old, &cancel).await {
            warn!(key = %old, error = %e, "Failed to remove replaced image");
        }
    }

    info!(room_id, slot = slot.as_str(), key = %stored.key, "Document uploaded");
    Ok(stored)
}

/// Clears the slot. Returns false when it was already empty.
pub async fn remove_document(
    db: &DbState,
    gateway: &GatewayState,
    room_id: i64,
    slot: DocumentSlot,
) -> Result<bool, ApiError> {
    let previous = db.inner().rooms().set_document(room_id, slot, None).await?;
    let Some(key) = previous else {
        return Ok(false);
    };

    if let Err(e) = gateway.inner().remove_document(&key, &CancellationToken::new()).await {
        warn!(key = %key, error = %e, "Slot cleared but image removal failed");
    }
    info!(room_id, slot = slot.as_str(), "Document removed");
    Ok(true)
}
