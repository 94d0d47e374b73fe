//! # nhatro-gateway: External Collaborators
//!
//! Zalo delivery, document image storage and payment QR links, each call
//! wrapped in a timeout, a retry schedule and a cancellation token.
//!
//! ## Call Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Manager command (publish_single / send_reminder / upload_document)    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  Gateway                                                        │   │
//! │  │   send_invoice() ──┐                                            │   │
//! │  │   store_document() ┼──► with_retry(policy, timeout, cancel)     │   │
//! │  │   remove_document()┘          │                                 │   │
//! │  │                               ▼                                 │   │
//! │  │                 Arc<dyn Messenger> / Arc<dyn ImageStore>        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`config`] - Gateway, retry and bank account sections
//! - [`error`] - Gateway errors with retry classification
//! - [`messenger`] - Zalo messenger trait and simulation
//! - [`storage`] - Image store trait, upload validation and simulation
//! - [`retry`] - Backoff / timeout / cancellation wrapper
//! - [`payment_qr`] - VietQR links
//! - [`simulation`] - Latency and failure injection

pub mod config;
pub mod error;
pub mod messenger;
pub mod payment_qr;
pub mod retry;
pub mod simulation;
pub mod storage;

pub use config::{BankAccount, GatewayConfig, RetryPolicy};
pub use error::{GatewayError, GatewayResult};
pub use messenger::{DeliveryReceipt, Messenger, OutgoingMessage, SimulatedZalo};
pub use payment_qr::PaymentQr;
pub use retry::with_retry;
pub use storage::{validate_upload, ImageStore, ImageUpload, SimulatedImageStore, StoredImage};

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use nhatro_core::invoice::Invoice;

// =============================================================================
// Gateway
// =============================================================================

/// The collaborators the manager talks to, with the shared call policy.
#[derive(Clone)]
pub struct Gateway {
    config: GatewayConfig,
    messenger: Arc<dyn Messenger>,
    images: Arc<dyn ImageStore>,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway").field("config", &self.config).finish_non_exhaustive()
    }
}

impl Gateway {
    pub fn new(config: GatewayConfig, messenger: Arc<dyn Messenger>, images: Arc<dyn ImageStore>) -> Self {
        Gateway {
            config,
            messenger,
            images,
        }
    }

    /// Simulated Zalo and image store driven by `config`.
    pub fn simulated(config: GatewayConfig, seed: Option<u64>) -> Self {
        let messenger = Arc::new(SimulatedZalo::new(&config, seed));
        let images = Arc::new(SimulatedImageStore::new(&config, seed.map(|s| s.wrapping_add(1))));
        Gateway::new(config, messenger, images)
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Delivers the invoice notice to the tenant's Zalo.
    pub async fn send_invoice(
        &self,
        invoice: &Invoice,
        cancel: &CancellationToken,
    ) -> GatewayResult<DeliveryReceipt> {
        let message = OutgoingMessage::invoice_notice(invoice);
        debug!(invoice_id = %invoice.id, phone = %message.recipient_phone, "Sending invoice notice");

        with_retry("zalo.send", &self.config.retry, self.config.timeout(), cancel, || {
            self.messenger.send(&message)
        })
        .await
    }

    /// Validates and stores a document image under `prefix`.
    pub async fn store_document(
        &self,
        prefix: &str,
        upload: &ImageUpload,
        cancel: &CancellationToken,
    ) -> GatewayResult<StoredImage> {
        validate_upload(upload)?;
        with_retry("images.put", &self.config.retry, self.config.timeout(), cancel, || {
            self.images.put(prefix, upload)
        })
        .await
    }

    /// Deletes a stored image. A key the store no longer has counts as removed.
    pub async fn remove_document(&self, key: &str, cancel: &CancellationToken) -> GatewayResult<()> {
        let result = with_retry("images.delete", &self.config.retry, self.config.timeout(), cancel, || {
            self.images.delete(key)
        })
        .await;
        match result {
            Err(GatewayError::NotFound(_)) => Ok(()),
            other => other,
        }
    }

    pub fn document_url(&self, key: &str) -> String {
        self.images.url_for(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use nhatro_core::Dong;

    fn invoice(phone: &str) -> Invoice {
        Invoice {
            id: "INV-2025060003".to_string(),
            building_id: "pha".to_string(),
            room_id: 3,
            room_number: "102".to_string(),
            tenant_name: "Lê Thị Hà".to_string(),
            tenant_phone: phone.to_string(),
            month: "2025-05".parse().unwrap(),
            rent_amount: Dong::new(4_000_000),
            electricity_usage: 100,
            electricity_amount: Dong::new(350_000),
            water_usage: 4,
            water_amount: Dong::new(60_000),
            other_fees: Dong::new(130_000),
            total_amount: Dong::new(4_540_000),
            due_date: "2025-06-10".parse().unwrap(),
            paid_date: None,
            created_at: Utc::now(),
            notes: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_invoice_retries_through_outage() {
        let config = GatewayConfig::default();
        let zalo = Arc::new(SimulatedZalo::new(&config, Some(5)));
        let images = Arc::new(SimulatedImageStore::new(&config, Some(6)));
        let gateway = Gateway::new(config, zalo.clone(), images);

        zalo.simulator().fail_next(2);
        let receipt = gateway
            .send_invoice(&invoice("0987654321"), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(receipt.recipient_phone, "0987654321");
        assert_eq!(zalo.simulator().calls(), 3);
        let delivered = zalo.delivered();
        assert_eq!(delivered.len(), 1);
        assert!(delivered[0].body.starts_with("Xin chào Lê Thị Hà,"));
    }

    #[tokio::test]
    async fn test_store_document_rejects_before_upload() {
        let config = GatewayConfig::instant();
        let images = Arc::new(SimulatedImageStore::new(&config, Some(6)));
        let gateway = Gateway::new(config.clone(), Arc::new(SimulatedZalo::new(&config, None)), images.clone());

        let pdf = ImageUpload {
            file_name: "hop-dong.pdf".into(),
            content_type: "application/pdf".into(),
            bytes: vec![1, 2, 3],
        };
        let err = gateway
            .store_document("rooms/1/contract", &pdf, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::InvalidUpload(_)));
        assert_eq!(images.simulator().calls(), 0);
    }

    #[tokio::test]
    async fn test_remove_missing_document_is_ok() {
        let gateway = Gateway::simulated(GatewayConfig::instant(), Some(1));
        assert!(gateway
            .remove_document("rooms/1/id_front/gone.jpg", &CancellationToken::new())
            .await
            .is_ok());
    }
}
