//! # Zalo Messenger
//!
//! Delivery of invoice notices and payment reminders.
//!
//! ```text
//! Invoice ──► OutgoingMessage::invoice_notice() ──► Messenger::send() ──► DeliveryReceipt
//!                 (nhatro_core::messaging)            (SimulatedZalo)
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::simulation::Simulator;
use nhatro_core::invoice::Invoice;
use nhatro_core::messaging::invoice_message;

// =============================================================================
// Messages
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingMessage {
    pub recipient_name: String,
    pub recipient_phone: String,
    pub body: String,
}

impl OutgoingMessage {
    /// Notice sent when an invoice is published, and again as a reminder.
    pub fn invoice_notice(invoice: &Invoice) -> Self {
        OutgoingMessage {
            recipient_name: invoice.tenant_name.clone(),
            recipient_phone: invoice.tenant_phone.clone(),
            body: invoice_message(invoice),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryReceipt {
    pub message_id: String,
    pub recipient_phone: String,
    pub delivered_at: DateTime<Utc>,
}

// =============================================================================
// Messenger Trait
// =============================================================================

#[async_trait]
pub trait Messenger: Send + Sync {
    /// Delivers one message. Transient failures are retryable.
    async fn send(&self, message: &OutgoingMessage) -> GatewayResult<DeliveryReceipt>;
}

// =============================================================================
// Simulated Zalo
// =============================================================================

/// In-process stand-in for the Zalo OA API. Keeps every delivered message.
#[derive(Debug)]
pub struct SimulatedZalo {
    sim: Simulator,
    delivered: Mutex<Vec<OutgoingMessage>>,
}

impl SimulatedZalo {
    pub fn new(config: &GatewayConfig, seed: Option<u64>) -> Self {
        SimulatedZalo {
            sim: Simulator::new("zalo", config, seed),
            delivered: Mutex::new(Vec::new()),
        }
    }

    pub fn simulator(&self) -> &Simulator {
        &self.sim
    }

    pub fn delivered(&self) -> Vec<OutgoingMessage> {
        self.delivered
            .lock()
            .map(|d| d.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

#[async_trait]
impl Messenger for SimulatedZalo {
    async fn send(&self, message: &OutgoingMessage) -> GatewayResult<DeliveryReceipt> {
        let phone = &message.recipient_phone;
        if phone.len() != 10 || !phone.starts_with('0') || !phone.chars().all(|c| c.is_ascii_digit()) {
            return Err(GatewayError::InvalidRecipient(phone.clone()));
        }

        self.sim.round_trip().await?;

        self.delivered
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(message.clone());

        let receipt = DeliveryReceipt {
            message_id: Uuid::new_v4().to_string(),
            recipient_phone: phone.clone(),
            delivered_at: Utc::now(),
        };
        info!(recipient = %message.recipient_name, message_id = %receipt.message_id, "Zalo message delivered");
        Ok(receipt)
    }
}
