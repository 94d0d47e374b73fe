//! # Commands Module
//!
//! Every operation the dashboard invokes.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs            ◄─── You are here (exports)
//! ├── dashboard.rs      ◄─── Overview figures, buildings
//! ├── rooms.rs          ◄─── Room list, pricing, water billing, preview
//! ├── tenants.rs        ◄─── Check-in/out, tenant directory
//! ├── documents.rs      ◄─── Tenant document images
//! ├── invoices.rs       ◄─── Invoice list, payment, reminder, QR
//! ├── bulk.rs           ◄─── Draft session and publishing
//! ├── requests.rs       ◄─── Customer request workflow
//! ├── notifications.rs  ◄─── Notification feed
//! └── settings.rs       ◄─── Pricing template, profile, preferences
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Command Flow                                         │
//! │                                                                         │
//! │  async fn mark_invoice_paid(                                            │
//! │      db: &DbState,            ◄── only the state it needs              │
//! │      config: &ConfigState,                                              │
//! │      invoice_id: &str,        ◄── from the caller                      │
//! │  ) -> Result<InvoiceDto, ApiError>                                      │
//! │         │                                                               │
//! │         │ (camelCase JSON)                                              │
//! │         ▼                                                               │
//! │  Dashboard receives: InvoiceDto                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod bulk;
pub mod dashboard;
pub mod documents;
pub mod invoices;
pub mod notifications;
pub mod requests;
pub mod rooms;
pub mod settings;
pub mod tenants;
