//! # State Module
//!
//! Application state shared by the manager commands.
//!
//! Each command declares only the state it needs instead of taking one
//! `AppState` with everything in it.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────┐ ┌──────────────┐ ┌──────────────┐ ┌──────────────┐   │
//! │  │   DbState    │ │  DraftState  │ │ GatewayState │ │ ConfigState  │   │
//! │  │              │ │              │ │              │ │              │   │
//! │  │  Database    │ │  Arc<Mutex<  │ │  Gateway     │ │  bank        │   │
//! │  │  (SQLite     │ │   Option<    │ │  + running   │ │  billing     │   │
//! │  │   pool)      │ │   DraftBook  │ │  batch token │ │  clock       │   │
//! │  │              │ │  >>>         │ │              │ │              │   │
//! │  └──────────────┘ └──────────────┘ └──────────────┘ └──────────────┘   │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • DbState: Database has internal connection pool (thread-safe)        │
//! │  • DraftState: tokio Mutex, held across the publish transaction        │
//! │  • GatewayState: collaborators are Send + Sync behind Arc              │
//! │  • ConfigState: Read-only after initialization                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod db;
mod drafts;
mod gateway;

pub use config::ConfigState;
pub use db::DbState;
pub use drafts::DraftState;
pub use gateway::GatewayState;
