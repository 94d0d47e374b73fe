//! # Nhà Trọ Manager Library
//!
//! Command layer and startup for the rental billing dashboard. Every
//! operation the dashboard needs is an async function in [`commands`]
//! taking only the state it uses.
//!
//! ## Module Organization
//! ```text
//! nhatro_manager/
//! ├── lib.rs          ◄─── You are here (startup & logging)
//! ├── config.rs       ◄─── ManagerConfig: TOML + NHATRO_* overrides
//! ├── error.rs        ◄─── API error type for commands
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── db.rs       ◄─── Database handle
//! │   ├── drafts.rs   ◄─── Draft session (one billing month)
//! │   ├── gateway.rs  ◄─── Zalo/storage gateway + publish batch token
//! │   └── config.rs   ◄─── Bank account, billing knobs, clock
//! └── commands/       ◄─── dashboard, rooms, tenants, documents, invoices,
//!                          bulk, requests, notifications, settings
//! ```

pub mod commands;
pub mod config;
pub mod error;
pub mod state;

use thiserror::Error;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use config::{ConfigError, ManagerConfig};
use nhatro_core::BillingMonth;
use nhatro_db::{seed_if_empty, Database, DbConfig, DbError, SeedOptions};
use nhatro_gateway::Gateway;
use state::{ConfigState, DbState, DraftState, GatewayState};

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

/// All state the commands draw from.
pub struct App {
    pub db: DbState,
    pub drafts: DraftState,
    pub gateway: GatewayState,
    pub config: ConfigState,
}

impl App {
    /// The month a new draft session bills by default: the one just ended.
    pub fn billing_month(&self) -> BillingMonth {
        BillingMonth::from_date(self.config.today()).previous()
    }
}

/// Builds the application state from configuration.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                       Application Startup                               │
/// │                                                                         │
/// │  1. Validate Config ──────────────────────────────────────────────────► │
/// │                                                                         │
/// │  2. Connect to Database ──────────────────────────────────────────────► │
/// │     • [database].path set: SQLite file, WAL mode                        │
/// │     • otherwise: in-memory                                              │
/// │     • Run pending migrations                                            │
/// │                                                                         │
/// │  3. Seed Mock Data ───────────────────────────────────────────────────► │
/// │     • only when seed_mock_data is on and no buildings exist             │
/// │     • deterministic from rng_seed and today                             │
/// │                                                                         │
/// │  4. Initialize State Objects ─────────────────────────────────────────► │
/// │     • DbState, DraftState (empty), GatewayState (simulated), ConfigState│
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn bootstrap(config: &ManagerConfig) -> Result<App, StartupError> {
    config.validate()?;

    let db_config = match &config.database.path {
        Some(path) => {
            info!(?path, "Opening database file");
            DbConfig::new(path.clone())
        }
        None => {
            info!("Using in-memory database");
            DbConfig::in_memory()
        }
    };
    let db = Database::new(db_config).await?;
    info!("Database connected and migrations applied");

    let config_state = ConfigState::from_config(config);
    if config.database.seed_mock_data {
        let options = SeedOptions::new(config.database.rng_seed, config_state.today());
        if let Some(summary) = seed_if_empty(&db, &options).await? {
            info!(
                buildings = summary.buildings,
                rooms = summary.rooms,
                invoices = summary.invoices,
                "Mock data seeded"
            );
        }
    }

    let gateway = Gateway::simulated(config.gateway.clone(), Some(config.database.rng_seed));

    info!("State initialized");
    Ok(App {
        db: DbState::new(db),
        drafts: DraftState::new(),
        gateway: GatewayState::new(gateway),
        config: config_state,
    })
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=nhatro=trace` - Show trace for nhatro crates only
/// - Default: INFO, with DEBUG for nhatro crates
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,nhatro=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::TRACE)
        .init();
}
