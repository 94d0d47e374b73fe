//! # Nhà Trọ Manager Entry Point
//!
//! Runs one billing cycle against the configured database and prints what
//! the dashboard would show.
//!
//! ## Run Sequence
//! 1. Initialize tracing (logging)
//! 2. Load `nhatro.toml` (or defaults) with `NHATRO_*` overrides
//! 3. Bootstrap state: database, mock data, simulated gateway
//! 4. Print the dashboard overview
//! 5. Open a draft session for last month and carry readings forward
//! 6. Publish every ready draft and print the summary
//!
//! Pass a config file path as the first argument to override the platform
//! default location.

use std::path::PathBuf;
use std::process::ExitCode;

use tracing::{error, info};

use nhatro_manager::commands::{bulk, dashboard};
use nhatro_manager::config::ManagerConfig;
use nhatro_manager::error::ApiError;
use nhatro_manager::{bootstrap, init_tracing, App};

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    info!("Starting Nhà Trọ manager");

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = ManagerConfig::load_or_default(config_path);

    let app = match bootstrap(&config).await {
        Ok(app) => app,
        Err(e) => {
            error!(error = %e, "Startup failed");
            return ExitCode::FAILURE;
        }
    };

    match run_cycle(&app).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Billing cycle failed");
            ExitCode::FAILURE
        }
    }
}

async fn run_cycle(app: &App) -> Result<(), ApiError> {
    let stats = dashboard::get_dashboard_stats(&app.db, &app.config).await?;
    println!("Tổng doanh thu:       {}", stats.total_revenue);
    println!("Phòng trống:          {}/{}", stats.empty_rooms, stats.total_rooms);
    println!("Hóa đơn chưa thu:     {}", stats.unpaid_invoices);
    println!("Hợp đồng sắp hết hạn: {}", stats.expiring_contracts);

    let month = app.billing_month();
    let overview = bulk::initialize_drafts(&app.db, &app.drafts, month, None, None).await?;
    println!("\nTháng {}: {} phòng cần lập hóa đơn", month.label(), overview.rows.len());

    bulk::use_previous_for_all(&app.drafts).await?;
    let drafts = bulk::get_draft_stats(&app.drafts).await?;
    println!("Sẵn sàng gửi: {} ({})", drafts.ready, drafts.total_amount);

    let summary = bulk::publish_all(&app.db, &app.drafts, &app.gateway, &app.config).await?;
    println!(
        "Đã gửi {} hóa đơn, lỗi {}, bỏ qua {}",
        summary.succeeded, summary.failed, summary.skipped
    );
    for item in summary.items.iter().filter(|i| !matches!(i.result, bulk::PublishResult::Published { .. })) {
        println!("  P.{}: {:?}", item.room_number, item.result);
    }

    Ok(())
}
