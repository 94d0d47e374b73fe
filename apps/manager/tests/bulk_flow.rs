//! End-to-end billing cycle through the public command API.

use chrono::NaiveDate;

use nhatro_core::invoice::{InvoiceFilter, InvoiceStatus};
use nhatro_core::{BillingMonth, RoomStatus};
use nhatro_gateway::GatewayConfig;
use nhatro_manager::commands::bulk::{self, PublishResult};
use nhatro_manager::commands::{dashboard, invoices};
use nhatro_manager::config::ManagerConfig;
use nhatro_manager::error::ErrorCode;
use nhatro_manager::{bootstrap, App};

async fn app() -> App {
    let mut config = ManagerConfig::default();
    config.billing.fixed_today = NaiveDate::from_ymd_opt(2025, 6, 15);
    config.gateway = GatewayConfig::instant();
    bootstrap(&config).await.unwrap()
}

#[tokio::test]
async fn test_monthly_cycle() {
    let app = app().await;
    let may = app.billing_month();
    assert_eq!(may.to_string(), "2025-05");

    let before = dashboard::get_dashboard_stats(&app.db, &app.config).await.unwrap();

    // Enter readings for every row: +50 kWh, +3 m³
    let overview = bulk::initialize_drafts(&app.db, &app.drafts, may, None, None).await.unwrap();
    assert_eq!(overview.stats.total, before.occupied_rooms);
    for row in &overview.rows {
        bulk::set_draft_electricity(&app.drafts, row.room_id, Some(row.electricity_previous + 50))
            .await
            .unwrap();
        bulk::set_draft_water(&app.drafts, row.room_id, Some(row.water_previous + 3))
            .await
            .unwrap();
    }
    let stats = bulk::get_draft_stats(&app.drafts).await.unwrap();
    assert_eq!(stats.ready, stats.total);

    let summary = bulk::publish_all(&app.db, &app.drafts, &app.gateway, &app.config)
        .await
        .unwrap();
    assert_eq!(summary.succeeded, overview.rows.len());
    assert_eq!(summary.failed + summary.skipped, 0);
    let published_total: i64 = summary
        .items
        .iter()
        .map(|i| match &i.result {
            PublishResult::Published { total_amount, .. } => *total_amount,
            _ => 0,
        })
        .sum();
    assert_eq!(published_total, stats.total_amount.amount());

    // Every occupied room now owes May, already past the 10 June due date
    let may_invoices = invoices::list_invoices(
        &app.db,
        &app.config,
        &InvoiceFilter {
            month: Some(5),
            year: Some(2025),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(may_invoices.len(), overview.rows.len());
    assert!(may_invoices.iter().all(|i| i.status == InvoiceStatus::Overdue));

    let after = dashboard::get_dashboard_stats(&app.db, &app.config).await.unwrap();
    assert_eq!(after.unpaid_invoices, before.unpaid_invoices + overview.rows.len());

    // Pay one and check the room balance follows
    let first = &may_invoices[0];
    let qr = invoices::get_payment_qr(&app.db, &app.config, &first.id).await.unwrap();
    assert_eq!(qr.memo, format!("{} {}", first.id, first.room_number));
    let paid = invoices::mark_invoice_paid(&app.db, &app.config, &first.id).await.unwrap();
    assert_eq!(paid.status, InvoiceStatus::Paid);

    let err = invoices::send_reminder(&app.db, &app.gateway, &first.id).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::BusinessLogic);

    let room = app.db.inner().rooms().get(first.room_id).await.unwrap();
    let still_owes = app
        .db
        .inner()
        .invoices()
        .list_for_room(room.id)
        .await
        .unwrap()
        .iter()
        .any(|i| !i.is_paid());
    let expected = if still_owes { RoomStatus::Debt } else { RoomStatus::Paid };
    assert_eq!(room.status, expected);

    // Next month starts from May's readings
    let june: BillingMonth = "2025-06".parse().unwrap();
    let next = bulk::initialize_drafts(&app.db, &app.drafts, june, None, None).await.unwrap();
    for (row, prev) in next.rows.iter().zip(&overview.rows) {
        assert_eq!(row.room_id, prev.room_id);
        assert_eq!(row.electricity_previous, prev.electricity_previous + 50);
    }
}

#[tokio::test]
async fn test_session_required_before_publish() {
    let app = app().await;
    let err = bulk::publish_all(&app.db, &app.drafts, &app.gateway, &app.config)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::BusinessLogic);
    assert!(!bulk::cancel_publish(&app.gateway));
}
