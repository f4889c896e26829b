//! Report rendering and dashboard view-model over a realistic snapshot

mod common;

use chrono::{Duration, Utc};
use common::snapshot;
use pims_dashboard::display::{
    product_rows, render_json, DashboardScreen, DashboardState, DashboardTab, ReportRenderer,
};
use pims_dashboard::live::AnalyticsState;
use pims_dashboard::metrics::metric_cards;
use pims_dashboard::timestamp_parser::TimestampParser;
use std::sync::Arc;

#[test]
fn test_summary_cards_from_snapshot() {
    let snapshot = snapshot("Central Pharmacy");
    let cards = metric_cards(&snapshot.analytics.metrics);

    assert_eq!(cards.len(), 3);
    assert_eq!(cards[0].display.main, "637.00");
    assert_eq!(cards[0].display.percent.as_deref(), Some("-19.3%"));
    assert!(cards[0].time_filtered);

    assert_eq!(cards[1].display.display_label, "Pending Orders");
    assert_eq!(cards[1].display.main, "4");
    assert!(!cards[1].time_filtered);

    assert_eq!(cards[2].display.main, "12");
}

#[test]
fn test_text_report_sections() {
    colored::control::set_override(false);
    let snapshot = snapshot("Central Pharmacy");
    let now = TimestampParser::parse("2025-03-10T12:00:00Z").unwrap();

    let text = ReportRenderer::new().render(&snapshot, now);

    for expected in [
        "Analytics · Central Pharmacy",
        "Last updated: 5 minutes ago",
        "Key Metrics",
        "Pending Orders",
        "Stock Value",
        "Distribution by Category",
        "Antibiotics",
        "Out of Stock (1)",
        "Amoxicillin (Amoxil)",
        "Expired Products (0)",
        "Fast Moving Products (1)",
        "1,500",
        "2026-01-31",
        "MedSupply",
        "12,500.50",
        "1. Abebe",
    ] {
        assert!(text.contains(expected), "report is missing {:?}", expected);
    }
}

#[test]
fn test_json_report_keeps_raw_analytics() {
    let snapshot = snapshot("Central Pharmacy");
    let json = render_json(&snapshot, true).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["pharmacyName"], "Central Pharmacy");
    assert_eq!(value["summaryCards"][1]["displayLabel"], "Pending Orders");
    assert_eq!(value["inventoryCards"][0]["main"], "12,400.00");
    assert_eq!(value["analytics"]["topSuppliers"][0]["name"], "MedSupply");
    assert_eq!(
        value["analytics"]["metrics"][1]["value"],
        serde_json::json!({"pending": 4, "completed": 10})
    );
}

#[test]
fn test_product_rows_and_tabs() {
    let snapshot = snapshot("Central Pharmacy");
    let tables = DashboardTab::Inventory.product_tables(&snapshot.analytics);
    assert_eq!(
        tables.iter().map(|(title, _)| *title).collect::<Vec<_>>(),
        vec!["Out of Stock", "Soon to be Out of Stock", "Expired Products", "Soon to Expire"]
    );

    let rows = product_rows(tables[0].1);
    assert_eq!(rows[0].cells(), ["Amoxicillin (Amoxil)", "AMX-500", "0", "3.50", "-"]);
}

#[test]
fn test_dashboard_state_lifecycle() {
    let mut state = DashboardState::new(None);
    assert_eq!(state.screen(), DashboardScreen::Loading);

    let data = Arc::new(snapshot("Central Pharmacy"));
    state.update_analytics(AnalyticsState {
        data: Some(data.clone()),
        loading: false,
        error: None,
    });
    assert!(matches!(state.screen(), DashboardScreen::Content(_)));

    // A failed refresh shows the error while the data is kept for later
    state.update_analytics(AnalyticsState {
        data: Some(data),
        loading: false,
        error: Some("Failed to fetch analytics".to_string()),
    });
    assert_eq!(state.screen(), DashboardScreen::Error("Failed to fetch analytics".to_string()));
    assert!(state.analytics.data.is_some());

    let now = Utc::now();
    state.update_last_updated(Some(now - Duration::seconds(20)));
    assert_eq!(state.last_updated_text(now).as_deref(), Some("Last updated: just now"));
}
