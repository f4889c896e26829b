//! One-shot analytics report
//!
//! Renders a snapshot as colored terminal text, or as JSON with the metric cards
//! already parsed so scripts see the same values the dashboard shows.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;
use std::fmt::Write as _;

use super::{
    category_series, monthly_series, product_rows, DashboardTab, EMPTY_TEXT, NO_PRODUCTS_TEXT,
    PAGE_SUBTITLE, PAGE_TITLE, PRODUCT_TABLE_HEADERS,
};
use super::{format_currency, format_quantity};
use crate::metrics::{metric_cards, MetricCard};
use crate::models::{AnalyticsResponse, AnalyticsSnapshot, SupplierSummary, TopPerformer};
use crate::timestamp_parser::{format_relative_time, TimestampParser};

const RULE_WIDTH: usize = 80;
const BAR_WIDTH: usize = 30;

/// JSON shape of `report --json`
#[derive(Debug, Serialize)]
pub struct ReportJson<'a> {
    #[serde(rename = "pharmacyId")]
    pub pharmacy_id: &'a str,
    #[serde(rename = "pharmacyName", skip_serializing_if = "Option::is_none")]
    pub pharmacy_name: Option<&'a str>,
    #[serde(rename = "lastUpdatedAt", skip_serializing_if = "Option::is_none")]
    pub last_updated_at: Option<&'a str>,
    #[serde(rename = "summaryCards")]
    pub summary_cards: Vec<MetricCard>,
    #[serde(rename = "inventoryCards")]
    pub inventory_cards: Vec<MetricCard>,
    pub analytics: &'a AnalyticsResponse,
}

impl<'a> ReportJson<'a> {
    pub fn new(snapshot: &'a AnalyticsSnapshot) -> Self {
        Self {
            pharmacy_id: &snapshot.pharmacy_id,
            pharmacy_name: snapshot.pharmacy_name.as_deref(),
            last_updated_at: snapshot.last_updated_at.as_deref(),
            summary_cards: metric_cards(&snapshot.analytics.metrics),
            inventory_cards: metric_cards(&snapshot.analytics.inventory_cards),
            analytics: &snapshot.analytics,
        }
    }
}

pub fn render_json(snapshot: &AnalyticsSnapshot, pretty: bool) -> Result<String> {
    let report = ReportJson::new(snapshot);
    if pretty {
        serde_json::to_string_pretty(&report).context("Failed to serialize report")
    } else {
        serde_json::to_string(&report).context("Failed to serialize report")
    }
}

/// Scaled horizontal bar, at least one cell for any non-zero value
pub fn bar(value: u64, max: u64, width: usize) -> String {
    if max == 0 || value == 0 {
        return String::new();
    }
    let cells = ((value as f64 / max as f64) * width as f64).round() as usize;
    "█".repeat(cells.clamp(1, width))
}

#[derive(Debug, Clone, Default)]
pub struct ReportRenderer;

impl ReportRenderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, snapshot: &AnalyticsSnapshot, now: DateTime<Utc>) -> String {
        let mut out = String::new();
        let analytics = &snapshot.analytics;

        self.render_header(&mut out, snapshot, now);

        if analytics.metrics.is_empty() && analytics.inventory_cards.is_empty() {
            let _ = writeln!(out, "{}", EMPTY_TEXT.dimmed());
        }
        self.render_cards(&mut out, "Key Metrics", &metric_cards(&analytics.metrics));
        if !analytics.inventory_cards.is_empty() {
            self.render_cards(&mut out, "Inventory", &metric_cards(&analytics.inventory_cards));
        }

        for tab in DashboardTab::ALL {
            self.render_section_title(&mut out, tab.title());
            if tab == DashboardTab::Inventory {
                self.render_series(&mut out, "Distribution by Category", "stock", "sold", &category_series(analytics));
                self.render_series(&mut out, "Monthly Stocked vs Sold", "stocked", "sold", &monthly_series(analytics));
            }
            for (title, products) in tab.product_tables(analytics) {
                self.render_products(&mut out, title, products);
            }
            if tab == DashboardTab::Sales {
                self.render_suppliers(&mut out, &analytics.top_suppliers);
                self.render_performers(&mut out, &analytics.top_performers);
            }
        }

        out
    }

    fn render_header(&self, out: &mut String, snapshot: &AnalyticsSnapshot, now: DateTime<Utc>) {
        let _ = writeln!(out, "\n{}", "=".repeat(RULE_WIDTH).bright_cyan());
        let title = match snapshot.pharmacy_name.as_deref() {
            Some(name) => format!("{} · {}", PAGE_TITLE, name),
            None => PAGE_TITLE.to_string(),
        };
        let _ = writeln!(out, "{}", title.bright_white().bold());
        let _ = writeln!(out, "{}", PAGE_SUBTITLE.dimmed());
        if let Some(ts) = snapshot.last_updated_stamp().and_then(TimestampParser::parse_opt) {
            let _ = writeln!(out, "Last updated: {}", format_relative_time(ts, now).bright_yellow());
        }
        let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH).bright_cyan());
    }

    fn render_section_title(&self, out: &mut String, title: &str) {
        let _ = writeln!(out, "\n{}", title.bright_cyan().bold());
        let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH).bright_cyan());
    }

    fn render_cards(&self, out: &mut String, title: &str, cards: &[MetricCard]) {
        if cards.is_empty() {
            return;
        }
        self.render_section_title(out, title);
        for card in cards {
            let label = if card.time_filtered {
                format!("{} ⏱", card.display.display_label)
            } else {
                card.display.display_label.clone()
            };
            let trend = if card.trend_up { "↑".bright_green() } else { "↓".bright_red() };
            let percent = card
                .display
                .percent
                .as_deref()
                .map(|p| {
                    let colored = if p.starts_with('-') { p.bright_red() } else { p.bright_green() };
                    format!(" ({})", colored)
                })
                .unwrap_or_default();
            let _ = writeln!(
                out,
                "  {:<34} {}{} {}",
                label,
                card.display.main.bright_white().bold(),
                percent,
                trend
            );
        }
    }

    fn render_series(&self, out: &mut String, title: &str, first: &str, second: &str, series: &[(String, u64, u64)]) {
        let _ = writeln!(out, "\n  {}", title.bright_white().bold());
        if series.is_empty() {
            let _ = writeln!(out, "    {}", "No data".dimmed());
            return;
        }
        let max = series
            .iter()
            .map(|(_, a, b)| (*a).max(*b))
            .max()
            .unwrap_or(0);
        for (label, a, b) in series {
            let _ = writeln!(
                out,
                "    {:<16} {:<6} {:>10} {}",
                label,
                first,
                format_quantity(*a as f64),
                bar(*a, max, BAR_WIDTH).bright_blue()
            );
            let _ = writeln!(
                out,
                "    {:<16} {:<6} {:>10} {}",
                "",
                second,
                format_quantity(*b as f64),
                bar(*b, max, BAR_WIDTH).bright_green()
            );
        }
    }

    fn render_products(&self, out: &mut String, title: &str, products: &[crate::models::Product]) {
        let _ = writeln!(out, "\n  {} ({})", title.bright_white().bold(), products.len());
        if products.is_empty() {
            let _ = writeln!(out, "    {}", NO_PRODUCTS_TEXT.dimmed());
            return;
        }
        let [name, sku, qty, price, expiry] = PRODUCT_TABLE_HEADERS;
        let _ = writeln!(
            out,
            "    {}",
            format!("{:<36} {:<12} {:>10} {:>12} {:<10}", name, sku, qty, price, expiry).dimmed()
        );
        for row in product_rows(products) {
            let _ = writeln!(
                out,
                "    {:<36} {:<12} {:>10} {:>12} {:<10}",
                row.name, row.sku, row.quantity, row.unit_price, row.expiry
            );
        }
    }

    fn render_suppliers(&self, out: &mut String, suppliers: &[SupplierSummary]) {
        let _ = writeln!(out, "\n  {}", "Top Suppliers".bright_white().bold());
        if suppliers.is_empty() {
            let _ = writeln!(out, "    {}", "No suppliers".dimmed());
            return;
        }
        for supplier in suppliers {
            let _ = writeln!(
                out,
                "    {:<28} {} units · {} · {} orders · {}% complete · top item: {}",
                supplier.name,
                format_quantity(supplier.volume_supplied),
                format_currency(supplier.value_supplied).bright_green(),
                supplier.orders_delivered,
                format_quantity((supplier.order_completion_pct * 10.0).round() / 10.0),
                supplier.most_supplied_item
            );
        }
    }

    fn render_performers(&self, out: &mut String, performers: &[TopPerformer]) {
        let _ = writeln!(out, "\n  {}", "Top Performers".bright_white().bold());
        if performers.is_empty() {
            let _ = writeln!(out, "    {}", "No performers".dimmed());
            return;
        }
        for (rank, performer) in performers.iter().enumerate() {
            let _ = writeln!(
                out,
                "    {}. {:<24} @{:<16} {} sold",
                rank + 1,
                performer.name,
                performer.username,
                format_quantity(performer.volume_sold).bright_yellow()
            );
        }
    }
}
