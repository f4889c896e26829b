//! Display Module for Reports and the Live Dashboard
//!
//! This module turns an [`AnalyticsSnapshot`] into something a person can read. It
//! holds the view-models shared by both front ends, the one-shot text report, and
//! (with the `live` feature) the ratatui dashboard.
//!
//! ## Core Components
//!
//! - [`DashboardState`] - What the live dashboard is showing: analytics state, tab, scroll
//! - [`ReportRenderer`] - Colored text report for `pims-dashboard report`
//! - `DashboardManager` - Terminal UI loop using ratatui with crossterm backend
//!
//! ## Dashboard Layout
//!
//! ```text
//! ┌─ Analytics ── Central Pharmacy ─────────── Last updated: 3 minutes ago ─┐
//! ├ Total Revenue ⏱ ┬ Total Profit ⏱ ┬ Pending Orders ┬ Low Stock ─────────┤
//! │ 637.00 -19.3% ↓ │ 120.50 +8.4% ↑ │ 4 ↑            │ 12 ↓              │
//! ├─ [Inventory Analytics] │ Sales Analytics ──────────────────────────────┤
//! │ Category chart          │ Monthly stocked vs sold                      │
//! │ Out of Stock            │ Soon to be Out of Stock                      │
//! │ Expired Products        │ Soon to Expire                               │
//! └──────────────── r refresh · Tab switch · ↑/↓ scroll · q quit ──────────┘
//! ```

pub mod report;
pub mod state;
#[cfg(feature = "live")]
pub mod tui;
#[cfg(feature = "live")]
pub mod widgets;

pub use report::*;
pub use state::*;
#[cfg(feature = "live")]
pub use tui::*;

use std::sync::Arc;

use crate::live::AnalyticsState;
use crate::models::{AnalyticsResponse, AnalyticsSnapshot, Product};

pub const PAGE_TITLE: &str = "Analytics";
pub const PAGE_SUBTITLE: &str = "Track sales, inventory, and other key insights";
pub const LOADING_TEXT: &str = "Loading analytics...";
pub const ERROR_TITLE: &str = "Error loading analytics";
pub const EMPTY_TEXT: &str = "No analytics data available";
pub const NO_PRODUCTS_TEXT: &str = "No products";
pub const TIME_FILTERED_HINT: &str = "This metric is filtered by the selected time range";
pub const ALL_TIME_HINT: &str = "This metric shows current/all-time data";

/// Which top-level screen the dashboard shows for a given fetch state
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardScreen {
    /// First fetch still running
    Loading,
    /// Last fetch failed
    Error(String),
    /// Fetch finished without data
    Empty,
    Content(Arc<AnalyticsSnapshot>),
}

impl DashboardScreen {
    pub fn select(state: &AnalyticsState) -> Self {
        if state.loading && state.data.is_none() {
            return DashboardScreen::Loading;
        }
        if let Some(error) = &state.error {
            return DashboardScreen::Error(error.clone());
        }
        match &state.data {
            Some(snapshot) => DashboardScreen::Content(Arc::clone(snapshot)),
            None => DashboardScreen::Empty,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardTab {
    Inventory,
    Sales,
}

impl DashboardTab {
    pub const ALL: [DashboardTab; 2] = [DashboardTab::Inventory, DashboardTab::Sales];

    pub fn title(self) -> &'static str {
        match self {
            DashboardTab::Inventory => "Inventory Analytics",
            DashboardTab::Sales => "Sales Analytics",
        }
    }

    pub fn index(self) -> usize {
        match self {
            DashboardTab::Inventory => 0,
            DashboardTab::Sales => 1,
        }
    }

    pub fn next(self) -> Self {
        match self {
            DashboardTab::Inventory => DashboardTab::Sales,
            DashboardTab::Sales => DashboardTab::Inventory,
        }
    }

    /// Product tables shown on this tab, in display order
    pub fn product_tables(self, analytics: &AnalyticsResponse) -> Vec<(&'static str, &[Product])> {
        match self {
            DashboardTab::Inventory => vec![
                ("Out of Stock", analytics.out_of_stock_products.as_slice()),
                ("Soon to be Out of Stock", analytics.soon_to_be_out_of_stock_products.as_slice()),
                ("Expired Products", analytics.expired_products.as_slice()),
                ("Soon to Expire", analytics.soon_to_expire_products.as_slice()),
            ],
            DashboardTab::Sales => vec![
                ("Fast Moving Products", analytics.fast_moving_products.as_slice()),
                ("Slow Moving Products", analytics.slow_moving_products.as_slice()),
            ],
        }
    }
}

pub const PRODUCT_TABLE_HEADERS: [&str; 5] = ["Name", "SKU", "Quantity", "Unit Price", "Expiry"];

/// One formatted row of a products table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRow {
    pub name: String,
    pub sku: String,
    pub quantity: String,
    pub unit_price: String,
    pub expiry: String,
}

impl ProductRow {
    pub fn from_product(product: &Product) -> Self {
        Self {
            name: product.display_name(),
            sku: product.sku.clone().unwrap_or_else(|| "-".to_string()),
            quantity: format_quantity(product.quantity),
            unit_price: format_currency(product.unit_price),
            expiry: product
                .expiry_date
                .as_deref()
                .map(format_date)
                .unwrap_or_else(|| "-".to_string()),
        }
    }

    pub fn cells(&self) -> [&str; 5] {
        [&self.name, &self.sku, &self.quantity, &self.unit_price, &self.expiry]
    }
}

pub fn product_rows(products: &[Product]) -> Vec<ProductRow> {
    products.iter().map(ProductRow::from_product).collect()
}

/// Date part of an ISO timestamp (`2025-06-30T00:00:00Z` → `2025-06-30`)
pub fn format_date(value: &str) -> String {
    value.split('T').next().unwrap_or(value).to_string()
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn format_grouped(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((int_part, frac)) => (int_part.to_string(), Some(frac.to_string())),
        None => (formatted.clone(), None),
    };
    let sign = if value < 0.0 && formatted.chars().any(|c| c.is_ascii_digit() && c != '0') {
        "-"
    } else {
        ""
    };
    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, group_thousands(&int_part), frac),
        None => format!("{}{}", sign, group_thousands(&int_part)),
    }
}

/// Whole quantities without decimals, fractional ones with up to two
pub fn format_quantity(value: f64) -> String {
    if value.fract() == 0.0 {
        format_grouped(value, 0)
    } else {
        let s = format_grouped(value, 2);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Money with two decimals and thousands separators
pub fn format_currency(value: f64) -> String {
    format_grouped(value, 2)
}

/// Chart series for the category distribution: (category, in stock, sold)
pub fn category_series(analytics: &AnalyticsResponse) -> Vec<(String, u64, u64)> {
    analytics
        .distribution_by_category
        .iter()
        .map(|slice| {
            (
                slice.category.clone(),
                slice.stock_qty.max(0) as u64,
                slice.sold_qty.max(0) as u64,
            )
        })
        .collect()
}

/// Chart series for the monthly comparison: (month, stocked, sold)
pub fn monthly_series(analytics: &AnalyticsResponse) -> Vec<(String, u64, u64)> {
    analytics
        .monthly_stocked_vs_sold
        .iter()
        .map(|point| (point.month.clone(), point.stocked.max(0) as u64, point.sold.max(0) as u64))
        .collect()
}
