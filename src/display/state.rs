//! Display State Management
//!
//! This module manages the state for the live dashboard: the latest analytics state
//! published by the scheduler, the last-updated stamp, the selected tab and the
//! scroll position of the product tables.

use chrono::{DateTime, Utc};

use super::{DashboardScreen, DashboardTab, PAGE_TITLE};
use crate::live::{AnalyticsState, LastUpdatedAt};
use crate::models::User;
use crate::timestamp_parser::{format_relative_time, TimestampParser};

/// Core display state for the live dashboard
#[derive(Debug)]
pub struct DashboardState {
    /// Latest fetch state from the scheduler
    pub analytics: AnalyticsState,
    /// Stamp from the last-updated poll
    pub last_updated: LastUpdatedAt,
    pub tab: DashboardTab,
    /// Rows skipped at the top of every product table
    pub scroll_position: usize,
    pub user: Option<User>,
}

impl DashboardState {
    pub fn new(user: Option<User>) -> Self {
        Self {
            analytics: AnalyticsState::default(),
            last_updated: None,
            tab: DashboardTab::Inventory,
            scroll_position: 0,
            user,
        }
    }

    pub fn update_analytics(&mut self, state: AnalyticsState) {
        let had_data = self.analytics.data.is_some();
        self.analytics = state;
        if !had_data && self.analytics.data.is_some() {
            self.scroll_position = 0;
        }
    }

    pub fn update_last_updated(&mut self, stamp: LastUpdatedAt) {
        self.last_updated = stamp;
    }

    pub fn screen(&self) -> DashboardScreen {
        DashboardScreen::select(&self.analytics)
    }

    /// A background refresh is running while data is already on screen
    pub fn is_refreshing(&self) -> bool {
        self.analytics.loading && self.analytics.data.is_some()
    }

    pub fn next_tab(&mut self) {
        self.tab = self.tab.next();
        self.scroll_position = 0;
    }

    pub fn previous_tab(&mut self) {
        // Two tabs, so previous and next coincide
        self.next_tab();
    }

    pub fn scroll_up(&mut self) {
        if self.scroll_position > 0 {
            self.scroll_position -= 1;
        }
    }

    /// Scroll down, never past the end of the longest table on the current tab
    pub fn scroll_down(&mut self, visible_rows: usize) {
        let max_scroll = self.longest_table_len().saturating_sub(visible_rows);
        if self.scroll_position < max_scroll {
            self.scroll_position += 1;
        }
    }

    fn longest_table_len(&self) -> usize {
        self.analytics
            .data
            .as_ref()
            .map(|snapshot| {
                self.tab
                    .product_tables(&snapshot.analytics)
                    .iter()
                    .map(|(_, products)| products.len())
                    .max()
                    .unwrap_or(0)
            })
            .unwrap_or(0)
    }

    /// Best known freshness: the poll result, else the snapshot's own stamp
    pub fn effective_last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated.or_else(|| {
            self.analytics
                .data
                .as_ref()
                .and_then(|snapshot| snapshot.last_updated_stamp())
                .and_then(TimestampParser::parse_opt)
        })
    }

    pub fn last_updated_text(&self, now: DateTime<Utc>) -> Option<String> {
        self.effective_last_updated()
            .map(|ts| format!("Last updated: {}", format_relative_time(ts, now)))
    }

    /// Title line: page title plus pharmacy name when known
    pub fn format_title(&self) -> String {
        match self
            .analytics
            .data
            .as_ref()
            .and_then(|snapshot| snapshot.pharmacy_name.as_deref())
        {
            Some(name) => format!("{} · {}", PAGE_TITLE, name),
            None => PAGE_TITLE.to_string(),
        }
    }

    pub fn format_user(&self) -> Option<String> {
        self.user.as_ref().map(|user| format!("Signed in as {}", user.display_name()))
    }
}
