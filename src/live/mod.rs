//! Live analytics feed
//!
//! Keeps the dashboard's view of the backend fresh: the analytics snapshot every few
//! minutes and the "last updated" stamp every minute, both driven by one
//! [`scheduler::RefreshScheduler`] task and published through watch channels.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

use crate::api::{ApiClient, ApiError};
use crate::config::RefreshConfig;
use crate::models::{AnalyticsSnapshot, LastUpdated};

pub mod scheduler;

pub use scheduler::{AnalyticsFeed, RefreshScheduler};

/// Message shown when a fetch fails and the backend gave no reason
pub const FETCH_ERROR_FALLBACK: &str = "Failed to fetch analytics";

/// Timer periods for the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshIntervals {
    pub analytics: Duration,
    pub last_updated: Duration,
}

impl Default for RefreshIntervals {
    fn default() -> Self {
        Self {
            analytics: Duration::from_secs(5 * 60),
            last_updated: Duration::from_secs(60),
        }
    }
}

impl From<&RefreshConfig> for RefreshIntervals {
    fn from(config: &RefreshConfig) -> Self {
        Self {
            analytics: config.analytics_interval(),
            last_updated: config.last_updated_interval(),
        }
    }
}

/// Observable state of the analytics fetch
#[derive(Debug, Clone)]
pub struct AnalyticsState {
    /// Last successfully fetched snapshot, kept across failures
    pub data: Option<Arc<AnalyticsSnapshot>>,
    /// A fetch is in flight
    pub loading: bool,
    /// Message from the most recent failed fetch, cleared when the next one starts
    pub error: Option<String>,
}

impl Default for AnalyticsState {
    fn default() -> Self {
        Self {
            data: None,
            loading: true,
            error: None,
        }
    }
}

/// Where the scheduler gets its data from
#[async_trait]
pub trait AnalyticsSource: Send + Sync {
    async fn latest_snapshot(&self) -> Result<AnalyticsSnapshot, ApiError>;
    async fn last_updated(&self) -> Result<LastUpdated, ApiError>;
}

#[async_trait]
impl AnalyticsSource for ApiClient {
    async fn latest_snapshot(&self) -> Result<AnalyticsSnapshot, ApiError> {
        self.get_analytics().await
    }

    async fn last_updated(&self) -> Result<LastUpdated, ApiError> {
        self.get_last_updated().await
    }
}

/// Freshness stamp published by the scheduler
pub type LastUpdatedAt = Option<DateTime<Utc>>;
