//! Live mode command implementation
//!
//! Starts the refresh scheduler against the API and hands the terminal to the
//! dashboard until the user quits or the session ends.

use anyhow::{bail, Result};
use std::sync::Arc;
use tracing::info;

use super::report::SESSION_EXPIRED;
use super::AppContext;
use crate::display::{DashboardManager, DashboardOutcome};
use crate::live::{AnalyticsFeed, AnalyticsSource, RefreshIntervals};

pub async fn run_live_mode(ctx: &AppContext) -> Result<()> {
    ctx.require_dashboard()?;

    let intervals = RefreshIntervals::from(&ctx.config.refresh);
    info!(
        analytics_secs = intervals.analytics.as_secs(),
        last_updated_secs = intervals.last_updated.as_secs(),
        "Starting live dashboard"
    );

    let source: Arc<dyn AnalyticsSource> = Arc::new(ctx.api.clone());
    let feed = AnalyticsFeed::spawn(source, intervals);

    let outcome = {
        let mut manager = DashboardManager::new(feed, ctx.router.subscribe(), ctx.auth.current_user())?;
        manager.run().await?
    };

    info!(?outcome, "Live dashboard stopped");
    match outcome {
        DashboardOutcome::Quit => Ok(()),
        DashboardOutcome::SessionEnded => bail!(SESSION_EXPIRED),
    }
}
