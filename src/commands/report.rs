//! One-shot analytics commands: `report` and `last-updated`

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use colored::Colorize;
use tracing::info;

use super::AppContext;
use crate::api::ApiError;
use crate::display::{render_json, ReportRenderer};
use crate::live::FETCH_ERROR_FALLBACK;
use crate::timestamp_parser::{format_relative_time, TimestampParser};

pub const SESSION_EXPIRED: &str = "Session expired. Log in again with `pims-dashboard login`";

/// User-facing error for a failed fetch
pub fn fetch_error(err: ApiError) -> anyhow::Error {
    if err.status() == Some(401) {
        return anyhow!(SESSION_EXPIRED);
    }
    if let Some(message) = err.server_message() {
        return anyhow!(message.to_string());
    }
    anyhow::Error::new(err).context(FETCH_ERROR_FALLBACK)
}

pub async fn run_report(ctx: &AppContext, json: bool) -> Result<()> {
    ctx.require_dashboard()?;

    let snapshot = ctx.api.get_analytics().await.map_err(fetch_error)?;
    info!(pharmacy_id = %snapshot.pharmacy_id, json, "Rendering analytics report");

    if json {
        println!("{}", render_json(&snapshot, ctx.config.output.json_pretty)?);
    } else {
        print!("{}", ReportRenderer::new().render(&snapshot, Utc::now()));
    }
    Ok(())
}

pub async fn run_last_updated(ctx: &AppContext, json: bool) -> Result<()> {
    ctx.require_dashboard()?;

    let stamp = ctx.api.get_last_updated().await.map_err(fetch_error)?;

    if json {
        let output = if ctx.config.output.json_pretty {
            serde_json::to_string_pretty(&stamp)
        } else {
            serde_json::to_string(&stamp)
        };
        println!("{}", output.context("Failed to serialize last-updated stamp")?);
        return Ok(());
    }

    match stamp.last_updated_at.as_deref() {
        Some(raw) => match TimestampParser::parse_opt(raw) {
            Some(ts) => println!(
                "Last updated: {} ({})",
                format_relative_time(ts, Utc::now()).bright_yellow(),
                ts.format(&ctx.config.output.timestamp_format)
            ),
            None => println!("Last updated: {}", raw),
        },
        None => println!("{}", "No analytics uploaded yet".dimmed()),
    }
    Ok(())
}
