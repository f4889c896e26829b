//! PIMS Dashboard Library
//!
//! Terminal client for the PIMS (Pharmacy Inventory Management System) analytics API.
//! It signs a user in, keeps the bearer token in a local session, and presents the
//! latest analytics snapshot either as a one-shot report or as a live dashboard that
//! refreshes itself in the background.
//!
//! ## Architecture Overview
//!
//! - [`models`] - Wire types for the auth and analytics endpoints
//! - [`metrics`] - Parses loosely typed metric values into card text
//! - [`session`] - Token and user persistence behind a pluggable storage backend
//! - [`router`] - Login/dashboard views and the authentication guard
//! - [`api`] - HTTP client with bearer auth and the 401 session rule
//! - [`auth`] - Login, logout and account update flows with local validation
//! - [`live`] - Refresh scheduler publishing analytics state over watch channels
//! - [`display`] - Text/JSON reports and the ratatui dashboard
//! - [`commands`] - CLI subcommands
//! - [`config`] - TOML configuration with environment overrides
//! - [`logging`] - tracing setup for console and rolling files
//!
//! ## Example
//!
//! ```rust,no_run
//! use pims_dashboard::{commands::AppContext, config::Config, session::SessionStore};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::load()?;
//! let session = SessionStore::file(config.paths.session_file());
//! let ctx = AppContext::new(config, session)?;
//!
//! ctx.auth.login("pharmacist", "secret").await?;
//! let snapshot = ctx.api.get_analytics().await?;
//! println!("{} metrics", snapshot.analytics.metrics.len());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod commands;
pub mod config;
pub mod display;
pub mod live;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod router;
pub mod session;
pub mod timestamp_parser;

pub use models::*;
