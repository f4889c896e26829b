//! Command module for the PIMS dashboard CLI
//!
//! Each subcommand lives in its own module and receives an [`AppContext`] holding
//! the session, router and API client wired together for this run.

pub mod auth;
#[cfg(feature = "live")]
pub mod live;
pub mod report;

pub use auth::{run_account, run_login, run_logout, run_whoami, AccountArgs};
#[cfg(feature = "live")]
pub use live::run_live_mode;
pub use report::{run_last_updated, run_report};

use anyhow::{bail, Context, Result};
use tracing::debug;

use crate::api::ApiClient;
use crate::auth::AuthService;
use crate::config::Config;
use crate::router::{guard, Route, Router};
use crate::session::SessionStore;

pub const NOT_LOGGED_IN: &str = "Not logged in. Run `pims-dashboard login --username <name>` first";

/// Everything a command needs, built once per run
#[derive(Clone)]
pub struct AppContext {
    pub config: Config,
    pub session: SessionStore,
    pub router: Router,
    pub api: ApiClient,
    pub auth: AuthService,
}

impl AppContext {
    /// Wire a context that talks to the configured API
    pub fn new(config: Config, session: SessionStore) -> Result<Self> {
        let router = Router::new(guard(Route::Dashboard, session.is_authenticated()));
        let api = ApiClient::from_config(&config.api, session.clone(), router.clone())
            .context("Failed to create API client")?;
        Ok(Self::with_client(config, api))
    }

    /// Wire a context around an existing client, sharing its session and router
    pub fn with_client(config: Config, api: ApiClient) -> Self {
        Self {
            session: api.session().clone(),
            router: api.router().clone(),
            auth: AuthService::new(api.clone()),
            config,
            api,
        }
    }

    /// Guard for commands that show analytics
    pub fn require_dashboard(&self) -> Result<()> {
        let route = self.router.resolve(Route::Dashboard, &self.session);
        debug!(%route, "Resolved dashboard route");
        if route != Route::Dashboard {
            bail!(NOT_LOGGED_IN);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_dashboard_follows_session() {
        let session = SessionStore::in_memory();
        let ctx = AppContext::new(Config::default(), session.clone()).unwrap();
        assert_eq!(ctx.require_dashboard().unwrap_err().to_string(), NOT_LOGGED_IN);
        assert_eq!(ctx.router.current(), Route::Login);

        session.set_token("token");
        assert!(ctx.require_dashboard().is_ok());
        assert_eq!(ctx.router.current(), Route::Dashboard);
    }
}
