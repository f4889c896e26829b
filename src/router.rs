//! View routing and the authentication guard
//!
//! The dashboard has two views. [`Router`] holds the current one in a watch channel so
//! the live display notices forced navigation (for example a 401 clearing the session).

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

use crate::session::SessionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    Login,
    Dashboard,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Login => write!(f, "/login"),
            Route::Dashboard => write!(f, "/"),
        }
    }
}

/// Resolve where a request for `requested` should land.
///
/// Unauthenticated users only ever see the login view; authenticated users asking
/// for the login view are sent to the dashboard.
pub fn guard(requested: Route, authenticated: bool) -> Route {
    match (requested, authenticated) {
        (Route::Login, true) => Route::Dashboard,
        (_, false) => Route::Login,
        (route, true) => route,
    }
}

#[derive(Debug, Clone)]
pub struct Router {
    current: Arc<watch::Sender<Route>>,
}

impl Router {
    pub fn new(initial: Route) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { current: Arc::new(tx) }
    }

    pub fn current(&self) -> Route {
        *self.current.borrow()
    }

    pub fn navigate(&self, route: Route) {
        let previous = self.current.send_replace(route);
        if previous != route {
            info!(from = %previous, to = %route, "Navigating");
        }
    }

    /// Apply the guard for `requested` against the session and navigate to the result
    pub fn resolve(&self, requested: Route, session: &SessionStore) -> Route {
        let route = guard(requested, session.is_authenticated());
        self.navigate(route);
        route
    }

    pub fn subscribe(&self) -> watch::Receiver<Route> {
        self.current.subscribe()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new(Route::Login)
    }
}
