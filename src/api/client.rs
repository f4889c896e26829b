//! PIMS REST API client
//!
//! Every request carries the bearer token from the [`SessionStore`] when one is
//! present. Every 401 response clears the session and forces the router back to the
//! login view, except on the login and account-update endpoints, where a 401 means
//! "wrong credentials" and is reported in place.

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::transport::{HttpRequest, HttpTransport, ReqwestTransport};
use super::{extract_error_message, ApiError};
use crate::config::ApiConfig;
use crate::models::{
    AccountUpdate, AccountUpdateResponse, AnalyticsSnapshot, LastUpdated, LoginRequest, LoginResponse,
};
use crate::router::{Route, Router};
use crate::session::SessionStore;

pub const LOGIN_PATH: &str = "/auth/login";
pub const ACCOUNT_PATH: &str = "/auth/account";
pub const ANALYTICS_LATEST_PATH: &str = "/api/pharmacy/analytics/latest";
pub const ANALYTICS_LAST_UPDATED_PATH: &str = "/api/pharmacy/analytics/last-updated";

/// Endpoints whose 401 responses are shown in place instead of ending the session
const SESSION_PRESERVING_PATHS: &[&str] = &[LOGIN_PATH, ACCOUNT_PATH];

/// True when a 401 on `path` should clear the session and redirect to login
pub fn unauthorized_ends_session(path: &str) -> bool {
    !SESSION_PRESERVING_PATHS.iter().any(|p| path.contains(p))
}

#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn HttpTransport>,
    session: SessionStore,
    router: Router,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn HttpTransport>, session: SessionStore, router: Router) -> Self {
        Self {
            transport,
            session,
            router,
        }
    }

    /// Client talking to the configured API over HTTP
    pub fn from_config(config: &ApiConfig, session: SessionStore, router: Router) -> Result<Self, ApiError> {
        let transport = ReqwestTransport::new(&config.base_url, config.timeout())?;
        info!(base_url = %transport.base_url(), "API client ready");
        Ok(Self::new(Arc::new(transport), session, router))
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    async fn request<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];
        if let Some(token) = self.session.get_token() {
            headers.push(("Authorization".to_string(), format!("Bearer {}", token)));
        }

        let body = body.map(serde_json::to_value).transpose()?;
        let request = HttpRequest {
            method,
            path: path.to_string(),
            headers,
            body,
        };

        let response = self.transport.send(request).await?;

        if response.status == 401 && unauthorized_ends_session(path) {
            warn!(path, "Session rejected by server, returning to login");
            self.session.remove_token();
            self.router.navigate(Route::Login);
        }

        if !response.is_success() {
            let message = extract_error_message(&response.body);
            debug!(path, status = response.status, message = ?message, "Request failed");
            return Err(ApiError::Http {
                status: response.status,
                message,
            });
        }

        Ok(serde_json::from_slice(&response.body)?)
    }

    pub async fn login(&self, credentials: &LoginRequest) -> Result<LoginResponse, ApiError> {
        self.request(Method::POST, LOGIN_PATH, Some(credentials)).await
    }

    pub async fn update_account(&self, update: &AccountUpdate) -> Result<AccountUpdateResponse, ApiError> {
        self.request(Method::PATCH, ACCOUNT_PATH, Some(update)).await
    }

    pub async fn get_analytics(&self) -> Result<AnalyticsSnapshot, ApiError> {
        self.request::<(), _>(Method::GET, ANALYTICS_LATEST_PATH, None).await
    }

    pub async fn get_last_updated(&self) -> Result<LastUpdated, ApiError> {
        self.request::<(), _>(Method::GET, ANALYTICS_LAST_UPDATED_PATH, None).await
    }
}
