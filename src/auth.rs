//! Login, logout and account maintenance flows
//!
//! Validation happens before any network call; backend failures are turned into the
//! messages the user sees.

use thiserror::Error;
use tracing::{info, warn};

use crate::api::{ApiClient, ApiError};
use crate::models::{AccountUpdate, LoginRequest, User};
use crate::router::Route;

pub const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Error, Debug)]
pub enum AuthError {
    /// Rejected locally, nothing was sent
    #[error("{0}")]
    Validation(String),

    /// The server refused or the request failed
    #[error("{message}")]
    Request {
        message: String,
        #[source]
        source: ApiError,
    },
}

impl AuthError {
    pub fn is_validation(&self) -> bool {
        matches!(self, AuthError::Validation(_))
    }
}

/// Raw account settings form, as typed by the user
#[derive(Debug, Clone, Default)]
pub struct AccountForm {
    pub username: String,
    pub full_name: String,
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl AccountForm {
    /// Form pre-filled from the cached profile
    pub fn for_user(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            full_name: user.full_name.clone().unwrap_or_default(),
            ..Default::default()
        }
    }

    /// Check the form and build the request body
    pub fn validate(&self) -> Result<AccountUpdate, AuthError> {
        let username = self.username.trim();
        if username.is_empty() {
            return Err(AuthError::Validation("Username is required".to_string()));
        }

        let changing_password = !self.new_password.is_empty();
        if changing_password && self.current_password.is_empty() {
            return Err(AuthError::Validation(
                "Current password is required to set a new password".to_string(),
            ));
        }
        if changing_password && self.new_password != self.confirm_password {
            return Err(AuthError::Validation("New passwords do not match".to_string()));
        }
        if changing_password && self.new_password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::Validation(format!(
                "New password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }

        let full_name = self.full_name.trim();
        Ok(AccountUpdate {
            username: Some(username.to_string()),
            full_name: (!full_name.is_empty()).then(|| full_name.to_string()),
            current_password: (!self.current_password.is_empty()).then(|| self.current_password.clone()),
            new_password: changing_password.then(|| self.new_password.clone()),
        })
    }
}

/// User-facing message for a failed account update
pub fn account_update_message(err: &ApiError) -> String {
    match err.status() {
        Some(401) => "Current password is incorrect".to_string(),
        Some(409) => "Username is already taken".to_string(),
        _ => match err.server_message() {
            Some(message) => message.to_string(),
            None => "Failed to update account".to_string(),
        },
    }
}

#[derive(Clone)]
pub struct AuthService {
    api: ApiClient,
}

impl AuthService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn current_user(&self) -> Option<User> {
        self.api.session().get_user()
    }

    pub fn is_authenticated(&self) -> bool {
        self.api.session().is_authenticated()
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<User, AuthError> {
        if username.trim().is_empty() {
            return Err(AuthError::Validation("Username is required".to_string()));
        }
        if password.trim().is_empty() {
            return Err(AuthError::Validation("Password is required".to_string()));
        }

        info!(username, "Attempting login");
        let credentials = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };

        let response = self.api.login(&credentials).await.map_err(|source| {
            warn!(error = %source, "Login failed");
            AuthError::Request {
                message: source.message_or("Login failed"),
                source,
            }
        })?;

        let session = self.api.session();
        session.set_token(&response.access_token);
        session.set_user(&response.user);
        self.api.router().navigate(Route::Dashboard);

        info!(user_id = response.user.id, "Login successful");
        Ok(response.user)
    }

    pub fn logout(&self) {
        self.api.session().remove_token();
        self.api.router().navigate(Route::Login);
        info!("Logged out");
    }

    pub async fn update_account(&self, form: &AccountForm) -> Result<User, AuthError> {
        let update = form.validate()?;

        info!(
            has_current_password = update.current_password.is_some(),
            has_new_password = update.new_password.is_some(),
            "Updating account"
        );

        let response = self.api.update_account(&update).await.map_err(|source| {
            warn!(error = %source, "Account update failed");
            AuthError::Request {
                message: account_update_message(&source),
                source,
            }
        })?;

        self.api.session().set_user(&response.user);
        Ok(response.user)
    }
}
