//! HTTP access to the PIMS backend
//!
//! - [`ApiClient`] - typed endpoints plus the bearer-token and 401 rules
//! - [`HttpTransport`] - byte-level transport, [`ReqwestTransport`] in production
//! - [`ApiError`] - error taxonomy with backend message extraction

pub mod client;
pub mod error;
pub mod transport;

pub use client::*;
pub use error::*;
pub use transport::*;
