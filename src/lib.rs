//! Authenticated HTTP client for the business-management dashboard API.
//!
//! Every request carries the session's bearer token, mutating requests carry
//! a CSRF token, and a 401 triggers one coordinated token refresh followed by
//! a single retry. Failures of any origin come back as [`ApiError`].

mod client;
pub mod config;
pub mod errors;
mod request_context;
pub mod session;
pub mod telemetry;
pub mod token;
mod types;

pub use client::ApiClient;
pub use config::Config;
pub use errors::{ApiError, Error, ErrorKind};
pub use session::{FileSession, InMemorySession, SessionStore};
pub use types::{Credentials, CsrfToken, ResponseBody, SessionCredentials, SessionEvent};
