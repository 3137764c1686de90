use std::fmt;

use reqwest::StatusCode;
use serde_json::Value;

/// Status reported for requests that never reached the network because the URL was unusable.
pub const INVALID_URL_STATUS: u16 = 400;
pub const INVALID_URL_MESSAGE: &str = "Invalid request URL";
pub const INVALID_BODY_STATUS: u16 = 400;
/// Status reported for transport-level failures (DNS, refused connection, reset).
pub const TRANSPORT_STATUS: u16 = 0;
pub const TRANSPORT_MESSAGE: &str = "Network error: unable to reach the server";

/// Errors raised while setting up a client or loading its configuration.
#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Json(serde_json::Error),
    Http(reqwest::Error),
    Config(String),
    Secret(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "io error: {err}"),
            Error::Json(err) => write!(f, "json error: {err}"),
            Error::Http(err) => write!(f, "http client error: {err}"),
            Error::Config(msg) => write!(f, "configuration error: {msg}"),
            Error::Secret(msg) => write!(f, "secret error: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Http(err)
    }
}

/// Where a normalized error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidUrl,
    InvalidBody,
    Transport,
    Unauthorized,
    Forbidden,
    Http,
}

/// The single error shape returned by every request operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub status: u16,
    pub message: String,
    pub data: Option<Value>,
    kind: ErrorKind,
}

impl ApiError {
    pub fn invalid_url() -> Self {
        Self {
            status: INVALID_URL_STATUS,
            message: INVALID_URL_MESSAGE.to_string(),
            data: None,
            kind: ErrorKind::InvalidUrl,
        }
    }

    pub fn invalid_body(reason: impl fmt::Display) -> Self {
        Self {
            status: INVALID_BODY_STATUS,
            message: format!("Request body could not be serialized: {reason}"),
            data: None,
            kind: ErrorKind::InvalidBody,
        }
    }

    pub fn transport() -> Self {
        Self {
            status: TRANSPORT_STATUS,
            message: TRANSPORT_MESSAGE.to_string(),
            data: None,
            kind: ErrorKind::Transport,
        }
    }

    /// Builds the error for a non-2xx response, preferring a server-provided `message` field.
    pub fn from_response(status: StatusCode, data: Option<Value>) -> Self {
        let message = data
            .as_ref()
            .and_then(|body| body.get("message"))
            .and_then(Value::as_str)
            .filter(|msg| !msg.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| {
                format!(
                    "Error {}: {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown Status")
                )
            });
        let kind = match status.as_u16() {
            401 => ErrorKind::Unauthorized,
            403 => ErrorKind::Forbidden,
            _ => ErrorKind::Http,
        };
        Self {
            status: status.as_u16(),
            message,
            data,
            kind,
        }
    }

    /// A 2xx response whose body did not have the expected shape.
    pub fn unexpected_body(status: StatusCode, reason: impl fmt::Display) -> Self {
        Self {
            status: status.as_u16(),
            message: format!("Unexpected response body: {reason}"),
            data: None,
            kind: ErrorKind::Http,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind == ErrorKind::Unauthorized
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (status {})", self.message, self.status)
    }
}

impl std::error::Error for ApiError {}
