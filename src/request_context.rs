use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Url};
use serde_json::Value;
use tracing::warn;

use crate::errors::ApiError;

pub const X_REQUESTED_WITH: HeaderName = HeaderName::from_static("x-requested-with");
const XHR_MARKER: HeaderValue = HeaderValue::from_static("XMLHttpRequest");
const JSON: HeaderValue = HeaderValue::from_static("application/json");

/// Joins `path` onto `base` and checks the result is an absolute http(s) URL.
pub fn resolve_url(base: &str, path: &str) -> Result<Url, ApiError> {
    let raw = if path.starts_with('/') {
        format!("{}{}", base.trim_end_matches('/'), path)
    } else {
        format!("{base}{path}")
    };
    match Url::parse(&raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Ok(url),
        Ok(url) => {
            warn!(url = %url, "rejecting request: only absolute http(s) URLs are allowed");
            Err(ApiError::invalid_url())
        }
        Err(err) => {
            warn!(url = %raw, error = %err, "rejecting request: malformed URL");
            Err(ApiError::invalid_url())
        }
    }
}

/// Verbs that change server state and therefore carry a CSRF header.
pub fn is_mutating(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::DELETE | Method::PATCH
    )
}

pub fn carries_body(method: &Method) -> bool {
    !matches!(*method, Method::GET | Method::HEAD)
}

/// Everything about one logical request that stays fixed across the retry
/// after a token refresh. Authorization is applied per send.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    method: Method,
    url: Url,
    body: Option<Vec<u8>>,
    csrf: Option<(HeaderName, HeaderValue)>,
}

impl PreparedRequest {
    /// Serializes `body` unless the verb never carries one.
    pub fn new(method: Method, url: Url, body: Option<&Value>) -> Result<Self, ApiError> {
        let body = match body {
            Some(value) if carries_body(&method) => {
                Some(serde_json::to_vec(value).map_err(ApiError::invalid_body)?)
            }
            _ => None,
        };
        Ok(Self {
            method,
            url,
            body,
            csrf: None,
        })
    }

    pub fn with_csrf(mut self, csrf: Option<(HeaderName, HeaderValue)>) -> Self {
        self.csrf = csrf;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    pub fn has_csrf(&self) -> bool {
        self.csrf.is_some()
    }

    /// Headers for one send. The client scope is only sent alongside a token.
    pub fn headers(
        &self,
        token: Option<&str>,
        client_scope: Option<(&HeaderName, &str)>,
    ) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, JSON);
        headers.insert(X_REQUESTED_WITH, XHR_MARKER);

        if let Some(token) = token {
            match HeaderValue::from_str(&format!("Bearer {token}")) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    headers.insert(AUTHORIZATION, value);
                }
                Err(_) => warn!("access token is not a valid header value; sending without it"),
            }
            if let Some((name, client_id)) = client_scope {
                match HeaderValue::from_str(client_id) {
                    Ok(value) => {
                        headers.insert(name.clone(), value);
                    }
                    Err(_) => warn!(header = %name, "client id is not a valid header value"),
                }
            }
        }

        if let Some((name, value)) = &self.csrf {
            headers.insert(name.clone(), value.clone());
        }
        headers
    }
}
