use reqwest::Method;
use reqwest::header::{HeaderName, HeaderValue};
use tracing::{debug, warn};

use crate::{
    ApiClient,
    client::response::read_body,
    errors::ApiError,
    request_context::PreparedRequest,
    types::CsrfToken,
};

impl ApiClient {
    /// Fetches a fresh CSRF token from the provider endpoint.
    ///
    /// Callers that issue several mutations can fetch once and pass the token
    /// to each call; otherwise every mutating request fetches its own.
    pub async fn fetch_csrf_token(&self) -> Result<CsrfToken, ApiError> {
        let url = self.resolve(&self.inner.config.csrf_path)?;
        let request = PreparedRequest::new(Method::GET, url, None)?;
        let token = self.inner.session.access_token();
        let response = self.send(&request, token.as_deref()).await?;

        let status = response.status();
        let body = read_body(response).await;
        if !status.is_success() {
            return Err(ApiError::from_response(status, body.into_value()));
        }
        body.into_json::<CsrfToken>()
            .map_err(|e| ApiError::unexpected_body(status, e))
    }

    /// Header to attach to a mutating request. A supplied token goes under
    /// the configured default name; otherwise the provider decides the name.
    /// Any failure leaves the header off and the request still goes out.
    pub(super) async fn csrf_header(
        &self,
        supplied: Option<String>,
    ) -> Option<(HeaderName, HeaderValue)> {
        if let Some(token) = supplied {
            return match HeaderValue::from_str(&token) {
                Ok(value) => Some((self.inner.csrf_header.clone(), value)),
                Err(_) => {
                    warn!("supplied csrf token is not a valid header value; sending without csrf header");
                    None
                }
            };
        }

        let csrf = match self.fetch_csrf_token().await {
            Ok(csrf) => csrf,
            Err(err) => {
                warn!(
                    status = err.status,
                    error = %err,
                    "csrf token fetch failed; sending without csrf header"
                );
                return None;
            }
        };
        match (
            HeaderName::from_bytes(csrf.header_name.as_bytes()),
            HeaderValue::from_str(&csrf.token),
        ) {
            (Ok(name), Ok(value)) => {
                debug!(header = %name, "csrf token fetched");
                Some((name, value))
            }
            _ => {
                warn!(
                    header = %csrf.header_name,
                    "csrf provider returned an unusable header; sending without csrf header"
                );
                None
            }
        }
    }
}
