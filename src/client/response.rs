use reqwest::header::CONTENT_TYPE;
use tracing::{debug, info, warn};

use crate::{
    ApiClient, errors::ApiError, request_context::PreparedRequest, types::ResponseBody,
    types::SessionEvent,
};

fn is_json_content_type(value: &str) -> bool {
    let mime = value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "application/json" || mime.ends_with("+json")
}

/// Reads the body according to its declared content type. A body that cannot
/// be read or parsed is reported as [`ResponseBody::Empty`].
pub(crate) async fn read_body(response: reqwest::Response) -> ResponseBody {
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(is_json_content_type);
    let bytes = match response.bytes().await {
        Ok(bytes) => bytes,
        Err(err) => {
            debug!(error = %err, "response body could not be read");
            return ResponseBody::Empty;
        }
    };
    if bytes.is_empty() {
        return ResponseBody::Empty;
    }
    if is_json {
        match serde_json::from_slice(&bytes) {
            Ok(value) => ResponseBody::Json(value),
            Err(err) => {
                debug!(error = %err, "response declared json but did not parse");
                ResponseBody::Empty
            }
        }
    } else {
        ResponseBody::Text(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl ApiClient {
    /// Turns the final response of a logical request into its result.
    pub(super) async fn finish(
        &self,
        request: &PreparedRequest,
        response: reqwest::Response,
        had_token: bool,
    ) -> Result<ResponseBody, ApiError> {
        let status = response.status();
        let body = read_body(response).await;
        if status.is_success() {
            return Ok(body);
        }

        let err = ApiError::from_response(status, body.into_value());
        match status.as_u16() {
            401 if had_token => {
                warn!(
                    method = %request.method(),
                    url = %request.url(),
                    status = 401,
                    "authentication failed (401); ending session"
                );
                self.end_session();
            }
            403 => {
                warn!(
                    method = %request.method(),
                    url = %request.url(),
                    status = 403,
                    "request forbidden (403): csrf token rejected or insufficient permissions"
                );
            }
            _ => {
                debug!(
                    method = %request.method(),
                    url = %request.url(),
                    status = status.as_u16(),
                    message = %err.message,
                    "request failed"
                );
            }
        }
        Err(err)
    }

    /// Clears the session and, if there was one, tells subscribers to go to the login page.
    pub(super) fn end_session(&self) {
        if self.inner.session.clear() {
            let redirect_to = self.inner.config.login_page.clone();
            info!(redirect_to = %redirect_to, "session cleared; login required");
            let _ = self
                .inner
                .events
                .send(SessionEvent::LoginRequired { redirect_to });
        }
    }
}
