use reqwest::{Method, StatusCode};
use tracing::{debug, info, warn};

use crate::{
    ApiClient,
    client::response::read_body,
    errors::ApiError,
    request_context::PreparedRequest,
    telemetry::refresh::{RefreshOutcome, RefreshTelemetry},
    types::{AuthResponse, Credentials, SessionCredentials, SessionEvent},
};

impl ApiClient {
    /// Refreshes the access token, sharing the attempt with every concurrent
    /// caller. Returns whether the session now holds a refreshed token.
    pub async fn coordinated_refresh(&self) -> bool {
        let client = self.clone();
        self.inner
            .refresh
            .run(move || async move { client.refresh_session().await })
            .await
    }

    /// Called after a 401 on a request sent with `sent_token`. True when the
    /// request should be retried with the session's current token.
    pub(super) async fn recover_session(&self, sent_token: &str) -> bool {
        match self.inner.session.access_token() {
            Some(current) if current != sent_token => {
                debug!("session token changed since the request was sent; retrying without refresh");
                true
            }
            Some(_) => self.coordinated_refresh().await,
            None => false,
        }
    }

    pub(super) async fn refresh_if_expiring(&self) {
        let Some(policy) = self.inner.policy.as_ref() else {
            return;
        };
        if self.inner.session.is_expiring_soon(policy.window()) {
            debug!(
                window_secs = policy.window().as_secs(),
                "access token close to expiry; refreshing before request"
            );
            if !self.coordinated_refresh().await {
                warn!("proactive refresh failed; sending with the current token");
            }
        }
    }

    async fn refresh_session(&self) -> bool {
        let telemetry = RefreshTelemetry::new("session.refresh");
        telemetry.emit_start();

        let request = match self
            .resolve(&self.inner.config.refresh_path)
            .and_then(|url| PreparedRequest::new(Method::POST, url, None))
        {
            Ok(request) => request.with_csrf(self.csrf_header(None).await),
            Err(err) => {
                telemetry.emit_failure(RefreshOutcome::Failed, &err);
                return false;
            }
        };

        let token = self.inner.session.access_token();
        let response = match self.send(&request, token.as_deref()).await {
            Ok(response) => response,
            Err(err) => {
                telemetry.emit_failure(RefreshOutcome::Failed, &err);
                return false;
            }
        };

        let status = response.status();
        let body = read_body(response).await;
        if !status.is_success() {
            let err = ApiError::from_response(status, body.into_value());
            telemetry.emit_failure(RefreshOutcome::Rejected, &err);
            return false;
        }

        match body.into_json::<AuthResponse>() {
            Ok(auth) => {
                let user_id = auth
                    .user_id
                    .or_else(|| self.inner.session.user_id())
                    .unwrap_or_default();
                self.inner.session.set_session(&auth.access_token, &user_id);
                telemetry.emit_success();
                let _ = self.inner.events.send(SessionEvent::Refreshed {
                    user_id: Some(user_id),
                });
                true
            }
            Err(err) => {
                telemetry.emit_failure(
                    RefreshOutcome::Failed,
                    &ApiError::unexpected_body(status, err),
                );
                false
            }
        }
    }

    /// Authenticates and stores the issued credentials in the session.
    pub async fn login(&self, credentials: &Credentials) -> Result<SessionCredentials, ApiError> {
        let url = self.resolve(&self.inner.config.login_path)?;
        let body = serde_json::to_value(credentials).map_err(ApiError::invalid_body)?;
        let csrf = self.csrf_header(None).await;
        let request = PreparedRequest::new(Method::POST, url, Some(&body))?.with_csrf(csrf);

        let response = self.send(&request, None).await?;
        let auth = self
            .finish(&request, response, false)
            .await?
            .into_json::<AuthResponse>()
            .map_err(|e| ApiError::unexpected_body(StatusCode::OK, e))?;

        let session = SessionCredentials {
            access_token: auth.access_token,
            user_id: auth.user_id.unwrap_or_default(),
            client_id: auth.client_id,
        };
        self.inner
            .session
            .set_session(&session.access_token, &session.user_id);
        self.inner
            .session
            .set_client_id(session.client_id.as_deref());
        info!(user_id = %session.user_id, "login succeeded");
        Ok(session)
    }

    /// Tells the server the session is over, then clears it locally whatever
    /// the server answered.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let result = self.notify_logout().await;
        if let Err(err) = &result {
            warn!(status = err.status, error = %err, "logout request failed; clearing session anyway");
        }
        if self.inner.session.clear() {
            info!("logged out");
        }
        result
    }

    async fn notify_logout(&self) -> Result<(), ApiError> {
        let url = self.resolve(&self.inner.config.logout_path)?;
        let csrf = self.csrf_header(None).await;
        let request = PreparedRequest::new(Method::POST, url, None)?.with_csrf(csrf);
        let token = self.inner.session.access_token();
        let response = self.send(&request, token.as_deref()).await?;

        let status = response.status();
        let body = read_body(response).await;
        if status.is_success() {
            Ok(())
        } else {
            Err(ApiError::from_response(status, body.into_value()))
        }
    }
}
