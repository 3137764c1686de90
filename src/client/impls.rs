use std::sync::Arc;

use reqwest::header::HeaderName;
use reqwest::{Method, StatusCode, Url};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::{
    ApiClient,
    client::{ClientInner, EVENT_CAPACITY},
    config::Config,
    errors::{ApiError, Error},
    request_context::{PreparedRequest, is_mutating, resolve_url},
    session::SessionStore,
    token::RefreshCoordinator,
    types::{ResponseBody, SessionEvent},
};

impl ApiClient {
    /// Create a new ApiClient
    /// # Arguments
    /// * `config` - Explicit configuration (`Config`), typically loaded via `Config::from_file` or `Config::from_env`.
    /// * `session` - Store holding the access token, user id and client id.
    ///
    /// The base URL is not checked here: a malformed base surfaces as an
    /// invalid-URL [`ApiError`] on every request instead.
    pub fn new(config: Config, session: Arc<dyn SessionStore>) -> Result<Self, Error> {
        let csrf_header = parse_header_name("csrf_header", &config.csrf_header)?;
        let client_id_header = parse_header_name("client_id_header", &config.client_id_header)?;
        let policy = config.refresh_policy()?;

        let mut builder = reqwest::Client::builder()
            .cookie_store(true)
            .user_agent(config.user_agent.clone());
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self {
            inner: Arc::new(ClientInner {
                http,
                config,
                csrf_header,
                client_id_header,
                session,
                refresh: RefreshCoordinator::new(),
                policy,
                events,
            }),
        })
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn session(&self) -> Arc<dyn SessionStore> {
        Arc::clone(&self.inner.session)
    }

    /// Session events: refreshes, and the signal to navigate to the login page.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    pub async fn get(&self, path: &str) -> Result<ResponseBody, ApiError> {
        self.request(Method::GET, path, None, None).await
    }

    pub async fn head(&self, path: &str) -> Result<ResponseBody, ApiError> {
        self.request(Method::HEAD, path, None, None).await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: Option<&B>,
        csrf_token: Option<&str>,
    ) -> Result<ResponseBody, ApiError> {
        self.send_with_body(Method::POST, path, body, csrf_token)
            .await
    }

    pub async fn put<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: Option<&B>,
        csrf_token: Option<&str>,
    ) -> Result<ResponseBody, ApiError> {
        self.send_with_body(Method::PUT, path, body, csrf_token)
            .await
    }

    pub async fn delete<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: Option<&B>,
        csrf_token: Option<&str>,
    ) -> Result<ResponseBody, ApiError> {
        self.send_with_body(Method::DELETE, path, body, csrf_token)
            .await
    }

    async fn send_with_body<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        csrf_token: Option<&str>,
    ) -> Result<ResponseBody, ApiError> {
        let body = body
            .map(serde_json::to_value)
            .transpose()
            .map_err(ApiError::invalid_body)?;
        self.request(method, path, body, csrf_token.map(str::to_string))
            .await
    }

    /// Performs one logical request: CSRF for mutating verbs, one coordinated
    /// refresh and retry after a 401, and a normalized error for anything
    /// that does not end in a 2xx.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        csrf_token: Option<String>,
    ) -> Result<ResponseBody, ApiError> {
        let url = self.resolve(path)?;
        self.refresh_if_expiring().await;

        let csrf = if is_mutating(&method) {
            self.csrf_header(csrf_token).await
        } else {
            None
        };
        let request = PreparedRequest::new(method, url, body.as_ref())?.with_csrf(csrf);

        let sent_token = self.inner.session.access_token();
        debug!(
            method = %request.method(),
            url = %request.url(),
            authenticated = sent_token.is_some(),
            csrf = request.has_csrf(),
            "dispatching request"
        );
        let mut response = self.send(&request, sent_token.as_deref()).await?;

        if response.status() == StatusCode::UNAUTHORIZED
            && let Some(sent) = sent_token.as_deref()
        {
            warn!(
                method = %request.method(),
                url = %request.url(),
                status = 401,
                "request unauthorized (401); refreshing session"
            );
            if self.recover_session(sent).await {
                let token = self.inner.session.access_token();
                response = self.send(&request, token.as_deref()).await?;
            }
        }

        self.finish(&request, response, sent_token.is_some()).await
    }

    pub(super) fn resolve(&self, path: &str) -> Result<Url, ApiError> {
        resolve_url(&self.inner.config.base_url, path)
    }

    pub(super) async fn send(
        &self,
        request: &PreparedRequest,
        token: Option<&str>,
    ) -> Result<reqwest::Response, ApiError> {
        let client_id = self.inner.session.client_id();
        let headers = request.headers(
            token,
            client_id
                .as_deref()
                .map(|id| (&self.inner.client_id_header, id)),
        );
        let mut builder = self
            .inner
            .http
            .request(request.method().clone(), request.url().clone())
            .headers(headers);
        if let Some(body) = request.body() {
            builder = builder.body(body.to_vec());
        }
        builder.send().await.map_err(|err| {
            warn!(
                method = %request.method(),
                url = %request.url(),
                error = %err,
                "request failed before a response was received"
            );
            ApiError::transport()
        })
    }
}

fn parse_header_name(field: &str, value: &str) -> Result<HeaderName, Error> {
    HeaderName::from_bytes(value.as_bytes())
        .map_err(|e| Error::Config(format!("Invalid {field} '{value}': {e}")))
}
