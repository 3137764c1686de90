#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dashboard_api_client::{ApiClient, Config, InMemorySession, SessionStore};
use jiff::Timestamp;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// In-memory session that counts effective teardowns.
#[derive(Default)]
pub struct CountingSession {
    inner: InMemorySession,
    teardowns: AtomicUsize,
}

impl CountingSession {
    pub fn with_token(token: &str) -> Arc<Self> {
        let session = Self::default();
        session.inner.set_session(token, "user-1");
        Arc::new(session)
    }

    pub fn teardowns(&self) -> usize {
        self.teardowns.load(Ordering::SeqCst)
    }
}

impl SessionStore for CountingSession {
    fn access_token(&self) -> Option<String> {
        self.inner.access_token()
    }

    fn user_id(&self) -> Option<String> {
        self.inner.user_id()
    }

    fn client_id(&self) -> Option<String> {
        self.inner.client_id()
    }

    fn set_session(&self, token: &str, user_id: &str) {
        self.inner.set_session(token, user_id)
    }

    fn set_client_id(&self, client_id: Option<&str>) {
        self.inner.set_client_id(client_id)
    }

    fn clear(&self) -> bool {
        let cleared = self.inner.clear();
        if cleared {
            self.teardowns.fetch_add(1, Ordering::SeqCst);
        }
        cleared
    }
}

pub fn client(server: &MockServer, session: Arc<dyn SessionStore>) -> ApiClient {
    ApiClient::new(Config::new(server.uri()), session).expect("client builds")
}

pub fn client_with(config: Config, session: Arc<dyn SessionStore>) -> ApiClient {
    ApiClient::new(config, session).expect("client builds")
}

/// Signed access token expiring `ttl_secs` from now.
pub fn jwt(user: &str, ttl_secs: i64) -> String {
    encode(
        &Header::default(),
        &json!({ "sub": user, "exp": Timestamp::now().as_second() + ttl_secs }),
        &EncodingKey::from_secret(b"server-secret"),
    )
    .expect("token signs")
}

pub async fn mount_csrf(server: &MockServer, token: &str) {
    Mock::given(method("GET"))
        .and(path("/auth/csrf-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": token,
            "headerName": "X-CSRF-TOKEN",
            "parameterName": "_csrf"
        })))
        .mount(server)
        .await;
}

pub async fn count_requests(server: &MockServer, http_method: &str, url_path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.method.as_str() == http_method && r.url.path() == url_path)
        .count()
}
