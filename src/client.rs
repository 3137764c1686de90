use std::sync::Arc;

use reqwest::header::HeaderName;
use tokio::sync::broadcast;

use crate::config::Config;
use crate::session::SessionStore;
use crate::token::{RefreshCoordinator, RefreshPolicy};
use crate::types::SessionEvent;

mod auth;
mod csrf;
mod impls;
mod response;

const EVENT_CAPACITY: usize = 16;

/// Authenticated client for the dashboard REST API.
///
/// Cloning is cheap; clones share the session, the cookie jar and the
/// refresh gate.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: reqwest::Client,
    config: Config,
    csrf_header: HeaderName,
    client_id_header: HeaderName,
    session: Arc<dyn SessionStore>,
    refresh: RefreshCoordinator,
    policy: Option<RefreshPolicy>,
    events: broadcast::Sender<SessionEvent>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.config.base_url)
            .field("refresh", &self.inner.refresh)
            .finish_non_exhaustive()
    }
}
