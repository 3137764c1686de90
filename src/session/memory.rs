use std::sync::{PoisonError, RwLock};

use crate::types::SessionCredentials;

use super::SessionStore;

/// Process-local session, lost when the process exits.
#[derive(Debug, Default)]
pub struct InMemorySession {
    state: RwLock<Option<SessionCredentials>>,
}

impl InMemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(credentials: SessionCredentials) -> Self {
        Self {
            state: RwLock::new(Some(credentials)),
        }
    }

    pub fn snapshot(&self) -> Option<SessionCredentials> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn replace(&self, credentials: Option<SessionCredentials>) -> bool {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let had_credentials = state.is_some();
        *state = credentials;
        had_credentials
    }
}

impl SessionStore for InMemorySession {
    fn access_token(&self) -> Option<String> {
        self.snapshot().map(|c| c.access_token)
    }

    fn user_id(&self) -> Option<String> {
        self.snapshot().map(|c| c.user_id)
    }

    fn client_id(&self) -> Option<String> {
        self.snapshot().and_then(|c| c.client_id)
    }

    fn set_session(&self, token: &str, user_id: &str) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let client_id = state.as_ref().and_then(|c| c.client_id.clone());
        *state = Some(SessionCredentials {
            access_token: token.to_string(),
            user_id: user_id.to_string(),
            client_id,
        });
    }

    fn set_client_id(&self, client_id: Option<&str>) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(credentials) = state.as_mut() {
            credentials.client_id = client_id.map(str::to_string);
        }
    }

    fn clear(&self) -> bool {
        self.replace(None)
    }
}
