//! Session credential storage consumed by the client.

mod file;
mod memory;

use std::time::Duration;

use jiff::{SignedDuration, Timestamp};

use crate::token::claims;

pub use file::FileSession;
pub use memory::InMemorySession;

/// Read/write access to the credentials of the logged-in user.
///
/// The client only reads the token on every request and writes through
/// [`SessionStore::set_session`] after a refresh or login, and
/// [`SessionStore::clear`] on confirmed authentication failure.
pub trait SessionStore: Send + Sync {
    fn access_token(&self) -> Option<String>;

    fn user_id(&self) -> Option<String>;

    fn client_id(&self) -> Option<String>;

    fn set_session(&self, token: &str, user_id: &str);

    fn set_client_id(&self, client_id: Option<&str>);

    /// Removes all credentials. Returns false when there was nothing to remove.
    fn clear(&self) -> bool;

    /// Token present and its `exp` claim still in the future.
    fn is_logged_in(&self) -> bool {
        self.access_token()
            .is_some_and(|token| claims::is_live(&token, Timestamp::now()))
    }

    /// Token present and expiring within `window`. Tokens without a readable
    /// expiry are never reported as expiring.
    fn is_expiring_soon(&self, window: Duration) -> bool {
        let Some(exp) = self
            .access_token()
            .and_then(|token| claims::expires_at(&token))
        else {
            return false;
        };
        let Ok(window) = SignedDuration::try_from(window) else {
            return true;
        };
        Timestamp::now()
            .checked_add(window)
            .map(|horizon| exp <= horizon)
            .unwrap_or(true)
    }
}
