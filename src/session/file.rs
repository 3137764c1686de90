use std::path::{Path, PathBuf};

use tracing::warn;

use crate::errors::Error;
use crate::types::SessionCredentials;

use super::{InMemorySession, SessionStore};

/// Session persisted as JSON on disk so it survives restarts.
///
/// Reads are served from memory; every change is written through. A failed
/// write is logged and the in-memory state still changes.
#[derive(Debug)]
pub struct FileSession {
    path: PathBuf,
    inner: InMemorySession,
}

impl FileSession {
    /// Opens the session file, starting empty if it does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, Error> {
        let path = path.into();
        let inner = match std::fs::read_to_string(&path) {
            Ok(contents) => {
                InMemorySession::with_credentials(serde_json::from_str(&contents)?)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => InMemorySession::new(),
            Err(err) => return Err(Error::Io(err)),
        };
        Ok(Self { path, inner })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) {
        let result = match self.inner.snapshot() {
            Some(credentials) => write_credentials(&self.path, &credentials),
            None => match std::fs::remove_file(&self.path) {
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
                other => other.map_err(Error::Io),
            },
        };
        if let Err(err) = result {
            warn!(path = %self.path.display(), error = %err, "session persist failed");
        }
    }
}

fn write_credentials(path: &Path, credentials: &SessionCredentials) -> Result<(), Error> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_vec(credentials)?)?;
    Ok(())
}

impl SessionStore for FileSession {
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
        self.inner.set_session(token, user_id);
        self.persist();
    }

    fn set_client_id(&self, client_id: Option<&str>) {
        self.inner.set_client_id(client_id);
        self.persist();
    }

    fn clear(&self) -> bool {
        let cleared = self.inner.clear();
        if cleared {
            self.persist();
        }
        cleared
    }
}
