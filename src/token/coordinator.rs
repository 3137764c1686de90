use std::future::Future;
use std::sync::{Mutex, PoisonError};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tracing::debug;

type SharedRefresh = Shared<BoxFuture<'static, bool>>;

/// Single-flight gate around token refresh.
///
/// The first caller starts the refresh; callers arriving while it is in flight
/// await the same outcome. Once the shared future settles the gate is idle
/// again, whatever the outcome, so a later 401 can start a fresh attempt.
#[derive(Default)]
pub struct RefreshCoordinator {
    pending: Mutex<Option<SharedRefresh>>,
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_flight(&self) -> bool {
        self.slot()
            .as_ref()
            .is_some_and(|pending| pending.peek().is_none())
    }

    /// Joins the refresh in flight, or starts one with `refresh` when idle.
    ///
    /// `refresh` is only invoked by the caller that starts a new attempt.
    pub async fn run<F, Fut>(&self, refresh: F) -> bool
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = bool> + Send + 'static,
    {
        let pending = {
            // check-and-set happens under the lock and never spans an await
            let mut slot = self.slot();
            match slot.as_ref() {
                Some(pending) if pending.peek().is_none() => {
                    debug!("refresh already in flight; joining");
                    pending.clone()
                }
                _ => {
                    let pending = refresh().boxed().shared();
                    *slot = Some(pending.clone());
                    pending
                }
            }
        };

        let outcome = pending.clone().await;

        let mut slot = self.slot();
        if slot
            .as_ref()
            .is_some_and(|current| current.ptr_eq(&pending))
        {
            *slot = None;
        }
        outcome
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<SharedRefresh>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("in_flight", &self.in_flight())
            .finish()
    }
}
