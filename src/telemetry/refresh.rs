use std::time::Instant;

use tracing::{Level, event};
use uuid::Uuid;

use crate::errors::ApiError;

#[derive(Clone, Debug)]
pub enum RefreshOutcome {
    Success,
    Rejected,
    Failed,
}

/// Correlates the log events of one refresh attempt.
#[derive(Clone, Debug)]
pub struct RefreshTelemetry {
    attempt_id: Uuid,
    context: String,
    started: Instant,
}

impl RefreshTelemetry {
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            attempt_id: Uuid::new_v4(),
            context: context.into(),
            started: Instant::now(),
        }
    }

    pub fn emit_start(&self) {
        event!(
            Level::INFO,
            attempt_id = %self.attempt_id,
            context = %self.context,
            "refresh.start"
        );
    }

    pub fn emit_success(&self) {
        event!(
            Level::INFO,
            attempt_id = %self.attempt_id,
            context = %self.context,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            outcome = ?RefreshOutcome::Success,
            "refresh.success"
        );
    }

    pub fn emit_failure(&self, outcome: RefreshOutcome, error: &ApiError) {
        event!(
            Level::WARN,
            attempt_id = %self.attempt_id,
            context = %self.context,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            outcome = ?outcome,
            status = error.status,
            error = %error,
            "refresh.failure"
        );
    }
}
