use std::time::Duration;

use crate::errors::Error;

/// Rules for refreshing an access token before the server starts rejecting it.
#[derive(Clone, Debug)]
pub struct RefreshPolicy {
    /// Refresh once the token has less than this long to live.
    pub threshold: Duration,
    /// Acceptable clock skew margin when evaluating expiry.
    pub clock_skew: Duration,
}

impl RefreshPolicy {
    pub fn new(threshold: Duration, clock_skew: Duration) -> Result<Self, Error> {
        if threshold.is_zero() {
            return Err(Error::Config("Refresh threshold must be > 0".into()));
        }
        if clock_skew >= threshold {
            return Err(Error::Config(
                "Clock skew must be lower than the refresh threshold".into(),
            ));
        }
        Ok(Self {
            threshold,
            clock_skew,
        })
    }

    /// Remaining lifetime below which a request refreshes first.
    pub fn window(&self) -> Duration {
        self.threshold + self.clock_skew
    }
}
