//! Request deadline propagation
//!
//! Every request carries a deadline that bounds each store and cache call.
//! Detached background work (interest-graph refresh, push fan-out) carries
//! its own deadline instead of inheriting the request's.

use std::future::Future;
use std::time::{Duration, Instant};

use crate::error::{ApiError, ApiResult};

/// A point in time after which I/O calls must not block the caller.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    /// A deadline `budget` from now.
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
        }
    }

    /// Time left until the deadline; zero once it has passed.
    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        self.remaining().is_zero()
    }

    /// Run a fallible future under this deadline.
    ///
    /// `what` names the operation for the `Timeout` error surfaced when the
    /// deadline elapses first.
    pub async fn enforce<T, E, F>(&self, what: &'static str, fut: F) -> ApiResult<T>
    where
        F: Future<Output = Result<T, E>>,
        ApiError: From<E>,
    {
        match tokio::time::timeout(self.remaining(), fut).await {
            Ok(result) => result.map_err(ApiError::from),
            Err(_) => Err(ApiError::Timeout(what)),
        }
    }
}
