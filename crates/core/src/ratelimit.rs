//! Fixed-window rate limiter over the SQLite store.
//!
//! One shared budget per backend key; there is no per-caller identity.
//! The limiter fails open: if the store is absent or the increment errors,
//! the call is allowed, since backend availability matters more here than
//! strict quota enforcement.

use crate::store::StoreDb;

/// Fixed-window rate limiter handle.
#[derive(Clone, Debug, Default)]
pub struct RateLimiter {
    store: Option<StoreDb>,
}

impl RateLimiter {
    /// Create a limiter backed by the given store, or a limiter that always
    /// allows when `store` is None.
    pub fn new(store: Option<StoreDb>) -> Self {
        Self { store }
    }

    /// Create a limiter that always allows.
    pub fn disabled() -> Self {
        Self { store: None }
    }

    /// Record one request against `key` and report whether it fits within
    /// `limit` requests per `window_seconds`.
    ///
    /// The first request of a window fixes its expiry; once `limit` is
    /// reached every further call is denied until the window lapses.
    pub async fn allow(&self, key: &str, limit: u32, window_seconds: i64) -> bool {
        let Some(store) = self.store.as_ref() else { return true };
        match store.window_incr(key, window_seconds).await {
            Ok(count) => count <= i64::from(limit),
            Err(e) => {
                tracing::warn!(key, error = %e, "rate limit check failed, allowing request");
                true
            }
        }
    }
}
