//! Fixed-window counter operations.
//!
//! A window row is created on the first increment with an expiry set
//! `window_seconds` ahead; later increments within the window bump the
//! count without touching the expiry. A lapsed row is reset in place by
//! the same statement, so the whole operation is a single atomic UPSERT.

use super::connection::StoreDb;
use crate::Error;
use chrono::{Duration, Utc};
use tokio_rusqlite::params;

impl StoreDb {
    /// Atomically increment the counter for `key`, returning the
    /// post-increment count within the current window.
    ///
    /// Only the first increment of a window sets its expiry.
    pub async fn window_incr(&self, key: &str, window_seconds: i64) -> Result<i64, Error> {
        let key = key.to_string();
        let now = Utc::now().to_rfc3339();
        let window_end = (Utc::now() + Duration::seconds(window_seconds)).to_rfc3339();

        self.conn
            .call(move |conn| -> Result<i64, Error> {
                let count = conn.query_row(
                    "INSERT INTO rate_windows (key, count, expires_at)
                    VALUES (?1, 1, ?2)
                    ON CONFLICT(key) DO UPDATE SET
                        count = CASE WHEN rate_windows.expires_at <= ?3 THEN 1 ELSE rate_windows.count + 1 END,
                        expires_at = CASE WHEN rate_windows.expires_at <= ?3 THEN ?2 ELSE rate_windows.expires_at END
                    RETURNING count",
                    params![key, window_end, now],
                    |row| row.get(0),
                )?;
                Ok(count)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::super::connection::StoreDb;

    #[tokio::test]
    async fn test_incr_counts_up() {
        let db = StoreDb::open_in_memory().await.unwrap();

        assert_eq!(db.window_incr("rl:test", 60).await.unwrap(), 1);
        assert_eq!(db.window_incr("rl:test", 60).await.unwrap(), 2);
        assert_eq!(db.window_incr("rl:test", 60).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_incr_keys_are_independent() {
        let db = StoreDb::open_in_memory().await.unwrap();

        assert_eq!(db.window_incr("rl:one", 60).await.unwrap(), 1);
        assert_eq!(db.window_incr("rl:two", 60).await.unwrap(), 1);
        assert_eq!(db.window_incr("rl:one", 60).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_incr_resets_after_window_lapses() {
        let db = StoreDb::open_in_memory().await.unwrap();

        assert_eq!(db.window_incr("rl:lapse", 1).await.unwrap(), 1);
        assert_eq!(db.window_incr("rl:lapse", 1).await.unwrap(), 2);

        tokio::time::sleep(tokio::time::Duration::from_secs(2)).await;

        assert_eq!(db.window_incr("rl:lapse", 1).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_later_incr_keeps_first_expiry() {
        let db = StoreDb::open_in_memory().await.unwrap();

        db.window_incr("rl:expiry", 2).await.unwrap();
        tokio::time::sleep(tokio::time::Duration::from_millis(1200)).await;
        // Re-increment inside the window; it must not extend the expiry.
        db.window_incr("rl:expiry", 2).await.unwrap();
        tokio::time::sleep(tokio::time::Duration::from_millis(1200)).await;

        assert_eq!(db.window_incr("rl:expiry", 2).await.unwrap(), 1);
    }
}
