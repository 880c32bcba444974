//! TTL key/value operations.
//!
//! Provides the raw store operations behind the provider-facing cache.
//! Expiry is an RFC3339 TEXT column compared against a `now` parameter
//! bound at call time, so entries expire without a background sweeper.

use super::connection::StoreDb;
use crate::Error;
use chrono::{Duration, Utc};
use tokio_rusqlite::params;

impl StoreDb {
    /// Get a live cached value by key.
    ///
    /// Returns None if the key doesn't exist or its entry has expired.
    pub async fn kv_get(&self, key: &str) -> Result<Option<String>, Error> {
        let key = key.to_string();
        let now = Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let mut stmt = conn.prepare("SELECT value FROM kv_cache WHERE key = ?1 AND expires_at > ?2")?;

                let result = stmt.query_row(params![key, now], |row| row.get(0));

                match result {
                    Ok(value) => Ok(Some(value)),
                    Err(tokio_rusqlite::rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or update a cached value with the given TTL.
    ///
    /// Uses UPSERT semantics: inserts if the key doesn't exist, replaces the
    /// value and both timestamps if it does.
    pub async fn kv_set(&self, key: &str, value: &str, ttl_seconds: i64) -> Result<(), Error> {
        let key = key.to_string();
        let value = value.to_string();

        let fetched_at = Utc::now().to_rfc3339();
        let expires_at = (Utc::now() + Duration::seconds(ttl_seconds)).to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO kv_cache (key, value, fetched_at, expires_at)
                    VALUES (?1, ?2, ?3, ?4)
                    ON CONFLICT(key) DO UPDATE SET
                        value = excluded.value,
                        fetched_at = excluded.fetched_at,
                        expires_at = excluded.expires_at",
                    params![key, value, fetched_at, expires_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Remaining lifetime of an entry in whole seconds, negative once it
    /// has expired. Returns None for an absent key.
    pub async fn kv_ttl(&self, key: &str) -> Result<Option<i64>, Error> {
        let key = key.to_string();
        let expires_at = self
            .conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let mut stmt = conn.prepare("SELECT expires_at FROM kv_cache WHERE key = ?1")?;

                let result = stmt.query_row(params![key], |row| row.get(0));

                match result {
                    Ok(value) => Ok(Some(value)),
                    Err(tokio_rusqlite::rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        match expires_at {
            Some(ts) => {
                let parsed = chrono::DateTime::parse_from_rfc3339(&ts)
                    .map_err(|e| Error::Parse(format!("invalid expiry timestamp {ts:?}: {e}")))?;
                Ok(Some((parsed.with_timezone(&Utc) - Utc::now()).num_seconds()))
            }
            None => Ok(None),
        }
    }

    /// Delete a cached value by key.
    pub async fn kv_delete(&self, key: &str) -> Result<(), Error> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute("DELETE FROM kv_cache WHERE key = ?1", params![key])?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Delete expired cache entries and lapsed rate windows.
    ///
    /// Returns the number of deleted cache entries.
    pub async fn purge_expired(&self) -> Result<u64, Error> {
        let now = Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM kv_cache WHERE expires_at < ?1", params![now])?;
                conn.execute("DELETE FROM rate_windows WHERE expires_at < ?1", params![now])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
