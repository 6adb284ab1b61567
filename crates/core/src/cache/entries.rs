//! Stored response snapshots.
//!
//! Provides the batch insert, match and count operations the worker uses
//! against a bucket's entry set.

use super::connection::CacheDb;
use super::key::compute_entry_key;
use crate::Error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A stored response snapshot.
///
/// Holds everything needed to answer a matching request without touching
/// the network: status, headers and body, plus the request identity that
/// keys the entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredResponse {
    pub key: String,
    pub url: String,
    pub method: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub headers_json: Option<String>,
    pub body: Vec<u8>,
    pub fetched_at: String,
}

impl StoredResponse {
    /// Parse the stored header map.
    ///
    /// Returns an empty map when no headers were recorded or the stored
    /// JSON is malformed.
    pub fn headers(&self) -> BTreeMap<String, String> {
        self.headers_json
            .as_deref()
            .and_then(|json| serde_json::from_str(json).ok())
            .unwrap_or_default()
    }
}

impl CacheDb {
    /// Store a batch of snapshots in a single transaction.
    ///
    /// Replaces the bucket's previous entry set in the same transaction:
    /// either the whole batch lands or the bucket keeps its prior contents.
    /// The bucket must already exist.
    pub async fn put_entries(&self, bucket: &str, entries: &[StoredResponse]) -> Result<(), Error> {
        let bucket = bucket.to_string();
        let entries = entries.to_vec();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM entries WHERE bucket = ?1", params![bucket])?;
                for entry in &entries {
                    tx.execute(
                        "INSERT INTO entries (
                            bucket, key, url, method, status,
                            content_type, headers_json, body, fetched_at
                        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                        params![
                            &bucket,
                            &entry.key,
                            &entry.url,
                            &entry.method,
                            entry.status as i32,
                            &entry.content_type,
                            &entry.headers_json,
                            &entry.body,
                            &entry.fetched_at,
                        ],
                    )?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up a snapshot by request identity.
    ///
    /// Returns None on miss. No freshness check: a stored entry answers
    /// until its bucket is deleted.
    pub async fn match_request(&self, bucket: &str, method: &str, url: &str) -> Result<Option<StoredResponse>, Error> {
        let bucket = bucket.to_string();
        let key = compute_entry_key(method, url);
        self.conn
            .call(move |conn| -> Result<Option<StoredResponse>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT key, url, method, status, content_type, headers_json, body, fetched_at
                     FROM entries WHERE bucket = ?1 AND key = ?2",
                )?;

                let result = stmt.query_row(params![bucket, key], |row| {
                    Ok(StoredResponse {
                        key: row.get(0)?,
                        url: row.get(1)?,
                        method: row.get(2)?,
                        status: row.get::<_, i32>(3)? as u16,
                        content_type: row.get(4)?,
                        headers_json: row.get(5)?,
                        body: row.get(6)?,
                        fetched_at: row.get(7)?,
                    })
                });

                match result {
                    Ok(entry) => Ok(Some(entry)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Count the entries stored in a bucket.
    pub async fn count_entries(&self, bucket: &str) -> Result<u64, Error> {
        let bucket = bucket.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE bucket = ?1", params![bucket], |row| {
                        row.get(0)
                    })?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
