//! SQLite-backed store for named cache buckets.
//!
//! This module reimplements the cache storage surface the worker needs as a
//! persistent SQLite database with async access via tokio-rusqlite:
//!
//! - Named buckets: open-by-name, enumerate-names, delete-by-name
//! - Response snapshots keyed by request identity (method + URL)
//! - Transactional batch insert (a precache batch lands whole or not at all)
//! - Automatic schema migrations
//! - WAL mode for concurrent access

pub mod buckets;
pub mod connection;
pub mod entries;
pub mod key;
pub mod migrations;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::StoredResponse;
