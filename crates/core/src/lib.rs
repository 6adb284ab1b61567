//! Core types and shared functionality for the tgb precache worker.
//!
//! This crate provides:
//! - Bucket store with SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheDb, StoredResponse};
pub use config::AppConfig;
pub use error::Error;
