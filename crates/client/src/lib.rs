//! Network client for the tgb precache worker.
//!
//! This crate provides the HTTP fetch primitive the worker delegates to on
//! cache misses and at install time, plus URL resolution against the
//! configured origin.

pub mod fetch;

pub use fetch::{FetchClient, FetchConfig, FetchResponse, Fetcher};
