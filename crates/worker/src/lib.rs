//! Cache controller and lifecycle plumbing for the tgb precache worker.
//!
//! The controller owns one versioned bucket: it precaches a fixed URL
//! manifest at install time, answers intercepted requests cache-first, and
//! evicts superseded buckets at activation. `Registration` stands in for
//! the host runtime that drives the lifecycle.

pub mod controller;
pub mod lifecycle;

pub use controller::CacheController;
pub use lifecycle::{EventHandler, FetchRequest, LifecyclePhase, Registration, ServeSource, ServedResponse};
