//! Reconciliation engine for Game instances.
//!
//! Handlers are level-triggered and idempotent: each one looks at the event and
//! the cluster as it is right now, never at a cache of earlier decisions, so
//! duplicates, replays and concurrent calls for distinct instances are safe.

#![forbid(unsafe_code)]

mod engine;
mod retry;

pub use engine::{Engine, DEFAULT_CALL_TIMEOUT};
pub use retry::{RetryPolicy, DEFAULT_INTERVAL};
