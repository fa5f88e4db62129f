//! Content module - stage list, stage narration and reflection insight
//!
//! The controller treats every collaborator here as opaque and unreliable:
//! any failure is replaced by a local fallback.

mod error;
mod http;
pub mod mock;
mod provider;

pub use error::ContentError;
pub use http::{HttpContentClient, MAX_RETRIES_LIMIT};
pub use provider::{ContentProvider, HealthStatus, InsightService, OfflineContent};
