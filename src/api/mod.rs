//! HTTP API
//!
//! axum routes over a shared `Nl2SqlService`. Handlers are plain async functions
//! so tests can call them with extractors directly.

pub mod handlers;
pub mod router;
pub mod types;

pub use router::create_router;
pub use types::{ApiError, AppState};
