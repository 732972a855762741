//! HTTP API layer for haven.
//!
//! This crate provides the REST API and real-time streaming:
//!
//! - **Endpoints**: report intake, status lookup, media retrieval, the
//!   polling fallback boundary and admin/diagnostic routes
//! - **Extractors**: admin bearer-token authentication
//! - **Streaming**: WebSocket push of alert events to admin subscribers
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;
pub mod streaming;

pub use endpoints::router;
pub use streaming::{BroadcastEventPublisher, StreamingState, streaming_handler};
