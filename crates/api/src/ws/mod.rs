//! Streaming detection over WebSocket.
//!
//! Provides connection management, heartbeat monitoring, the wire messages
//! and the HTTP upgrade handler used by Axum routes.

mod handler;
mod heartbeat;
pub mod manager;
pub mod messages;

pub use handler::ws_detect_handler;
pub use heartbeat::{start_heartbeat, DEFAULT_HEARTBEAT_SECS};
pub use manager::WsManager;
