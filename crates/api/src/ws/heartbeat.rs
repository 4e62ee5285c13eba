//! Keep-alive pings for streaming sessions.
//!
//! Idle detection sessions can sit behind proxies that drop quiet
//! connections, so every open session is pinged on a fixed period.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::ws::manager::WsManager;

/// Ping period used when `WS_HEARTBEAT_SECS` is not set.
pub const DEFAULT_HEARTBEAT_SECS: u64 = 30;

/// Ping every registered session each `period`, first after one full period.
///
/// Runs until the returned handle is aborted, which `main` does once the
/// server has shut down.
pub fn start_heartbeat(ws_manager: Arc<WsManager>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        // A stalled runtime should not produce a burst of pings afterwards.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let pinged = ws_manager.ping_all().await;
            if pinged > 0 {
                tracing::debug!(sessions = pinged, "Heartbeat sent");
            }
        }
    })
}
