//! Periodic pings that keep live-update sockets open and forget dead ones.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::ws::manager::WsManager;

/// Ping every live-update socket once per `every`.
///
/// Sockets whose writer task has gone away are removed from the manager on
/// the same pass. Runs until the handle is aborted.
pub fn start_heartbeat(ws_manager: Arc<WsManager>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticks = tokio::time::interval(every);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticks.tick().await;

        loop {
            ticks.tick().await;
            if ws_manager.connection_count().await == 0 {
                continue;
            }
            let dropped = ws_manager.ping_all().await;
            if dropped > 0 {
                tracing::info!(dropped, "Dropped stale live-update sockets");
            }
        }
    })
}
