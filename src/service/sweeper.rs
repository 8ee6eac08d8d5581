//! Background task that removes idle rooms.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{info, instrument};

use crate::domain::RoomRegistry;

const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Spawns [`run_sweeper`] on the current runtime.
///
/// The task runs until the returned handle is aborted, which `main` does
/// at shutdown.
#[must_use]
pub fn spawn_sweeper(registry: Arc<RoomRegistry>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(run_sweeper(registry, period))
}

/// Sweeps expired rooms every `period`, starting one period from now.
#[instrument(skip(registry))]
pub async fn run_sweeper(registry: Arc<RoomRegistry>, period: Duration) {
    info!(
        sweep_interval_secs = period.as_secs(),
        room_ttl_secs = registry.room_ttl().as_secs(),
        "starting room expiry sweep"
    );

    // tokio intervals reject a zero period.
    let period = period.max(MIN_PERIOD);
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let removed = registry.sweep_expired().await;
        let remaining = registry.len().await;
        info!(removed, remaining, "room expiry sweep completed");
    }
}
