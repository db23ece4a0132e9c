use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::services::checkout::expire_stale_pending;
use crate::state::AppState;

/// Periodically expires unpaid purchases so their seats return to sale, and
/// drops stale login-failure counters.
pub fn spawn_expiry_sweeper(state: AppState) -> JoinHandle<()> {
    let every = state.config.expiry_sweep_interval.max(Duration::from_secs(1));
    let ttl = state.config.pending_purchase_ttl;

    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(interval_secs = every.as_secs(), "Expiry sweeper started");

        loop {
            ticker.tick().await;
            let now = Utc::now();
            if let Err(e) = expire_stale_pending(&state.pool, ttl, now).await {
                tracing::error!(error = %e, "Expiry sweep failed");
            }
            state.login_limiter.prune(now).await;
        }
    })
}
