//! Background expiry of idle sessions.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::error::ApiError;

use super::SessionRegistry;

#[derive(Debug, Clone, Copy)]
pub struct SweeperConfig {
    pub period: Duration,
    pub ttl: Duration,
}

/// Periodically remove sessions idle past the TTL.
///
/// A session whose slot is held is skipped and retried next cycle; an
/// in-flight turn is never interrupted, however old the session.
pub fn spawn_sweeper(
    registry: SessionRegistry,
    config: SweeperConfig,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(config.period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    sweep_once(&registry, config.ttl);
                }
                _ = shutdown.changed() => {
                    debug!("Session sweeper stopping");
                    break;
                }
            }
        }
    })
}

/// One sweep cycle. Exposed for forced cleanup and tests.
pub fn sweep_once(registry: &SessionRegistry, ttl: Duration) {
    let now = Utc::now();
    let mut expired = 0usize;
    for entry in registry.list() {
        let idle = now
            .signed_duration_since(entry.meta().last_active_at)
            .to_std()
            .unwrap_or(Duration::ZERO);
        if idle <= ttl {
            continue;
        }
        match registry.delete(&entry.id) {
            Ok(()) => {
                info!(session_id = %entry.id, idle_secs = idle.as_secs(), "Expired idle session");
                expired += 1;
            }
            Err(ApiError::SessionBusy(_)) => {
                debug!(session_id = %entry.id, "Idle session busy, retrying next sweep");
            }
            Err(_) => {}
        }
    }
    if expired > 0 {
        info!(expired, remaining = registry.len(), "Session sweep complete");
    }
}
