//! Shared health state for the /health endpoint.
//! Updated by the refresh handler and the startup refresh.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Refresh counters. Written after each refresh attempt, read by the API.
#[derive(Default)]
pub struct HealthState {
    /// Successful refreshes since startup.
    pub refresh_count: AtomicU64,
    /// Failed refreshes since startup.
    pub refresh_failures: AtomicU64,
    /// Unix seconds of the last refresh attempt (0 = none).
    pub last_refresh_at_secs: AtomicU64,
    /// Outcome of the last refresh attempt.
    pub last_refresh_ok: AtomicBool,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_refresh(&self, ok: bool, at_secs: u64) {
        if ok {
            self.refresh_count.fetch_add(1, Ordering::Relaxed);
        } else {
            self.refresh_failures.fetch_add(1, Ordering::Relaxed);
        }
        self.last_refresh_at_secs.store(at_secs, Ordering::Relaxed);
        self.last_refresh_ok.store(ok, Ordering::Relaxed);
    }

    pub fn refresh_count(&self) -> u64 {
        self.refresh_count.load(Ordering::Relaxed)
    }

    pub fn refresh_failures(&self) -> u64 {
        self.refresh_failures.load(Ordering::Relaxed)
    }

    pub fn last_refresh_at_secs(&self) -> u64 {
        self.last_refresh_at_secs.load(Ordering::Relaxed)
    }

    pub fn last_refresh_ok(&self) -> bool {
        self.last_refresh_ok.load(Ordering::Relaxed)
    }
}
