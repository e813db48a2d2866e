//! Ping/pong liveness for one socket.
//!
//! The writer pings the client on a fixed interval; the reader marks the
//! connection alive on every inbound frame, pongs included. A client that
//! stays silent through a whole idle window is considered gone.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use tokio::time::{self, Instant, Interval, MissedTickBehavior};

/// Liveness checks per idle window
const CHECKS_PER_WINDOW: u32 = 3;

/// Set by the reader, consumed by the heartbeat.
#[derive(Debug)]
pub struct Liveness {
    alive: AtomicBool,
}

impl Liveness {
    pub fn new() -> Self {
        Self {
            alive: AtomicBool::new(true),
        }
    }

    pub fn mark_alive(&self) {
        self.alive.store(true, Ordering::Relaxed);
    }

    /// Whether anything arrived since the previous check. Resets the flag.
    pub fn check_alive(&self) -> bool {
        self.alive.swap(false, Ordering::Relaxed)
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

/// Ticks the ping schedule and counts missed checks.
#[derive(Debug)]
pub struct Heartbeat {
    ticker: Interval,
    liveness: Arc<Liveness>,
    missed: u32,
}

impl Heartbeat {
    pub fn new(idle_window: Duration, liveness: Arc<Liveness>) -> Self {
        let period = (idle_window / CHECKS_PER_WINDOW).max(Duration::from_millis(10));
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            ticker,
            liveness,
            missed: 0,
        }
    }

    /// Wait for the next check.
    ///
    /// Returns `false` once the client has been silent for every check in
    /// the idle window; the caller should then close the connection.
    pub async fn beat(&mut self) -> bool {
        self.ticker.tick().await;
        if self.liveness.check_alive() {
            self.missed = 0;
        } else {
            self.missed += 1;
        }
        self.missed < CHECKS_PER_WINDOW
    }
}
