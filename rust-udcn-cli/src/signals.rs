//! SIGUSR1/SIGUSR2 handling: dump or reset per-worker counters.
//!
//! Grounded on `original_source`'s signal handlers in `main.c`, which use
//! the same two signals for the same purpose on the DPDK forwarder.
//! `signal-hook`'s flag-based registration replaces the original's
//! `sigaction` call; the flags are polled from the same loop that waits
//! on the shutdown signal.

use anyhow::Result;
use rust_udcn_common::metrics::WorkerStats;
use signal_hook::consts::{SIGUSR1, SIGUSR2};
use signal_hook::flag;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub struct StatsSignals {
    usr1: Arc<AtomicBool>,
    usr2: Arc<AtomicBool>,
}

impl StatsSignals {
    pub fn install() -> Result<Self> {
        let usr1 = Arc::new(AtomicBool::new(false));
        let usr2 = Arc::new(AtomicBool::new(false));
        flag::register(SIGUSR1, Arc::clone(&usr1))?;
        flag::register(SIGUSR2, Arc::clone(&usr2))?;
        Ok(Self { usr1, usr2 })
    }

    /// Checks for a pending signal and, if one is set, acts on `workers`
    /// and clears the flag. Call this periodically from the main loop.
    pub fn poll(&self, workers: &[Arc<WorkerStats>]) {
        if self.usr1.swap(false, Ordering::Relaxed) {
            rust_udcn_core::stats::print_report(workers);
        }
        if self.usr2.swap(false, Ordering::Relaxed) {
            rust_udcn_core::stats::reset_all(workers);
        }
    }
}
