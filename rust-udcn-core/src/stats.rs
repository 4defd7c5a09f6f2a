//! Aggregation of per-worker counters for SIGUSR1/SIGUSR2 reporting.

use rust_udcn_common::metrics::WorkerStats;
use std::sync::Arc;

/// Prints one line per worker plus a totals line, in the shape the
/// original's `CONTROL_PLANE_LOG`-style prefixed lines used.
pub fn print_report(workers: &[Arc<WorkerStats>]) {
    let mut totals = Totals::default();
    for (i, w) in workers.iter().enumerate() {
        let t = Totals::from(w.as_ref());
        log::info!(
            "[WORKER_{}] int_recv={} cs_hit={} pit_hit={} fib_hit={} no_route={} fib_loop={} \
             sw_drop={} data_recv={} data_sent={} data_pit_miss={} nic_drop={} malformed={}",
            i,
            t.int_recv,
            t.int_cs_hit,
            t.int_pit_hit,
            t.int_fib_hit,
            t.int_no_route,
            t.int_fib_loop,
            t.sw_pkt_drop,
            t.data_recv,
            t.data_sent,
            t.data_pit_miss,
            t.nic_pkt_drop,
            t.malformed,
        );
        totals.add(&t);
    }
    log::info!(
        "[TOTAL] int_recv={} cs_hit={} pit_hit={} fib_hit={} no_route={} fib_loop={} \
         sw_drop={} data_recv={} data_sent={} data_pit_miss={} nic_drop={} malformed={}",
        totals.int_recv,
        totals.int_cs_hit,
        totals.int_pit_hit,
        totals.int_fib_hit,
        totals.int_no_route,
        totals.int_fib_loop,
        totals.sw_pkt_drop,
        totals.data_recv,
        totals.data_sent,
        totals.data_pit_miss,
        totals.nic_pkt_drop,
        totals.malformed,
    );
}

pub fn reset_all(workers: &[Arc<WorkerStats>]) {
    for w in workers {
        w.reset();
    }
    log::info!("counters reset on {} worker(s)", workers.len());
}

#[derive(Default, Clone, Copy)]
struct Totals {
    int_recv: u64,
    int_cs_hit: u64,
    int_pit_hit: u64,
    int_fib_hit: u64,
    int_no_route: u64,
    int_fib_loop: u64,
    sw_pkt_drop: u64,
    data_recv: u64,
    data_sent: u64,
    data_pit_miss: u64,
    nic_pkt_drop: u64,
    malformed: u64,
}

impl Totals {
    fn add(&mut self, other: &Totals) {
        self.int_recv += other.int_recv;
        self.int_cs_hit += other.int_cs_hit;
        self.int_pit_hit += other.int_pit_hit;
        self.int_fib_hit += other.int_fib_hit;
        self.int_no_route += other.int_no_route;
        self.int_fib_loop += other.int_fib_loop;
        self.sw_pkt_drop += other.sw_pkt_drop;
        self.data_recv += other.data_recv;
        self.data_sent += other.data_sent;
        self.data_pit_miss += other.data_pit_miss;
        self.nic_pkt_drop += other.nic_pkt_drop;
        self.malformed += other.malformed;
    }
}

impl From<&WorkerStats> for Totals {
    fn from(w: &WorkerStats) -> Self {
        Self {
            int_recv: w.int_recv.value(),
            int_cs_hit: w.int_cs_hit.value(),
            int_pit_hit: w.int_pit_hit.value(),
            int_fib_hit: w.int_fib_hit.value(),
            int_no_route: w.int_no_route.value(),
            int_fib_loop: w.int_fib_loop.value(),
            sw_pkt_drop: w.sw_pkt_drop.value(),
            data_recv: w.data_recv.value(),
            data_sent: w.data_sent.value(),
            data_pit_miss: w.data_pit_miss.value(),
            nic_pkt_drop: w.nic_pkt_drop.value(),
            malformed: w.malformed.value(),
        }
    }
}
