//! The forwarding engine and the per-core worker loop that drives it.
//!
//! Each worker owns a private FIB, PIT and content store — workers never
//! share state, so there is nothing to lock on the packet path. The only
//! cross-thread interaction a worker has is draining its own FIB-update
//! channel, fed by the controller (see [`crate::controller`]).

use crate::cs::Cs;
use crate::fib::Fib;
use crate::packet::{PacketSink, PacketSource, RxPacket, TxPacket, IPPROTO_ICN};
use crate::pit::{Pit, PitUpdateOutcome};
use rust_udcn_common::control::{FibCommand as WireFibCommand, Verb};
use rust_udcn_common::crc::crc32;
use rust_udcn_common::face::FaceId;
use rust_udcn_common::metrics::WorkerStats;
use rust_udcn_common::name::Name;
use rust_udcn_common::time::Clock;
use rust_udcn_common::wire::{self, PacketType};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::Arc;

/// A FIB mutation dispatched from the controller to one worker.
#[derive(Debug, Clone, Copy)]
pub enum FibUpdate {
    Add { prefix: Name, face: FaceId },
    Del { prefix: Name, face: FaceId },
}

impl FibUpdate {
    pub fn from_wire(cmd: WireFibCommand) -> Self {
        match cmd.verb {
            Verb::Add => FibUpdate::Add {
                prefix: cmd.prefix,
                face: FaceId(cmd.face),
            },
            Verb::Del => FibUpdate::Del {
                prefix: cmd.prefix,
                face: FaceId(cmd.face),
            },
        }
    }
}

pub struct WorkerConfig {
    pub fib_buckets: usize,
    pub fib_max_elements: usize,
    pub pit_buckets: usize,
    pub pit_max_elements: usize,
    pub pit_ttl_ticks: u64,
    pub cs_buckets: usize,
    pub cs_max_elements: usize,
    pub max_pkt_burst: usize,
    pub prefetch_offset: usize,
    pub drain_deadline_ticks: u64,
    pub purge_deadline_ticks: u64,
}

pub struct Worker {
    fib: Fib,
    pit: Pit,
    cs: Cs,
    stats: Arc<WorkerStats>,
    clock: Clock,
    fib_updates: Receiver<FibUpdate>,
    cfg_burst: usize,
    cfg_prefetch: usize,
    cfg_drain_ticks: u64,
    cfg_purge_ticks: u64,
    tx_batches: HashMap<u8, Vec<TxPacket>>,
}

impl Worker {
    pub fn new(cfg: &WorkerConfig, fib_updates: Receiver<FibUpdate>, stats: Arc<WorkerStats>) -> Self {
        Self {
            fib: Fib::new(cfg.fib_buckets, cfg.fib_max_elements),
            pit: Pit::new(cfg.pit_buckets, cfg.pit_max_elements, cfg.pit_ttl_ticks),
            cs: Cs::new(cfg.cs_buckets, cfg.cs_max_elements),
            stats,
            clock: Clock::new(),
            fib_updates,
            cfg_burst: cfg.max_pkt_burst,
            cfg_prefetch: cfg.prefetch_offset,
            cfg_drain_ticks: cfg.drain_deadline_ticks,
            cfg_purge_ticks: cfg.purge_deadline_ticks,
            tx_batches: HashMap::new(),
        }
    }

    /// Runs until `shutdown` is set, polling `source` for packets and
    /// flushing batched transmits through `sink`.
    pub fn run(&mut self, source: &mut impl PacketSource, sink: &mut impl PacketSink, shutdown: &AtomicBool) {
        let mut rx_batch: Vec<RxPacket> = Vec::with_capacity(self.cfg_burst);
        let mut last_drain = self.clock.now_ticks();
        let mut last_purge = last_drain;

        while !shutdown.load(Ordering::Relaxed) {
            self.drain_fib_updates();

            rx_batch.clear();
            let n = source.poll_burst(&mut rx_batch, self.cfg_burst);
            for j in 0..n {
                if j + self.cfg_prefetch < n {
                    prefetch_hint(&rx_batch[j + self.cfg_prefetch].payload);
                }
                self.handle_packet(&rx_batch[j]);
            }

            let now = self.clock.now_ticks();
            if now.saturating_sub(last_drain) >= self.cfg_drain_ticks {
                self.flush_all(sink);
                last_drain = now;
            }
            if now.saturating_sub(last_purge) >= self.cfg_purge_ticks {
                self.pit.purge_expired(now);
                last_purge = now;
            }
        }
        self.flush_all(sink);
    }

    fn drain_fib_updates(&mut self) {
        while let Ok(update) = self.fib_updates.try_recv() {
            match update {
                FibUpdate::Add { prefix, face } => match self.fib.add(&prefix, face) {
                    crate::fib::FibAddResult::Ok => {
                        log::info!("fib add {} -> face {}", prefix, face)
                    }
                    crate::fib::FibAddResult::Full => {
                        log::warn!("fib add {} -> face {}: table full", prefix, face)
                    }
                    crate::fib::FibAddResult::Invalid => {
                        log::warn!("fib add {}: invalid prefix", prefix)
                    }
                },
                FibUpdate::Del { prefix, face } => match self.fib.del(&prefix, face) {
                    crate::fib::FibDelResult::Ok => {
                        log::info!("fib del {} -> face {}", prefix, face)
                    }
                    crate::fib::FibDelResult::NotFound => {
                        log::warn!("fib del {} -> face {}: not found", prefix, face)
                    }
                    crate::fib::FibDelResult::Invalid => {
                        log::warn!("fib del {}: invalid prefix", prefix)
                    }
                },
            }
        }
    }

    fn handle_packet(&mut self, rx: &RxPacket) {
        if rx.ip_protocol != IPPROTO_ICN {
            self.stats.malformed.increment();
            return;
        }
        let parsed = match wire::parse(&rx.payload) {
            Ok(p) => p,
            Err(e) => {
                log::debug!("malformed packet on face {}: {}", rx.face, e);
                self.stats.malformed.increment();
                return;
            }
        };
        let name = match Name::from_bytes(parsed.name) {
            Ok(n) => n,
            Err(e) => {
                log::debug!("malformed name on face {}: {}", rx.face, e);
                self.stats.malformed.increment();
                return;
            }
        };
        let full_crc = crc32(name.as_bytes());

        match parsed.packet_type() {
            Some(PacketType::Interest) => {
                let offsets = rust_udcn_common::name::ComponentOffsets {
                    offsets: parsed.component_offsets,
                    count: parsed.component_count,
                };
                self.handle_interest(rx, &name, &offsets, full_crc);
            }
            Some(PacketType::Data) => self.handle_data(rx, &name, full_crc),
            _ => self.stats.malformed.increment(),
        }
    }

    fn handle_interest(
        &mut self,
        rx: &RxPacket,
        name: &Name,
        offsets: &rust_udcn_common::name::ComponentOffsets,
        full_crc: u32,
    ) {
        self.stats.int_recv.increment();

        if let Some(data) = self.cs.lookup(name, full_crc) {
            self.enqueue(rx.face, data);
            self.stats.int_cs_hit.increment();
            self.stats.data_sent.increment();
            return;
        }

        match self
            .pit
            .lookup_and_update(name, full_crc, rx.face, self.clock.now_ticks())
        {
            PitUpdateOutcome::Aggregated => {
                self.stats.int_pit_hit.increment();
                return;
            }
            PitUpdateOutcome::Full => {
                self.stats.sw_pkt_drop.increment();
                return;
            }
            PitUpdateOutcome::Inserted => {}
        }

        let mut rng = rand::thread_rng();
        match self.fib.lookup(name, offsets, full_crc, &mut rng) {
            None => {
                self.pit.lookup_and_remove(name, full_crc);
                self.stats.int_no_route.increment();
            }
            Some(face) if face == rx.face => {
                self.pit.lookup_and_remove(name, full_crc);
                self.stats.int_fib_loop.increment();
            }
            Some(face) => {
                self.enqueue(face, Arc::clone(&rx.payload));
                self.stats.int_fib_hit.increment();
            }
        }
    }

    fn handle_data(&mut self, rx: &RxPacket, name: &Name, full_crc: u32) {
        self.stats.data_recv.increment();
        // Insert first: even on a PIT miss the content store still caches
        // the Data for a later Interest, and the extra Arc reference it
        // holds keeps the buffer alive after this function returns.
        let _ = self.cs.insert(name, full_crc, Arc::clone(&rx.payload));

        let mask = self.pit.lookup_and_remove(name, full_crc);
        if mask.is_empty() {
            self.stats.data_pit_miss.increment();
            return;
        }
        for face in mask.iter() {
            self.enqueue(face, Arc::clone(&rx.payload));
            self.stats.data_sent.increment();
        }
    }

    fn enqueue(&mut self, face: FaceId, payload: crate::packet::PacketBuf) {
        let batch = self.tx_batches.entry(face.0).or_default();
        batch.push(TxPacket { payload });
        if batch.len() >= self.cfg_burst {
            self.flush_face(face, &mut crate::packet::NullSink);
        }
    }

    fn flush_face(&mut self, face: FaceId, sink: &mut impl PacketSink) {
        if let Some(batch) = self.tx_batches.get_mut(&face.0) {
            if batch.is_empty() {
                return;
            }
            let accepted = sink.transmit_burst(face, batch);
            if accepted < batch.len() {
                self.stats.nic_pkt_drop.add((batch.len() - accepted) as u64);
            }
            batch.clear();
        }
    }

    fn flush_all(&mut self, sink: &mut impl PacketSink) {
        let faces: Vec<u8> = self.tx_batches.keys().copied().collect();
        for face in faces {
            self.flush_face(FaceId(face), sink);
        }
    }
}

/// Emulates the original's pointer-prefetch discipline without relying
/// on platform-specific intrinsics: touches the packet that will be
/// processed a few iterations from now so its bytes are already in
/// cache by the time we get to it.
fn prefetch_hint(payload: &[u8]) {
    if let Some(&byte) = payload.first() {
        std::hint::black_box(byte);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::test_support::{RecordingSink, VecSource};
    use rust_udcn_common::name::ComponentOffsets;
    use std::sync::mpsc;

    fn test_config() -> WorkerConfig {
        WorkerConfig {
            fib_buckets: 16,
            fib_max_elements: 64,
            pit_buckets: 16,
            pit_max_elements: 64,
            pit_ttl_ticks: 10_000_000,
            cs_buckets: 16,
            cs_max_elements: 64,
            max_pkt_burst: 8,
            prefetch_offset: 3,
            drain_deadline_ticks: 0,
            purge_deadline_ticks: 10_000_000,
        }
    }

    fn interest_packet(face: FaceId, name: &str) -> RxPacket {
        let name = Name::parse(name).unwrap();
        let offsets = name.component_offsets();
        let bytes = wire::encode_with_offsets(PacketType::Interest, 32, name.as_bytes(), &offsets);
        RxPacket {
            face,
            ip_protocol: IPPROTO_ICN,
            payload: Arc::new(bytes),
        }
    }

    fn data_packet(face: FaceId, name: &str, content: &[u8]) -> RxPacket {
        let name = Name::parse(name).unwrap();
        let offsets: ComponentOffsets = name.component_offsets();
        let mut bytes = wire::encode_with_offsets(PacketType::Data, 32, name.as_bytes(), &offsets);
        bytes.extend_from_slice(content);
        RxPacket {
            face,
            ip_protocol: IPPROTO_ICN,
            payload: Arc::new(bytes),
        }
    }

    #[test]
    fn interest_with_no_route_is_dropped_and_counted() {
        let (_tx, rx) = mpsc::sync_channel(4);
        let stats = Arc::new(WorkerStats::new());
        let mut worker = Worker::new(&test_config(), rx, Arc::clone(&stats));

        let mut source = VecSource::default();
        source.push(interest_packet(FaceId(0), "/a"));
        let mut sink = RecordingSink::default();
        let shutdown = AtomicBool::new(false);

        // Drain exactly one burst by stopping after the first poll.
        let mut rx_batch = Vec::new();
        source.poll_burst(&mut rx_batch, 8);
        for rx in &rx_batch {
            worker.handle_packet(rx);
        }
        worker.flush_all(&mut sink);
        let _ = shutdown;

        assert_eq!(stats.int_recv.value(), 1);
        assert_eq!(stats.int_no_route.value(), 1);
    }

    #[test]
    fn end_to_end_interest_then_data_satisfies_and_caches() {
        let (tx, rx) = mpsc::sync_channel(4);
        let stats = Arc::new(WorkerStats::new());
        let mut worker = Worker::new(&test_config(), rx, Arc::clone(&stats));
        tx.send(FibUpdate::Add {
            prefix: Name::parse("/a").unwrap(),
            face: FaceId(2),
        })
        .unwrap();
        worker.drain_fib_updates();

        let mut sink = RecordingSink::default();

        // Interest arrives on face 1, matches FIB, forwards to face 2.
        let interest = interest_packet(FaceId(1), "/a/b");
        worker.handle_packet(&interest);
        worker.flush_all(&mut sink);
        assert_eq!(stats.int_fib_hit.value(), 1);
        assert_eq!(sink.sent.get(&2).map(|v| v.len()), Some(1));

        // Data comes back on face 2, should fan out to face 1 and cache.
        let data = data_packet(FaceId(2), "/a/b", b"payload");
        worker.handle_packet(&data);
        worker.flush_all(&mut sink);
        assert_eq!(stats.data_sent.value(), 1);
        assert_eq!(sink.sent.get(&1).map(|v| v.len()), Some(1));

        // A second Interest for the same name now hits the cache.
        let interest2 = interest_packet(FaceId(1), "/a/b");
        worker.handle_packet(&interest2);
        worker.flush_all(&mut sink);
        assert_eq!(stats.int_cs_hit.value(), 1);
    }

    #[test]
    fn fib_loop_is_detected_when_next_hop_is_arrival_face() {
        let (tx, rx) = mpsc::sync_channel(4);
        let stats = Arc::new(WorkerStats::new());
        let mut worker = Worker::new(&test_config(), rx, Arc::clone(&stats));
        tx.send(FibUpdate::Add {
            prefix: Name::parse("/a").unwrap(),
            face: FaceId(1),
        })
        .unwrap();
        worker.drain_fib_updates();

        let interest = interest_packet(FaceId(1), "/a/b");
        worker.handle_packet(&interest);
        assert_eq!(stats.int_fib_loop.value(), 1);
    }

    #[test]
    fn two_interests_for_the_same_name_aggregate_in_the_pit() {
        let (_tx, rx) = mpsc::sync_channel(4);
        let stats = Arc::new(WorkerStats::new());
        let mut worker = Worker::new(&test_config(), rx, Arc::clone(&stats));

        worker.handle_packet(&interest_packet(FaceId(1), "/a/b"));
        worker.handle_packet(&interest_packet(FaceId(3), "/a/b"));
        assert_eq!(stats.int_pit_hit.value(), 1);
    }
}
