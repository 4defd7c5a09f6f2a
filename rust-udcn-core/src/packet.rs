//! Packet buffers and the boundary to external packet I/O.
//!
//! NIC polling, Ethernet/IPv4 framing and the actual send/receive system
//! calls are external to this crate (the spec this router implements
//! treats them as collaborators whose contract matters, not their
//! implementation). [`PacketSource`] and [`PacketSink`] are that
//! contract; [`NullSource`]/[`NullSink`] and the in-memory pair in this
//! module's tests are the only implementations this crate itself needs.

use rust_udcn_common::face::FaceId;
use std::sync::Arc;

/// IPv4 protocol number reserved for ICN, matching `original_source`'s
/// `IPPROTO_ICN`. Packets arriving tagged with anything else are dropped
/// before parsing even starts.
pub const IPPROTO_ICN: u8 = 253;

pub type PacketBuf = Arc<Vec<u8>>;

/// A packet as handed to the forwarding engine by the (external) NIC
/// layer, which is assumed to have already stripped the Ethernet and
/// IPv4 framing and to report the IPv4 protocol number it found.
pub struct RxPacket {
    pub face: FaceId,
    pub ip_protocol: u8,
    pub payload: PacketBuf,
}

/// A packet queued for transmission on a face.
pub struct TxPacket {
    pub payload: PacketBuf,
}

/// Supplies bursts of received packets. A single call never blocks for
/// longer than it takes to check "is anything ready".
pub trait PacketSource {
    /// Appends up to `max` packets to `out`, returning how many were added.
    fn poll_burst(&mut self, out: &mut Vec<RxPacket>, max: usize) -> usize;
}

/// Accepts bursts of packets for transmission on a face.
pub trait PacketSink {
    /// Attempts to transmit every packet in `batch` on `face`, returning
    /// how many were accepted. The caller drops whatever's left over and
    /// counts it as a NIC-side drop.
    fn transmit_burst(&mut self, face: FaceId, batch: &[TxPacket]) -> usize;
}

/// A source that never has anything to offer; used when the binary is
/// run without a live NIC backend wired up.
pub struct NullSource;

impl PacketSource for NullSource {
    fn poll_burst(&mut self, _out: &mut Vec<RxPacket>, _max: usize) -> usize {
        0
    }
}

/// A sink that accepts and discards everything, standing in for a real
/// NIC transmit path.
pub struct NullSink;

impl PacketSink for NullSink {
    fn transmit_burst(&mut self, _face: FaceId, batch: &[TxPacket]) -> usize {
        batch.len()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::collections::VecDeque;

    /// Feeds a fixed, pre-loaded sequence of packets, one burst per call.
    #[derive(Default)]
    pub struct VecSource {
        pending: VecDeque<RxPacket>,
    }

    impl VecSource {
        pub fn push(&mut self, rx: RxPacket) {
            self.pending.push_back(rx);
        }
    }

    impl PacketSource for VecSource {
        fn poll_burst(&mut self, out: &mut Vec<RxPacket>, max: usize) -> usize {
            let mut n = 0;
            while n < max {
                let Some(rx) = self.pending.pop_front() else {
                    break;
                };
                out.push(rx);
                n += 1;
            }
            n
        }
    }

    /// Records every transmitted packet, per face, for assertions.
    #[derive(Default)]
    pub struct RecordingSink {
        pub sent: std::collections::HashMap<u8, Vec<PacketBuf>>,
    }

    impl PacketSink for RecordingSink {
        fn transmit_burst(&mut self, face: FaceId, batch: &[TxPacket]) -> usize {
            let entry = self.sent.entry(face.0).or_default();
            for pkt in batch {
                entry.push(Arc::clone(&pkt.payload));
            }
            batch.len()
        }
    }
}
