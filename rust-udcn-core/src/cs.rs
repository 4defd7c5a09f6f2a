//! The content store: a FIFO cache of recently forwarded Data packets.
//!
//! Grounded on `original_source/src/lib/cs/cs.h`: same bucket+ring shape
//! as the PIT, but with no TTL — eviction is purely FIFO, triggered by
//! insertion into a full ring. Cached payloads are refcounted so a cache
//! hit can hand out a shared clone without copying bytes; `Arc` plays
//! exactly the role the original's "acquire an extra reference on the
//! mbuf" comment describes.

use crate::bucket::{BucketSlot, BucketTable, BUCKET_SIZE};
use crate::ring;
use rust_udcn_common::name::Name;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsInsertResult {
    Ok,
    /// The target bucket's 7 slots are all occupied by distinct CRCs.
    BucketOverflow,
}

struct CsEntry {
    active: bool,
    bucket: u32,
    tab: u8,
    name: Name,
    payload: Option<Arc<Vec<u8>>>,
}

impl Default for CsEntry {
    fn default() -> Self {
        Self {
            active: false,
            bucket: 0,
            tab: 0,
            name: Name::default(),
            payload: None,
        }
    }
}

pub struct Cs {
    buckets: BucketTable,
    ring: Vec<CsEntry>,
    top: usize,
    bottom: usize,
}

impl Cs {
    pub fn new(num_buckets: usize, max_elements: usize) -> Self {
        let capacity = max_elements + 1;
        Self {
            buckets: BucketTable::new(num_buckets),
            ring: (0..capacity).map(|_| CsEntry::default()).collect(),
            top: 0,
            bottom: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        ring::is_empty(self.top, self.bottom)
    }

    pub fn occupancy(&self) -> usize {
        ring::occupancy(self.top, self.bottom, self.ring.len())
    }

    /// Inserts `payload` under `name`. Only evicts the ring's oldest entry
    /// once the target bucket is confirmed to have a free slot for the
    /// new one; a bucket that is already full of other names returns
    /// [`BucketOverflow`](CsInsertResult::BucketOverflow) untouched, the
    /// ring's FIFO tail intact.
    pub fn insert(&mut self, name: &Name, crc: u32, payload: Arc<Vec<u8>>) -> CsInsertResult {
        let bucket_idx = self.buckets.bucket_of(crc);
        let Some(free_tab) = self.buckets.free_slot(bucket_idx) else {
            return CsInsertResult::BucketOverflow;
        };

        if ring::is_full(self.top, self.bottom, self.ring.len()) {
            let evicted = &self.ring[self.bottom];
            if evicted.active {
                let (b, t) = (evicted.bucket as usize, evicted.tab as usize);
                self.buckets.bucket_mut(b).slots[t].busy = false;
            }
            self.ring[self.bottom] = CsEntry::default();
            self.bottom = ring::advance(self.bottom, self.ring.len());
        }

        let ring_idx = self.top;
        self.buckets.bucket_mut(bucket_idx).slots[free_tab] = BucketSlot {
            busy: true,
            crc,
            index: ring_idx as u32,
        };
        self.ring[ring_idx] = CsEntry {
            active: true,
            bucket: bucket_idx as u32,
            tab: free_tab as u8,
            name: *name,
            payload: Some(payload),
        };
        self.top = ring::advance(self.top, self.ring.len());
        CsInsertResult::Ok
    }

    /// Returns a cheap clone of the cached payload, if present.
    pub fn lookup(&self, name: &Name, crc: u32) -> Option<Arc<Vec<u8>>> {
        let bucket_idx = self.buckets.bucket_of(crc);
        for i in 0..BUCKET_SIZE {
            let slot = self.buckets.bucket(bucket_idx).slots[i];
            if !slot.busy || slot.crc != crc {
                continue;
            }
            let entry = &self.ring[slot.index as usize];
            if entry.name.as_bytes() == name.as_bytes() {
                return entry.payload.clone();
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_udcn_common::crc::crc32;

    fn payload(bytes: &[u8]) -> Arc<Vec<u8>> {
        Arc::new(bytes.to_vec())
    }

    #[test]
    fn insert_then_lookup_hits() {
        let mut cs = Cs::new(16, 4);
        let name = Name::parse("/a/b").unwrap();
        let crc = crc32(name.as_bytes());
        cs.insert(&name, crc, payload(b"hello"));
        let hit = cs.lookup(&name, crc).unwrap();
        assert_eq!(&hit[..], b"hello");
    }

    #[test]
    fn fifo_eviction_on_overflow() {
        let mut cs = Cs::new(16, 2);
        let a = Name::parse("/a").unwrap();
        let b = Name::parse("/b").unwrap();
        let c = Name::parse("/c").unwrap();
        cs.insert(&a, crc32(a.as_bytes()), payload(b"a"));
        cs.insert(&b, crc32(b.as_bytes()), payload(b"b"));
        cs.insert(&c, crc32(c.as_bytes()), payload(b"c"));

        assert!(cs.lookup(&a, crc32(a.as_bytes())).is_none());
        assert!(cs.lookup(&b, crc32(b.as_bytes())).is_some());
        assert!(cs.lookup(&c, crc32(c.as_bytes())).is_some());
    }

    #[test]
    fn miss_returns_none() {
        let cs = Cs::new(16, 4);
        let name = Name::parse("/z").unwrap();
        assert!(cs.lookup(&name, crc32(name.as_bytes())).is_none());
    }

    #[test]
    fn cache_hit_shares_the_same_allocation() {
        let mut cs = Cs::new(16, 4);
        let name = Name::parse("/a").unwrap();
        let crc = crc32(name.as_bytes());
        let original = payload(b"data");
        cs.insert(&name, crc, Arc::clone(&original));
        let hit = cs.lookup(&name, crc).unwrap();
        assert!(Arc::ptr_eq(&original, &hit));
    }
}
