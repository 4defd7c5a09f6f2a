//! The pending interest table: aggregates in-flight Interests by name
//! and remembers which faces are waiting for the matching Data.
//!
//! Grounded on `original_source/src/lib/pit/pit.c`. Bucket arena plus a
//! ring-buffer backing store sized `max_elements + 1`; insertion and
//! match happen in a single bucket scan that also tracks the first free
//! slot, so a miss that needs to insert never re-scans the bucket.

use crate::bucket::{BucketSlot, BucketTable, BUCKET_SIZE};
use crate::ring;
use rust_udcn_common::face::{FaceBitmask, FaceId};
use rust_udcn_common::name::Name;
use rust_udcn_common::time::Ticks;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PitUpdateOutcome {
    /// A new entry was created for this Interest.
    Inserted,
    /// An existing entry for the same name recorded this arrival face too.
    Aggregated,
    /// No existing entry matched and none could be created (ring or
    /// bucket full).
    Full,
}

#[derive(Clone)]
struct PitEntry {
    active: bool,
    bucket: u32,
    tab: u8,
    expiry: Ticks,
    name: Name,
    face_bitmask: FaceBitmask,
}

impl Default for PitEntry {
    fn default() -> Self {
        Self {
            active: false,
            bucket: 0,
            tab: 0,
            expiry: 0,
            name: Name::default(),
            face_bitmask: FaceBitmask::empty(),
        }
    }
}

pub struct Pit {
    buckets: BucketTable,
    ring: Vec<PitEntry>,
    top: usize,
    bottom: usize,
    ttl_ticks: Ticks,
}

impl Pit {
    pub fn new(num_buckets: usize, max_elements: usize, ttl_ticks: Ticks) -> Self {
        let capacity = max_elements + 1;
        Self {
            buckets: BucketTable::new(num_buckets),
            ring: vec![PitEntry::default(); capacity],
            top: 0,
            bottom: 0,
            ttl_ticks,
        }
    }

    pub fn is_empty(&self) -> bool {
        ring::is_empty(self.top, self.bottom)
    }

    pub fn is_full(&self) -> bool {
        ring::is_full(self.top, self.bottom, self.ring.len())
    }

    pub fn occupancy(&self) -> usize {
        ring::occupancy(self.top, self.bottom, self.ring.len())
    }

    /// Looks for an existing entry for `name`; if found, records `face`
    /// as an additional arrival and returns [`Aggregated`](PitUpdateOutcome::Aggregated).
    /// Otherwise inserts a fresh entry expiring at `now + ttl`.
    pub fn lookup_and_update(&mut self, name: &Name, crc: u32, face: FaceId, now: Ticks) -> PitUpdateOutcome {
        let bucket_idx = self.buckets.bucket_of(crc);
        let mut free_tab: Option<usize> = None;
        let mut matched: Option<usize> = None;

        for i in 0..BUCKET_SIZE {
            let slot = self.buckets.bucket(bucket_idx).slots[i];
            if !slot.busy {
                if free_tab.is_none() {
                    free_tab = Some(i);
                }
                continue;
            }
            if slot.crc != crc {
                continue;
            }
            if self.ring[slot.index as usize].name.as_bytes() == name.as_bytes() {
                matched = Some(slot.index as usize);
                break;
            }
        }

        if let Some(ring_idx) = matched {
            self.ring[ring_idx].face_bitmask.set(face);
            return PitUpdateOutcome::Aggregated;
        }

        let Some(free_tab) = free_tab else {
            return PitUpdateOutcome::Full;
        };
        if self.is_full() {
            return PitUpdateOutcome::Full;
        }

        let ring_idx = self.top;
        self.buckets.bucket_mut(bucket_idx).slots[free_tab] = BucketSlot {
            busy: true,
            crc,
            index: ring_idx as u32,
        };
        self.ring[ring_idx] = PitEntry {
            active: true,
            bucket: bucket_idx as u32,
            tab: free_tab as u8,
            expiry: now + self.ttl_ticks,
            name: *name,
            face_bitmask: FaceBitmask::single(face),
        };
        self.top = ring::advance(self.top, self.ring.len());
        PitUpdateOutcome::Inserted
    }

    /// Removes the entry matching `name`, if any, returning the set of
    /// faces that were waiting on it (empty if there was no match).
    pub fn lookup_and_remove(&mut self, name: &Name, crc: u32) -> FaceBitmask {
        let bucket_idx = self.buckets.bucket_of(crc);
        for i in 0..BUCKET_SIZE {
            let slot = self.buckets.bucket(bucket_idx).slots[i];
            if !slot.busy || slot.crc != crc {
                continue;
            }
            let ring_idx = slot.index as usize;
            if self.ring[ring_idx].name.as_bytes() != name.as_bytes() {
                continue;
            }
            self.buckets.bucket_mut(bucket_idx).slots[i].busy = false;
            self.ring[ring_idx].active = false;
            let mask = self.ring[ring_idx].face_bitmask;
            if self.bottom == ring_idx {
                self.bottom = ring::advance(self.bottom, self.ring.len());
            }
            return mask;
        }
        FaceBitmask::empty()
    }

    /// Sweeps expired entries off the bottom of the ring. Entries expire
    /// in FIFO order (insertion order == expiry order, since the TTL is
    /// constant), so this stops at the first still-live entry.
    pub fn purge_expired(&mut self, now: Ticks) -> u32 {
        let mut purged = 0u32;
        while !self.is_empty() {
            let entry = &self.ring[self.bottom];
            if entry.active {
                if entry.expiry > now {
                    break;
                }
                let (b, t) = (entry.bucket as usize, entry.tab as usize);
                self.ring[self.bottom].active = false;
                self.buckets.bucket_mut(b).slots[t].busy = false;
            }
            self.bottom = ring::advance(self.bottom, self.ring.len());
            purged += 1;
        }
        purged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_udcn_common::crc::crc32;

    fn crc_of(name: &Name) -> u32 {
        crc32(name.as_bytes())
    }

    #[test]
    fn first_interest_inserts_second_aggregates() {
        let mut pit = Pit::new(16, 8, 1_000);
        let name = Name::parse("/a/b").unwrap();
        let crc = crc_of(&name);

        assert_eq!(
            pit.lookup_and_update(&name, crc, FaceId(1), 0),
            PitUpdateOutcome::Inserted
        );
        assert_eq!(
            pit.lookup_and_update(&name, crc, FaceId(2), 10),
            PitUpdateOutcome::Aggregated
        );

        let mask = pit.lookup_and_remove(&name, crc);
        assert!(mask.contains(FaceId(1)));
        assert!(mask.contains(FaceId(2)));
    }

    #[test]
    fn remove_on_unknown_name_returns_empty_mask() {
        let mut pit = Pit::new(16, 8, 1_000);
        let name = Name::parse("/z").unwrap();
        let mask = pit.lookup_and_remove(&name, crc_of(&name));
        assert!(mask.is_empty());
    }

    #[test]
    fn expired_entries_are_purged_fifo() {
        let mut pit = Pit::new(16, 8, 100);
        let a = Name::parse("/a").unwrap();
        let b = Name::parse("/b").unwrap();
        pit.lookup_and_update(&a, crc_of(&a), FaceId(1), 0);
        pit.lookup_and_update(&b, crc_of(&b), FaceId(1), 50);

        // /a expires at exactly 100 and is purged; /b (expiring at 150) is not.
        assert_eq!(pit.purge_expired(100), 1);
        // /b expires at 150; at t=150 it is gone too.
        assert_eq!(pit.purge_expired(150), 1);
        assert!(pit.is_empty());
    }

    #[test]
    fn ring_reports_full_when_at_capacity() {
        let mut pit = Pit::new(16, 2, 1_000);
        let a = Name::parse("/a").unwrap();
        let b = Name::parse("/b").unwrap();
        let c = Name::parse("/c").unwrap();
        assert_eq!(
            pit.lookup_and_update(&a, crc_of(&a), FaceId(1), 0),
            PitUpdateOutcome::Inserted
        );
        assert_eq!(
            pit.lookup_and_update(&b, crc_of(&b), FaceId(1), 0),
            PitUpdateOutcome::Inserted
        );
        assert_eq!(
            pit.lookup_and_update(&c, crc_of(&c), FaceId(1), 0),
            PitUpdateOutcome::Full
        );
    }
}
