//! The forwarding information base: longest-prefix-match over names.
//!
//! Grounded on `original_source/src/lib/fib/fib_hash_table.c`: an
//! append-only array of forwarding records, indexed by a CRC32 hash
//! bucket per distinct prefix length. Lookup tries the full name first,
//! then each shorter prefix in turn, and among several records that
//! share a matching prefix, picks a next hop uniformly at random.

use crate::bucket::{BucketTable, BUCKET_SIZE};
use rand::Rng;
use rust_udcn_common::face::FaceId;
use rust_udcn_common::name::{ComponentOffsets, Name};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FibAddResult {
    Ok,
    /// The table's append-only record array, or the target bucket, is full.
    Full,
    Invalid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FibDelResult {
    Ok,
    NotFound,
    Invalid,
}

struct FwdRecord {
    name: Name,
    face: FaceId,
}

pub struct Fib {
    buckets: BucketTable,
    records: Vec<FwdRecord>,
    max_elements: usize,
}

impl Fib {
    pub fn new(num_buckets: usize, max_elements: usize) -> Self {
        Self {
            buckets: BucketTable::new(num_buckets),
            records: Vec::with_capacity(max_elements),
            max_elements,
        }
    }

    /// Number of bucket slots currently occupied (i.e. live routes).
    pub fn len(&self) -> usize {
        (0..self.buckets.num_buckets())
            .flat_map(|b| self.buckets.bucket(b).slots.iter())
            .filter(|slot| slot.busy)
            .count()
    }

    /// Adds a forwarding record for `prefix -> face`. The record array is
    /// append-only: deleting an earlier entry never reclaims its slot in
    /// this array, only the hash bucket slot pointing at it.
    pub fn add(&mut self, prefix: &Name, face: FaceId) -> FibAddResult {
        if prefix.is_empty() {
            return FibAddResult::Invalid;
        }
        if self.records.len() >= self.max_elements {
            return FibAddResult::Full;
        }
        let crc = rust_udcn_common::crc::crc32(prefix.as_bytes());
        let bucket_idx = self.buckets.bucket_of(crc);
        let Some(free_tab) = self.buckets.free_slot(bucket_idx) else {
            return FibAddResult::Full;
        };
        let index = self.records.len() as u32;
        self.buckets.bucket_mut(bucket_idx).slots[free_tab] = crate::bucket::BucketSlot {
            busy: true,
            crc,
            index,
        };
        self.records.push(FwdRecord {
            name: *prefix,
            face,
        });
        FibAddResult::Ok
    }

    /// Removes the `prefix -> face` record, if present. Only the bucket
    /// slot is cleared; the record array itself never shrinks.
    pub fn del(&mut self, prefix: &Name, face: FaceId) -> FibDelResult {
        if prefix.is_empty() {
            return FibDelResult::Invalid;
        }
        let crc = rust_udcn_common::crc::crc32(prefix.as_bytes());
        let bucket_idx = self.buckets.bucket_of(crc);
        for i in 0..BUCKET_SIZE {
            let slot = self.buckets.bucket(bucket_idx).slots[i];
            if !slot.busy || slot.crc != crc {
                continue;
            }
            let rec = &self.records[slot.index as usize];
            if rec.name == *prefix && rec.face == face {
                self.buckets.bucket_mut(bucket_idx).slots[i].busy = false;
                return FibDelResult::Ok;
            }
        }
        FibDelResult::NotFound
    }

    /// Longest-prefix-match lookup. `full_crc` is the CRC32 of the
    /// complete name, already computed by the caller for the CS/PIT
    /// lookups; it is reused here for the longest (full-length) prefix
    /// instead of being recomputed.
    pub fn lookup(
        &self,
        name: &Name,
        offsets: &ComponentOffsets,
        full_crc: u32,
        rng: &mut impl Rng,
    ) -> Option<FaceId> {
        if offsets.count == 0 {
            return None;
        }
        let mut matches = [FaceId(0); BUCKET_SIZE];
        for k in (0..offsets.count).rev() {
            let prefix_len = offsets.prefix_len(k);
            let crc = if k == offsets.count - 1 {
                full_crc
            } else {
                rust_udcn_common::crc::crc32(&name.as_bytes()[..prefix_len])
            };
            let bucket_idx = self.buckets.bucket_of(crc);
            let mut n = 0usize;
            for slot in self.buckets.bucket(bucket_idx).slots.iter() {
                if !slot.busy || slot.crc != crc {
                    continue;
                }
                let rec = &self.records[slot.index as usize];
                if rec.name.len() == prefix_len && rec.name.as_bytes() == &name.as_bytes()[..prefix_len]
                {
                    matches[n] = rec.face;
                    n += 1;
                }
            }
            if n > 0 {
                let pick = if n == 1 { 0 } else { rng.gen_range(0..n) };
                return Some(matches[pick]);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn rng() -> impl Rng {
        rand::rngs::StdRng::seed_from_u64(1)
    }

    #[test]
    fn longest_prefix_wins() {
        let mut fib = Fib::new(16, 8);
        assert_eq!(fib.add(&Name::parse("/a").unwrap(), FaceId(1)), FibAddResult::Ok);
        assert_eq!(
            fib.add(&Name::parse("/a/b").unwrap(), FaceId(2)),
            FibAddResult::Ok
        );

        let name = Name::parse("/a/b/c").unwrap();
        let offsets = name.component_offsets();
        let full_crc = rust_udcn_common::crc::crc32(name.as_bytes());
        let mut r = rng();
        assert_eq!(fib.lookup(&name, &offsets, full_crc, &mut r), Some(FaceId(2)));
    }

    #[test]
    fn falls_back_to_shorter_prefix_when_no_exact_match() {
        let mut fib = Fib::new(16, 8);
        fib.add(&Name::parse("/a").unwrap(), FaceId(1));

        let name = Name::parse("/a/b/c").unwrap();
        let offsets = name.component_offsets();
        let full_crc = rust_udcn_common::crc::crc32(name.as_bytes());
        let mut r = rng();
        assert_eq!(fib.lookup(&name, &offsets, full_crc, &mut r), Some(FaceId(1)));
    }

    #[test]
    fn no_route_returns_none() {
        let fib = Fib::new(16, 8);
        let name = Name::parse("/z").unwrap();
        let offsets = name.component_offsets();
        let full_crc = rust_udcn_common::crc::crc32(name.as_bytes());
        let mut r = rng();
        assert_eq!(fib.lookup(&name, &offsets, full_crc, &mut r), None);
    }

    #[test]
    fn delete_then_lookup_misses() {
        let mut fib = Fib::new(16, 8);
        let prefix = Name::parse("/a").unwrap();
        fib.add(&prefix, FaceId(1));
        assert_eq!(fib.del(&prefix, FaceId(1)), FibDelResult::Ok);
        assert_eq!(fib.del(&prefix, FaceId(1)), FibDelResult::NotFound);

        let name = Name::parse("/a").unwrap();
        let offsets = name.component_offsets();
        let full_crc = rust_udcn_common::crc::crc32(name.as_bytes());
        let mut r = rng();
        assert_eq!(fib.lookup(&name, &offsets, full_crc, &mut r), None);
    }

    #[test]
    fn full_table_rejects_further_adds() {
        let mut fib = Fib::new(4, 1);
        assert_eq!(fib.add(&Name::parse("/a").unwrap(), FaceId(1)), FibAddResult::Ok);
        assert_eq!(
            fib.add(&Name::parse("/b").unwrap(), FaceId(1)),
            FibAddResult::Full
        );
    }

    #[test]
    fn multipath_pick_is_one_of_the_registered_faces() {
        let mut fib = Fib::new(16, 8);
        let prefix = Name::parse("/a").unwrap();
        fib.add(&prefix, FaceId(1));
        fib.add(&prefix, FaceId(2));

        let offsets = prefix.component_offsets();
        let full_crc = rust_udcn_common::crc::crc32(prefix.as_bytes());
        let mut r = rng();
        let face = fib.lookup(&prefix, &offsets, full_crc, &mut r).unwrap();
        assert!(face == FaceId(1) || face == FaceId(2));
    }
}
