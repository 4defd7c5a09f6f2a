//! The 7-slot hash bucket shared by the FIB, PIT and content store.
//!
//! `original_source` defines this shape three times, once per table
//! (`fib_htbl_bucket`, and the equivalent in `pit.h`/`cs.h`), each sized
//! to fit one 64-byte cache line: a "busy" flag and a CRC32 per slot,
//! plus an index into that table's own backing array. This module
//! generalizes the shape once; each table still owns its own array of
//! buckets and its own backing storage.

/// Number of slots per bucket. Matches `BUCKET_SIZE` in the original C
/// source, chosen so `[bool; 7] + [(u32, u32); 7]` fits one cache line.
pub const BUCKET_SIZE: usize = 7;

#[derive(Debug, Clone, Copy, Default)]
pub struct BucketSlot {
    pub busy: bool,
    pub crc: u32,
    /// Index into the owning table's backing array.
    pub index: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct Bucket {
    pub slots: [BucketSlot; BUCKET_SIZE],
}

impl Default for Bucket {
    fn default() -> Self {
        Self {
            slots: [BucketSlot::default(); BUCKET_SIZE],
        }
    }
}

/// A flat array of buckets, indexed by `crc % num_buckets`.
#[derive(Debug)]
pub struct BucketTable {
    buckets: Vec<Bucket>,
}

impl BucketTable {
    pub fn new(num_buckets: usize) -> Self {
        assert!(num_buckets > 0, "a hash table needs at least one bucket");
        Self {
            buckets: vec![Bucket::default(); num_buckets],
        }
    }

    pub fn num_buckets(&self) -> usize {
        self.buckets.len()
    }

    pub fn bucket_of(&self, crc: u32) -> usize {
        crc as usize % self.buckets.len()
    }

    pub fn bucket(&self, idx: usize) -> &Bucket {
        &self.buckets[idx]
    }

    pub fn bucket_mut(&mut self, idx: usize) -> &mut Bucket {
        &mut self.buckets[idx]
    }

    /// Finds the first free slot in a bucket, if any.
    pub fn free_slot(&self, bucket_idx: usize) -> Option<usize> {
        self.buckets[bucket_idx]
            .slots
            .iter()
            .position(|slot| !slot.busy)
    }
}
