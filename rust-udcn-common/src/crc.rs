//! CRC32 hashing used to key every FIB/PIT/CS bucket.

/// Hashes a name (or name prefix) into the 32-bit key used to index a
/// hash bucket. Collisions are resolved by the full byte comparison each
/// table does against its stored record, same as `original_source`'s
/// `fib_hash_table.c` does with its own hand-rolled CRC32.
pub fn crc32(bytes: &[u8]) -> u32 {
    crc32fast::hash(bytes)
}
