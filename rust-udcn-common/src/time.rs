//! Monotonic tick source used for PIT expiry and timer deadlines.
//!
//! The original implementation counts CPU TSC cycles and converts a
//! configured TTL in microseconds into cycles once, at table-creation
//! time. Safe userspace Rust has no portable TSC read, so ticks here
//! are microseconds directly off `std::time::Instant` — the TTL is
//! already in the same unit, so no conversion step is needed, but we
//! still expose `micros_to_ticks` so callers read like the original.

use std::time::Instant;

pub type Ticks = u64;

#[derive(Debug)]
pub struct Clock {
    epoch: Instant,
}

impl Clock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }

    /// Ticks elapsed since this clock was created.
    pub fn now_ticks(&self) -> Ticks {
        self.epoch.elapsed().as_micros() as Ticks
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

/// One tick equals one microsecond; kept as a named conversion so PIT
/// construction reads the same way the original's cycles-per-microsecond
/// setup does, even though the factor here is 1.
pub fn micros_to_ticks(micros: u64) -> Ticks {
    micros
}
