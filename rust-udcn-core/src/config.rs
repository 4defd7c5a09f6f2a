//! Router configuration: compiled-in defaults, optionally overridden by
//! a TOML file via the teacher's `config` crate (previously declared in
//! the workspace manifest but never wired to anything).

use rust_udcn_common::error::Error;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    pub fib_buckets: usize,
    pub fib_max_elements: usize,
    pub pit_buckets: usize,
    pub pit_max_elements: usize,
    pub pit_ttl_us: u64,
    pub cs_buckets: usize,
    pub cs_max_elements: usize,
    /// Packets pulled per `poll_burst` call.
    pub max_pkt_burst: usize,
    /// How far ahead the worker loop prefetches while processing a burst.
    pub prefetch_offset: usize,
    /// How long a per-face transmit batch may sit unflushed.
    pub drain_deadline_us: u64,
    /// How often the PIT is swept for expired entries.
    pub purge_deadline_us: u64,
    /// UDP port the controller listens on.
    pub control_port: u16,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            fib_buckets: 1024,
            fib_max_elements: 4096,
            pit_buckets: 2048,
            pit_max_elements: 8192,
            pit_ttl_us: 2_000_000,
            cs_buckets: 4096,
            cs_max_elements: 16384,
            max_pkt_burst: 32,
            prefetch_offset: 3,
            drain_deadline_us: 100,
            purge_deadline_us: 20_000_000,
            control_port: 9000,
        }
    }
}

impl RouterConfig {
    /// Loads defaults, then overlays `path` (a TOML file) on top if given.
    pub fn load(path: Option<&str>) -> Result<Self, Error> {
        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&Self::default()).map_err(|e| {
                Error::Config(format!("failed to seed defaults: {}", e))
            })?);
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path));
        }
        let settings = builder
            .build()
            .map_err(|e| Error::Config(format!("failed to build config: {}", e)))?;
        settings
            .try_deserialize()
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))
    }
}

impl From<&RouterConfig> for crate::worker::WorkerConfig {
    fn from(cfg: &RouterConfig) -> Self {
        crate::worker::WorkerConfig {
            fib_buckets: cfg.fib_buckets,
            fib_max_elements: cfg.fib_max_elements,
            pit_buckets: cfg.pit_buckets,
            pit_max_elements: cfg.pit_max_elements,
            pit_ttl_ticks: rust_udcn_common::time::micros_to_ticks(cfg.pit_ttl_us),
            cs_buckets: cfg.cs_buckets,
            cs_max_elements: cfg.cs_max_elements,
            max_pkt_burst: cfg.max_pkt_burst,
            prefetch_offset: cfg.prefetch_offset,
            drain_deadline_ticks: rust_udcn_common::time::micros_to_ticks(cfg.drain_deadline_us),
            purge_deadline_ticks: rust_udcn_common::time::micros_to_ticks(cfg.purge_deadline_us),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_load_without_a_file() {
        let cfg = RouterConfig::load(None).unwrap();
        assert_eq!(cfg.control_port, 9000);
        assert_eq!(cfg.max_pkt_burst, 32);
    }
}
