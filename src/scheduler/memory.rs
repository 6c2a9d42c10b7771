//! Host resource queries
//!
//! Logical core count and memory probes feeding the scheduler's parallel
//! decision and the cache's adaptive sizing. Memory figures come from Linux
//! procfs; on other platforms the probes report zero, which callers treat
//! as "unknown, assume no pressure".

use std::num::NonZeroUsize;

/// Logical core count, with a fallback of 1 when detection fails.
pub fn logical_cores() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Point-in-time memory figures in kilobytes. Zero means unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemorySnapshot {
    pub total_kb: u64,
    pub available_kb: u64,
    pub process_rss_kb: u64,
}

/// Coarse pressure classification derived from a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryPressure {
    Low,
    High,
    Critical,
}

impl MemorySnapshot {
    pub fn capture() -> Self {
        capture_impl()
    }

    /// Fraction of host memory in use, or None when the probe is unavailable.
    pub fn used_fraction(&self) -> Option<f64> {
        if self.total_kb == 0 {
            return None;
        }
        let used = self.total_kb.saturating_sub(self.available_kb);
        Some(used as f64 / self.total_kb as f64)
    }

    /// Fraction of host memory held by this process, or None when unknown.
    pub fn process_fraction(&self) -> Option<f64> {
        if self.total_kb == 0 || self.process_rss_kb == 0 {
            return None;
        }
        Some(self.process_rss_kb as f64 / self.total_kb as f64)
    }

    /// Classify pressure against the configured threshold. Either the host
    /// as a whole or this process's resident set crossing the threshold
    /// counts. Unknown figures classify as Low so platforms without probes
    /// never throttle.
    pub fn pressure(&self, threshold: f64) -> MemoryPressure {
        let host = self.used_fraction().unwrap_or(0.0);
        let process = self.process_fraction().unwrap_or(0.0);
        if host >= 0.95 {
            MemoryPressure::Critical
        } else if host >= threshold || process >= threshold {
            MemoryPressure::High
        } else {
            MemoryPressure::Low
        }
    }
}

#[cfg(target_os = "linux")]
fn capture_impl() -> MemorySnapshot {
    let mut snapshot = MemorySnapshot::default();

    if let Ok(meminfo) = std::fs::read_to_string("/proc/meminfo") {
        for line in meminfo.lines() {
            if let Some(rest) = line.strip_prefix("MemTotal:") {
                snapshot.total_kb = parse_kb(rest);
            } else if let Some(rest) = line.strip_prefix("MemAvailable:") {
                snapshot.available_kb = parse_kb(rest);
            }
        }
    }

    if let Ok(statm) = std::fs::read_to_string("/proc/self/statm") {
        if let Some(resident_pages) = statm.split_whitespace().nth(1) {
            if let Ok(pages) = resident_pages.parse::<u64>() {
                // statm reports pages; assume the common 4KiB page size.
                snapshot.process_rss_kb = pages * 4;
            }
        }
    }

    snapshot
}

#[cfg(not(target_os = "linux"))]
fn capture_impl() -> MemorySnapshot {
    MemorySnapshot::default()
}

#[cfg(target_os = "linux")]
fn parse_kb(rest: &str) -> u64 {
    rest.split_whitespace()
        .next()
        .and_then(|value| value.parse().ok())
        .unwrap_or(0)
}
