//! Scanner module containing the network mapper

pub mod mapper;

use crate::probe::ProbeOutcome;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use mapper::NetworkMapper;

/// Complete scan result: the confirmed addresses plus how every probe ended
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport<A> {
    /// Addresses whose probe confirmed the protocol, in completion-independent order
    pub supported: Vec<A>,

    /// Scan statistics
    pub stats: ScanStats,
}

impl<A> ScanReport<A> {
    pub fn new() -> Self {
        Self {
            supported: Vec::new(),
            stats: ScanStats::default(),
        }
    }

    /// Account for one finished probe
    pub fn record(&mut self, addr: A, outcome: ProbeOutcome) {
        self.stats.record(outcome);
        if outcome.is_supported() {
            self.supported.push(addr);
        }
    }

    /// Set the scan duration
    pub fn set_duration(&mut self, duration: Duration) {
        self.stats.duration = duration;
    }
}

impl<A> Default for ScanReport<A> {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-outcome probe counters for a scan
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanStats {
    /// Number of probes run
    pub probed: usize,

    pub supported: usize,
    pub unsupported: usize,
    pub unreachable: usize,
    pub errored: usize,

    /// Wall-clock time from first spawn to last join
    pub duration: Duration,
}

impl ScanStats {
    fn record(&mut self, outcome: ProbeOutcome) {
        self.probed += 1;
        match outcome {
            ProbeOutcome::Supported => self.supported += 1,
            ProbeOutcome::Unsupported => self.unsupported += 1,
            ProbeOutcome::Unreachable => self.unreachable += 1,
            ProbeOutcome::Errored => self.errored += 1,
        }
    }

    /// Probes per second achieved
    pub fn probe_rate(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.probed as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }
}
