//! Bandwidth accounting for cached rectangle transfers.
//!
//! The [`BandwidthLedger`] counts what the cache protocol actually put on
//! the wire (references and inits) next to an estimate of what the same
//! rectangles would have cost without caching, and summarizes the savings.
//!
//! # Example
//!
//! ```
//! use rectcache::BandwidthLedger;
//!
//! let ledger = BandwidthLedger::new();
//!
//! // A 16KB rectangle sent once in full, then referenced with a 24 byte message.
//! ledger.record_init(16_384, 16_384);
//! ledger.record_reference(24, 16_384);
//!
//! let summary = ledger.summary();
//! assert_eq!(summary.sent_bytes(), 16_408);
//! assert_eq!(summary.baseline_bytes, 32_768);
//! assert!(summary.reduction_percent() > 49.0);
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Per-connection byte counters.
///
/// All counters are atomics so the ledger can be shared behind an `Arc`
/// between the session and whatever reports on it.
#[derive(Debug, Default)]
pub struct BandwidthLedger {
    reference_count: AtomicU64,
    reference_bytes: AtomicU64,
    init_count: AtomicU64,
    init_bytes: AtomicU64,
    baseline_bytes: AtomicU64,
}

impl BandwidthLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a reference message of `wire_bytes` that stood in for an
    /// uncached transfer estimated at `alternative_bytes`.
    pub fn record_reference(&self, wire_bytes: usize, alternative_bytes: usize) {
        self.reference_count.fetch_add(1, Ordering::Relaxed);
        self.reference_bytes
            .fetch_add(wire_bytes as u64, Ordering::Relaxed);
        self.baseline_bytes
            .fetch_add(alternative_bytes as u64, Ordering::Relaxed);
    }

    /// Records an init message carrying a full payload.
    pub fn record_init(&self, wire_bytes: usize, alternative_bytes: usize) {
        self.init_count.fetch_add(1, Ordering::Relaxed);
        self.init_bytes.fetch_add(wire_bytes as u64, Ordering::Relaxed);
        self.baseline_bytes
            .fetch_add(alternative_bytes as u64, Ordering::Relaxed);
    }

    pub fn summary(&self) -> LedgerSummary {
        LedgerSummary {
            reference_count: self.reference_count.load(Ordering::Relaxed),
            reference_bytes: self.reference_bytes.load(Ordering::Relaxed),
            init_count: self.init_count.load(Ordering::Relaxed),
            init_bytes: self.init_bytes.load(Ordering::Relaxed),
            baseline_bytes: self.baseline_bytes.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        self.reference_count.store(0, Ordering::Relaxed);
        self.reference_bytes.store(0, Ordering::Relaxed);
        self.init_count.store(0, Ordering::Relaxed);
        self.init_bytes.store(0, Ordering::Relaxed);
        self.baseline_bytes.store(0, Ordering::Relaxed);
    }
}

/// A snapshot of a [`BandwidthLedger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LedgerSummary {
    pub reference_count: u64,
    pub reference_bytes: u64,
    pub init_count: u64,
    pub init_bytes: u64,
    /// Estimated bytes the same rectangles would have cost uncached.
    pub baseline_bytes: u64,
}

impl LedgerSummary {
    /// Bytes the cache protocol actually sent.
    pub fn sent_bytes(&self) -> u64 {
        self.reference_bytes + self.init_bytes
    }

    pub fn saved_bytes(&self) -> u64 {
        self.baseline_bytes.saturating_sub(self.sent_bytes())
    }

    /// `(baseline - sent) / baseline * 100`.
    ///
    /// Negative when protocol overhead outweighed the savings; zero when
    /// nothing has been recorded.
    pub fn reduction_percent(&self) -> f64 {
        if self.baseline_bytes == 0 {
            return 0.0;
        }
        let baseline = self.baseline_bytes as f64;
        (baseline - self.sent_bytes() as f64) / baseline * 100.0
    }
}

impl fmt::Display for LedgerSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} references ({}), {} inits ({}), {} sent vs {} uncached: {:.1}% reduction",
            self.reference_count,
            format_bytes(self.reference_bytes),
            self.init_count,
            format_bytes(self.init_bytes),
            format_bytes(self.sent_bytes()),
            format_bytes(self.baseline_bytes),
            self.reduction_percent()
        )
    }
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64;
    let mut unit = "B";
    for next in UNITS {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = next;
    }
    format!("{:.1} {}", value, unit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_reduction_matches_formula() {
        let ledger = BandwidthLedger::new();
        ledger.record_reference(30, 12_000);

        let summary = ledger.summary();
        let expected = (12_000.0 - 30.0) / 12_000.0 * 100.0;
        assert!((summary.reduction_percent() - expected).abs() < 1e-9);
        assert_eq!(summary.saved_bytes(), 11_970);
    }

    #[test]
    fn test_empty_ledger() {
        let summary = BandwidthLedger::new().summary();
        assert_eq!(summary.reduction_percent(), 0.0);
        assert_eq!(summary.sent_bytes(), 0);
    }

    #[test]
    fn test_overhead_can_be_negative() {
        let ledger = BandwidthLedger::new();
        ledger.record_init(1_100, 1_000);
        assert!(ledger.summary().reduction_percent() < 0.0);
        assert_eq!(ledger.summary().saved_bytes(), 0);
    }

    #[test]
    fn test_shared_counters() {
        let ledger = Arc::new(BandwidthLedger::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ledger = Arc::clone(&ledger);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        ledger.record_reference(10, 100);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let summary = ledger.summary();
        assert_eq!(summary.reference_count, 400);
        assert_eq!(summary.reference_bytes, 4_000);
        assert_eq!(summary.baseline_bytes, 40_000);
    }

    #[test]
    fn test_reset() {
        let ledger = BandwidthLedger::new();
        ledger.record_init(10, 10);
        ledger.reset();
        assert_eq!(ledger.summary(), LedgerSummary::default());
    }

    #[test]
    fn test_display() {
        let summary = LedgerSummary {
            reference_count: 3,
            reference_bytes: 60,
            init_count: 1,
            init_bytes: 2048,
            baseline_bytes: 8192,
        };
        let text = summary.to_string();
        assert!(text.contains("3 references (60 B)"));
        assert!(text.contains("1 inits (2.0 KiB)"));
        assert!(text.contains("8.0 KiB uncached"));
        assert!(text.ends_with("74.3% reduction"));
    }
}
