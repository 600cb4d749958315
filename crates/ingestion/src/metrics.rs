//! Per-source ingestion metrics

use std::sync::atomic::{AtomicU64, Ordering};

use metrics::counter;

/// Counters for one source worker.
///
/// Atomics back the end-of-run summary; every increment is mirrored to the
/// global `metrics` recorder labelled with the source name.
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    source: String,
    lines_read: AtomicU64,
    sentences_decoded: AtomicU64,
    checksum_errors: AtomicU64,
    template_mismatches: AtomicU64,
    unrecognized: AtomicU64,
    merges_deferred: AtomicU64,
}

impl IngestionMetrics {
    /// Create new metrics instance
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }

    pub fn record_line(&self) {
        self.lines_read.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_decoded(&self) {
        self.sentences_decoded.fetch_add(1, Ordering::Relaxed);
        self.emit("decoded");
    }

    pub fn record_checksum_error(&self) {
        self.checksum_errors.fetch_add(1, Ordering::Relaxed);
        self.emit("checksum_error");
    }

    pub fn record_template_mismatch(&self) {
        self.template_mismatches.fetch_add(1, Ordering::Relaxed);
        self.emit("template_mismatch");
    }

    pub fn record_unrecognized(&self) {
        self.unrecognized.fetch_add(1, Ordering::Relaxed);
        self.emit("unrecognized");
    }

    /// Snapshot lock was busy, update kept for the next attempt
    pub fn record_deferred(&self) {
        self.merges_deferred.fetch_add(1, Ordering::Relaxed);
        counter!("nmead_merges_deferred_total", "source" => self.source.clone()).increment(1);
    }

    fn emit(&self, outcome: &'static str) {
        counter!(
            "nmead_sentences_total",
            "source" => self.source.clone(),
            "outcome" => outcome
        )
        .increment(1);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            lines_read: self.lines_read.load(Ordering::Relaxed),
            sentences_decoded: self.sentences_decoded.load(Ordering::Relaxed),
            checksum_errors: self.checksum_errors.load(Ordering::Relaxed),
            template_mismatches: self.template_mismatches.load(Ordering::Relaxed),
            unrecognized: self.unrecognized.load(Ordering::Relaxed),
            merges_deferred: self.merges_deferred.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub lines_read: u64,
    pub sentences_decoded: u64,
    pub checksum_errors: u64,
    pub template_mismatches: u64,
    pub unrecognized: u64,
    pub merges_deferred: u64,
}
