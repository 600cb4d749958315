//! Publisher metrics

use std::sync::atomic::{AtomicU64, Ordering};

use metrics::{counter, gauge};

/// Counters for the publisher worker
#[derive(Debug, Default)]
pub struct PublisherMetrics {
    /// Successful full rewrites of the shared file
    publishes: AtomicU64,
    /// Attempts that found the lock held by a reader
    contended: AtomicU64,
    bytes_written: AtomicU64,
}

impl PublisherMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_publish(&self, bytes: usize, fields: usize) {
        self.publishes.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes as u64, Ordering::Relaxed);
        counter!("nmead_publish_total").increment(1);
        gauge!("nmead_published_fields").set(fields as f64);
    }

    pub fn record_contention(&self) {
        self.contended.fetch_add(1, Ordering::Relaxed);
        counter!("nmead_publish_contended_total").increment(1);
    }

    pub fn snapshot(&self) -> PublisherSnapshot {
        PublisherSnapshot {
            publishes: self.publishes.load(Ordering::Relaxed),
            contended: self.contended.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of `PublisherMetrics`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublisherSnapshot {
    pub publishes: u64,
    pub contended: u64,
    pub bytes_written: u64,
}
