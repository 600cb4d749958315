//! Source worker: one serial device feeding the shared snapshot.

use std::sync::Arc;

use contracts::{now_seconds, ContractError, DecodeError, LineSource, Worker};
use tracing::{debug, error, info, trace, warn};

use crate::codec;
use crate::metrics::IngestionMetrics;
use crate::snapshot::{FieldUpdate, Snapshot};
use crate::templates::SentenceTemplates;

/// Reads lines from one device, decodes them, and merges into the snapshot.
///
/// If the snapshot is busy the decoded fields wait in a single pending slot;
/// newer sentences are folded into that slot field by field, so nothing is
/// lost except values superseded by a newer one for the same field.
pub struct SourceWorker {
    name: String,
    source: Box<dyn LineSource>,
    templates: SentenceTemplates,
    check_checksums: bool,
    snapshot: Arc<Snapshot>,
    metrics: Arc<IngestionMetrics>,
    pending: Option<FieldUpdate>,
}

impl SourceWorker {
    pub fn new(
        name: impl Into<String>,
        source: Box<dyn LineSource>,
        templates: SentenceTemplates,
        check_checksums: bool,
        snapshot: Arc<Snapshot>,
    ) -> Self {
        let name = name.into();
        info!(
            source = %name,
            device = %source.describe(),
            sentences = ?templates.headers(),
            check_checksums,
            "source worker created"
        );
        Self {
            metrics: Arc::new(IngestionMetrics::new(name.clone())),
            name,
            source,
            templates,
            check_checksums,
            snapshot,
            pending: None,
        }
    }

    /// Get metrics reference
    pub fn metrics(&self) -> Arc<IngestionMetrics> {
        self.metrics.clone()
    }

    /// Whether decoded fields are waiting for the snapshot lock
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    fn handle_line(&mut self, line: &[u8], time_of_arrival: f64) {
        if line.trim_ascii().is_empty() {
            return;
        }
        self.metrics.record_line();

        match codec::decode(line, &self.templates, self.check_checksums, time_of_arrival) {
            Ok(readings) => {
                self.metrics.record_decoded();
                if readings.is_empty() {
                    return;
                }
                let update = Snapshot::update_from(readings);
                match self.pending.as_mut() {
                    Some(pending) => pending.extend(update),
                    None => self.pending = Some(update),
                }
            }
            Err(DecodeError::Unrecognized) => {
                self.metrics.record_unrecognized();
                trace!(source = %self.name, "unrecognized sentence ignored");
            }
            Err(DecodeError::Checksum { header }) => {
                self.metrics.record_checksum_error();
                warn!(source = %self.name, header = %header, "bad NMEA checksum");
            }
            Err(DecodeError::TemplateMismatch {
                header,
                expected,
                actual,
            }) => {
                self.metrics.record_template_mismatch();
                error!(source = %self.name, header = %header, "NMEA template mismatch");
                debug!(source = %self.name, expected, actual, "template mismatch field counts");
            }
        }
    }

    fn flush_pending(&mut self) {
        let Some(update) = self.pending.take() else {
            return;
        };
        match self.snapshot.try_merge(update) {
            Ok(changed) => trace!(source = %self.name, changed, "merged into snapshot"),
            Err(update) => {
                self.metrics.record_deferred();
                trace!(source = %self.name, "snapshot busy, keeping update");
                self.pending = Some(update);
            }
        }
    }
}

impl Worker for SourceWorker {
    fn name(&self) -> &str {
        &self.name
    }

    fn step(&mut self) -> Result<(), ContractError> {
        let line = self.source.read_line().map_err(|e| {
            error!(source = %self.name, error = %e, "serial communication error");
            ContractError::serial(&self.name, e.to_string())
        })?;

        if let Some(line) = line {
            let time_of_arrival = now_seconds();
            self.handle_line(&line, time_of_arrival);
        }

        self.flush_pending();
        Ok(())
    }

    fn shutdown(&mut self) {
        if self.pending.take().is_some() {
            debug!(source = %self.name, "discarding unmerged update on shutdown");
        }
        let stats = self.metrics.snapshot();
        info!(
            source = %self.name,
            device = %self.source.describe(),
            lines = stats.lines_read,
            decoded = stats.sentences_decoded,
            checksum_errors = stats.checksum_errors,
            template_mismatches = stats.template_mismatches,
            "source worker stopped"
        );
    }
}
