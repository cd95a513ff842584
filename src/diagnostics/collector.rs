// SPDX-License-Identifier: MPL-2.0
//! In-process log of playback diagnostic events.

use std::path::Path;

use super::export::write_atomic;
use super::{
    BufferCapacity, CircularBuffer, DiagnosticEvent, DiagnosticEventKind, DiagnosticReport,
    PipelineStats, ReportMetadata,
};
use crate::error::Result;

/// Bounded event log owned by a playback controller.
#[derive(Debug, Clone)]
pub struct DiagnosticsLog {
    events: CircularBuffer<DiagnosticEvent>,
}

impl Default for DiagnosticsLog {
    fn default() -> Self {
        Self::new(BufferCapacity::default())
    }
}

impl DiagnosticsLog {
    #[must_use]
    pub fn new(capacity: BufferCapacity) -> Self {
        Self {
            events: CircularBuffer::new(capacity),
        }
    }

    /// Records an event.
    pub fn record(&mut self, wall_time_secs: f64, position_secs: f64, kind: DiagnosticEventKind) {
        log::trace!("diagnostic event: {}", kind.name());
        self.events
            .push(DiagnosticEvent::new(wall_time_secs, position_secs, kind));
    }

    /// Events oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &DiagnosticEvent> {
        self.events.iter()
    }

    #[must_use]
    pub fn last(&self) -> Option<&DiagnosticEvent> {
        self.events.last()
    }

    /// Number of retained events whose type is `name`.
    #[must_use]
    pub fn count(&self, name: &str) -> usize {
        self.events
            .iter()
            .filter(|event| event.kind.name() == name)
            .count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.events.capacity()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Builds a report from the retained events.
    #[must_use]
    pub fn report(&self, generated_at_secs: f64, pipeline: PipelineStats) -> DiagnosticReport {
        let metadata =
            ReportMetadata::new(generated_at_secs, self.events.len(), self.events.evicted());
        DiagnosticReport::new(metadata, pipeline, self.events.to_vec())
    }

    /// Writes a JSON report to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn export_to_path(
        &self,
        path: &Path,
        generated_at_secs: f64,
        pipeline: PipelineStats,
    ) -> Result<()> {
        let json = self.report(generated_at_secs, pipeline).to_json()?;
        write_atomic(path, &json)?;
        log::info!("diagnostics report written to {}", path.display());
        Ok(())
    }
}
