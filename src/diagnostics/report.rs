// SPDX-License-Identifier: MPL-2.0
//! Diagnostic report generation and JSON export.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{DiagnosticEvent, DiagnosticEventKind};

// =============================================================================
// Report Metadata
// =============================================================================

/// Metadata about a diagnostic report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportMetadata {
    /// Version of the crate that generated the report
    pub tickplay_version: String,
    /// Wall-clock seconds at generation time
    pub generated_at_secs: f64,
    /// Events recorded in the report
    pub event_count: usize,
    /// Events dropped from the ring before the report was built
    pub evicted_count: u64,
}

impl ReportMetadata {
    #[must_use]
    pub fn new(generated_at_secs: f64, event_count: usize, evicted_count: u64) -> Self {
        Self {
            tickplay_version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at_secs,
            event_count,
            evicted_count,
        }
    }
}

// =============================================================================
// Pipeline Counters
// =============================================================================

/// Frame pipeline counters at report time.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PipelineStats {
    pub frames_presented: u64,
    pub frames_rejected: u64,
    pub audio_chunks_drained: u64,
}

// =============================================================================
// Report Summary
// =============================================================================

/// Aggregates computed from the recorded events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportSummary {
    /// Count of events by type name
    pub event_counts: BTreeMap<String, usize>,
    /// Completed buffering stalls
    pub buffering_stalls: usize,
    /// Wall-clock seconds spent in completed buffering stalls
    pub buffering_secs: f64,
    /// Wall-clock seconds spent waiting for seeks
    pub seeking_secs: f64,
}

impl ReportSummary {
    #[must_use]
    pub fn from_events(events: &[DiagnosticEvent]) -> Self {
        let mut event_counts = BTreeMap::new();
        let mut buffering_stalls = 0;
        let mut buffering_secs = 0.0;
        let mut seeking_secs = 0.0;

        for event in events {
            *event_counts.entry(event.kind.name().to_string()).or_insert(0) += 1;
            match event.kind {
                DiagnosticEventKind::BufferingEnded { stalled_secs, .. } => {
                    buffering_stalls += 1;
                    buffering_secs += stalled_secs;
                }
                DiagnosticEventKind::SeekCompleted { stalled_secs } => {
                    seeking_secs += stalled_secs;
                }
                _ => {}
            }
        }

        Self {
            event_counts,
            buffering_stalls,
            buffering_secs,
            seeking_secs,
        }
    }
}

// =============================================================================
// Diagnostic Report
// =============================================================================

/// A complete diagnostic report ready for JSON export.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiagnosticReport {
    pub metadata: ReportMetadata,
    pub pipeline: PipelineStats,
    pub summary: ReportSummary,
    pub events: Vec<DiagnosticEvent>,
}

impl DiagnosticReport {
    /// Builds a report, computing the summary from `events`.
    #[must_use]
    pub fn new(metadata: ReportMetadata, pipeline: PipelineStats, events: Vec<DiagnosticEvent>) -> Self {
        let summary = ReportSummary::from_events(&events);
        Self {
            metadata,
            pipeline,
            summary,
            events,
        }
    }

    /// Exports the report as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: DiagnosticEventKind) -> DiagnosticEvent {
        DiagnosticEvent::new(0.0, 0.0, kind)
    }

    #[test]
    fn summary_counts_and_sums_stalls() {
        let events = vec![
            event(DiagnosticEventKind::BufferingStarted),
            event(DiagnosticEventKind::BufferingEnded {
                stalled_secs: 0.5,
                eof: false,
            }),
            event(DiagnosticEventKind::BufferingStarted),
            event(DiagnosticEventKind::BufferingEnded {
                stalled_secs: 0.25,
                eof: true,
            }),
            event(DiagnosticEventKind::SeekCompleted { stalled_secs: 0.125 }),
        ];
        let summary = ReportSummary::from_events(&events);

        assert_eq!(summary.event_counts["buffering_started"], 2);
        assert_eq!(summary.buffering_stalls, 2);
        assert!((summary.buffering_secs - 0.75).abs() < 1e-9);
        assert!((summary.seeking_secs - 0.125).abs() < 1e-9);
    }

    #[test]
    fn empty_report_serializes() {
        let report = DiagnosticReport::new(
            ReportMetadata::new(1.0, 0, 0),
            PipelineStats::default(),
            Vec::new(),
        );
        let json = report.to_json().unwrap();
        assert!(json.contains("\"tickplay_version\""));
        assert!(json.contains("\"buffering_stalls\": 0"));
    }
}
