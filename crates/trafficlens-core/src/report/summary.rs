use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use super::ReportContext;
use crate::analysis::{AnalysisResult, TimePoint};
use crate::{AnalysisReport, CaptureSummary, DEFAULT_GENERATED_AT, TimeSample, make_stub_report};

/// Machine-readable form of an analysis run, written as `summary.json`.
pub(crate) fn summary_report(result: &AnalysisResult, context: &ReportContext) -> AnalysisReport {
    let path = context.store_path.display().to_string();
    let mut report = make_stub_report(&path, context.store_bytes);
    report.input.skipped_lines = context.skipped_lines;
    report.generated_at =
        ts_to_rfc3339(result.time_end).unwrap_or_else(|| DEFAULT_GENERATED_AT.to_string());
    report.capture_summary = Some(CaptureSummary {
        packets_total: result.total_packets,
        time_start: ts_to_rfc3339(result.time_start),
        time_end: ts_to_rfc3339(result.time_end),
    });
    report.histogram = result.histogram.clone();
    report.packets_over_time = samples(&result.packets_over_time);
    report.size_over_time = samples(&result.size_over_time);
    report.protocols = result.protocols.clone();
    report.top_talkers = result.top_talkers.clone();
    report
}

fn samples(points: &[TimePoint]) -> Vec<TimeSample> {
    points
        .iter()
        .filter_map(|p| {
            Some(TimeSample {
                timestamp: p.timestamp.format(&Rfc3339).ok()?,
                value: p.value,
            })
        })
        .collect()
}

fn ts_to_rfc3339(ts: Option<OffsetDateTime>) -> Option<String> {
    ts?.format(&Rfc3339).ok()
}
