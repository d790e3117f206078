//! Report artifacts: five charts, a text report and a JSON summary.
//!
//! Every artifact is produced independently. A failure to write one is
//! recorded in the returned `ReportOutcome` and logged, and the remaining
//! artifacts are still attempted. Only failing to create the output
//! directory aborts the run.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::analysis::{AnalysisResult, TimePoint};
use crate::record::format_timestamp;

mod chart;
mod json;
mod summary;
mod svg;
mod text;

pub use chart::{Chart, ChartKind, ChartPoint, ChartRenderer, RenderError};
pub use json::JsonRenderer;
pub use svg::SvgRenderer;

pub const REPORT_FILE: &str = "report.txt";
pub const SUMMARY_FILE: &str = "summary.json";

/// Where the analysed records came from.
#[derive(Debug, Clone)]
pub struct ReportContext {
    pub store_path: PathBuf,
    pub store_bytes: u64,
    /// Malformed store lines that were skipped.
    pub skipped_lines: u64,
}

#[derive(Debug)]
pub struct ArtifactFailure {
    pub path: PathBuf,
    pub error: RenderError,
}

#[derive(Debug, Default)]
pub struct ReportOutcome {
    /// Artifacts written, in production order.
    pub written: Vec<PathBuf>,
    pub failures: Vec<ArtifactFailure>,
}

impl ReportOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to create output directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Writes all report artifacts through one chart renderer.
pub struct Reporter<'a> {
    renderer: &'a dyn ChartRenderer,
}

impl<'a> Reporter<'a> {
    pub fn new(renderer: &'a dyn ChartRenderer) -> Self {
        Self { renderer }
    }

    pub fn write_all(
        &self,
        result: &AnalysisResult,
        context: &ReportContext,
        out_dir: &Path,
    ) -> Result<ReportOutcome, ReportError> {
        fs::create_dir_all(out_dir).map_err(|source| ReportError::CreateDir {
            path: out_dir.to_path_buf(),
            source,
        })?;

        let mut outcome = ReportOutcome::default();
        for (name, chart) in charts(result) {
            let path = out_dir.join(format!("{name}.{}", self.renderer.extension()));
            let written = self.renderer.render(&chart, &path);
            track(&mut outcome, path, written);
        }

        let path = out_dir.join(REPORT_FILE);
        let written =
            fs::write(&path, text::report_text(result, context)).map_err(|e| RenderError::io(&path, e));
        track(&mut outcome, path, written);

        let path = out_dir.join(SUMMARY_FILE);
        let written = write_summary(result, context, &path);
        track(&mut outcome, path, written);

        info!(
            out_dir = %out_dir.display(),
            written = outcome.written.len(),
            failed = outcome.failures.len(),
            "report written"
        );
        Ok(outcome)
    }
}

fn track(outcome: &mut ReportOutcome, path: PathBuf, written: Result<(), RenderError>) {
    match written {
        Ok(()) => outcome.written.push(path),
        Err(error) => {
            warn!(path = %path.display(), %error, "artifact failed");
            outcome.failures.push(ArtifactFailure { path, error });
        }
    }
}

fn write_summary(
    result: &AnalysisResult,
    context: &ReportContext,
    path: &Path,
) -> Result<(), RenderError> {
    let report = summary::summary_report(result, context);
    let mut json = serde_json::to_string_pretty(&report)?;
    json.push('\n');
    fs::write(path, json).map_err(|e| RenderError::io(path, e))
}

/// The five charts with their artifact base names.
fn charts(result: &AnalysisResult) -> [(&'static str, Chart); 5] {
    let histogram = result
        .histogram
        .iter()
        .map(|b| ChartPoint {
            label: format!("{:.0}-{:.0}", b.lower, b.upper),
            value: b.count as f64,
        })
        .collect();
    let protocols = result
        .protocols
        .iter()
        .map(|(name, count)| ChartPoint {
            label: category_label(name),
            value: *count as f64,
        })
        .collect();
    let talkers = result
        .top_talkers
        .iter()
        .map(|t| ChartPoint {
            label: category_label(&t.source),
            value: t.packets as f64,
        })
        .collect();

    [
        (
            "packets_vs_size",
            Chart::new(ChartKind::Histogram, "Packets vs Size", "Size", "Count")
                .with_size(800, 600)
                .with_points(histogram),
        ),
        (
            "packets_vs_time",
            Chart::new(ChartKind::TimeSeries, "Packets vs Time", "Time", "Count")
                .with_size(900, 500)
                .with_points(series(&result.packets_over_time)),
        ),
        (
            "protocol_distribution",
            Chart::new(ChartKind::Bar, "Protocol Distribution", "Protocol", "Count")
                .with_points(protocols),
        ),
        (
            "size_vs_time",
            Chart::new(ChartKind::TimeSeries, "Size vs Time", "Time", "Bytes")
                .with_size(900, 500)
                .with_points(series(&result.size_over_time)),
        ),
        (
            "top_talkers",
            Chart::new(ChartKind::Bar, "Top Source IPs", "Source IP", "Count")
                .with_points(talkers),
        ),
    ]
}

/// Records without IPv4 carry empty names; give them a visible bar label.
fn category_label(name: &str) -> String {
    if name.is_empty() {
        "(none)".to_string()
    } else {
        name.to_string()
    }
}

fn series(points: &[TimePoint]) -> Vec<ChartPoint> {
    points
        .iter()
        .map(|p| ChartPoint {
            label: format_timestamp(p.timestamp).unwrap_or_else(|_| p.timestamp.to_string()),
            value: p.value as f64,
        })
        .collect()
}
