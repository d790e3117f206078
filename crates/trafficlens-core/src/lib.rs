//! TrafficLens core library: capture, decode, persist, aggregate, report.
//!
//! The crate implements both halves of the pipeline used by the CLI. Capture
//! mode pulls raw frames from a `FrameSource`, decodes their IPv4/TCP/UDP
//! headers into `PacketRecord`s and appends them to a CSV record store.
//! Analysis mode reads the store back, aggregates it into five independent
//! summaries and hands them to a chart renderer and a text report writer.
//! The two modes share nothing but the store on disk.
//!
//! Decoding is byte-oriented and side-effect free; all file and device I/O is
//! isolated in `source`, `store` and `report`.
//!
//! Invariants:
//! - Decoding never fails; frames without IPv4 degrade to an empty record.
//! - Each appended record is flushed before `append` returns.
//! - Malformed store lines are skipped and reported, never fatal.
//! - Report outputs are deterministic for a given store.
//!
//! # Examples
//! ```no_run
//! use std::path::Path;
//!
//! use trafficlens_core::{AnalysisConfig, AnalysisRun, SvgRenderer, analyze_store};
//!
//! let run = analyze_store(
//!     Path::new("data/packets.csv"),
//!     Path::new("out"),
//!     &AnalysisConfig::default(),
//!     &SvgRenderer::default(),
//! )?;
//! if let AnalysisRun::Completed { total, .. } = run {
//!     println!("analysed {total} packets");
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

mod analysis;
mod decode;
mod pipeline;
mod record;
mod report;
mod source;
mod store;

pub use analysis::{
    AnalysisConfig, AnalysisResult, Aggregator, DEFAULT_HISTOGRAM_BINS, DEFAULT_TOP_TALKERS,
    HistogramBucket, Talker, TimeBucket, TimePoint, aggregate,
};
pub use decode::{DecodeError, FrameLayers, Ipv4Layer, TransportLayer, decode, parse_layers};
pub use pipeline::{
    AnalysisError, AnalysisRun, CaptureError, CaptureOptions, CaptureStats,
    DEFAULT_MAX_CONSECUTIVE_WRITE_FAILURES, DEFAULT_MAX_PACKETS, DeviceSelector, analyze_store,
    capture_to_store, run_capture, select_device,
};
pub use record::{PacketRecord, format_timestamp, parse_timestamp};
pub use report::{
    ArtifactFailure, Chart, ChartKind, ChartPoint, ChartRenderer, JsonRenderer, REPORT_FILE,
    RenderError, ReportContext, ReportError, ReportOutcome, Reporter, SUMMARY_FILE, SvgRenderer,
};
pub use source::{
    CaptureBackend, CaptureSettings, DeviceInfo, Frame, FrameEvent, FrameSource,
    LiveCaptureBackend, LiveSource, PcapFileSource, PcapReplayBackend, SourceError,
};
pub use store::{
    LoadedRecords, RecordLogOptions, RecordWriter, RowError, Schema, SkippedLine, StoreError,
    read_all, read_from,
};

/// Current summary report schema version.
pub const REPORT_VERSION: u32 = 1;
/// Default timestamp used when the store holds no usable capture time.
pub const DEFAULT_GENERATED_AT: &str = "1970-01-01T00:00:00Z";

/// Machine-readable analysis summary written next to the charts.
///
/// # Examples
/// ```
/// use trafficlens_core::make_stub_report;
///
/// let report = make_stub_report("data/packets.csv", 123);
/// assert_eq!(report.report_version, trafficlens_core::REPORT_VERSION);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Report schema version (not the binary version).
    pub report_version: u32,
    /// Tool identification metadata.
    pub tool: ToolInfo,
    /// RFC3339 timestamp; the last capture time when known.
    pub generated_at: String,

    /// Input store metadata.
    pub input: InputInfo,

    /// Optional capture summary (absent for stubs).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture_summary: Option<CaptureSummary>,
    /// Length histogram, ascending by bucket.
    pub histogram: Vec<HistogramBucket>,
    /// Packet count per time bucket, ascending.
    pub packets_over_time: Vec<TimeSample>,
    /// Latest packet length per time bucket, ascending.
    pub size_over_time: Vec<TimeSample>,
    /// Packets per protocol name.
    pub protocols: BTreeMap<String, u64>,
    /// Busiest sources, descending.
    pub top_talkers: Vec<Talker>,
}

/// Tool metadata embedded in reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
}

/// Input store metadata embedded in reports.
///
/// # Examples
/// ```
/// use trafficlens_core::InputInfo;
///
/// let input = InputInfo {
///     path: "data/packets.csv".to_string(),
///     bytes: 1024,
///     skipped_lines: 0,
/// };
/// assert_eq!(input.bytes, 1024);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputInfo {
    /// Store path as provided to the analyzer.
    pub path: String,
    /// Store size in bytes.
    pub bytes: u64,
    /// Lines skipped because they could not be parsed.
    pub skipped_lines: u64,
}

/// Record count and capture window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureSummary {
    /// Total records read from the store.
    pub packets_total: u64,
    /// RFC3339 timestamp of the earliest record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_start: Option<String>,
    /// RFC3339 timestamp of the latest record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_end: Option<String>,
}

/// One point of a time series with an RFC3339 timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSample {
    pub timestamp: String,
    pub value: u64,
}

/// Build a stub report with base fields filled and empty summaries.
///
/// # Examples
/// ```
/// use trafficlens_core::make_stub_report;
///
/// let report = make_stub_report("data/packets.csv", 123);
/// assert!(report.histogram.is_empty());
/// assert!(report.top_talkers.is_empty());
/// ```
pub fn make_stub_report(input_path: &str, input_bytes: u64) -> AnalysisReport {
    AnalysisReport {
        report_version: REPORT_VERSION,
        tool: ToolInfo {
            name: "trafficlens".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        generated_at: DEFAULT_GENERATED_AT.to_string(),
        input: InputInfo {
            path: input_path.to_string(),
            bytes: input_bytes,
            skipped_lines: 0,
        },
        capture_summary: None,
        histogram: vec![],
        packets_over_time: vec![],
        size_over_time: vec![],
        protocols: BTreeMap::new(),
        top_talkers: vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_omits_optional_fields_when_none() {
        let mut report = make_stub_report("data/packets.csv", 1);
        report.capture_summary = Some(CaptureSummary {
            packets_total: 1,
            time_start: None,
            time_end: None,
        });

        let value = serde_json::to_value(&report).expect("report json");
        let capture = value.get("capture_summary").expect("capture_summary");
        assert!(capture.get("time_start").is_none());
        assert!(capture.get("time_end").is_none());
        assert_eq!(value["tool"]["name"], "trafficlens");
        assert!(value["protocols"].as_object().expect("object").is_empty());
    }

    #[test]
    fn stub_report_skips_capture_summary() {
        let report = make_stub_report("data/packets.csv", 1);
        let value = serde_json::to_value(&report).expect("report json");
        assert!(value.get("capture_summary").is_none());
        assert_eq!(value["input"]["skipped_lines"], 0);
    }
}
