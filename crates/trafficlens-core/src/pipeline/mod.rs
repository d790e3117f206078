//! Drivers for the two modes.
//!
//! Capture walks `Idle -> DeviceSelected -> Capturing -> Closed`: enumerate,
//! select, open, loop, release. Analysis loads the whole store, aggregates it
//! and hands the result to the reporter.

mod analyze;
mod capture;

pub use analyze::{AnalysisError, AnalysisRun, analyze_store};
pub use capture::{
    CaptureError, CaptureOptions, CaptureStats, DEFAULT_MAX_CONSECUTIVE_WRITE_FAILURES,
    DEFAULT_MAX_PACKETS, DeviceSelector, capture_to_store, run_capture, select_device,
};
