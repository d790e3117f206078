use std::fs;
use std::path::Path;

use thiserror::Error;
use tracing::{info, warn};

use crate::analysis::{AnalysisConfig, aggregate};
use crate::report::{ChartRenderer, ReportContext, ReportError, ReportOutcome, Reporter};
use crate::store::{StoreError, read_all};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Report(#[from] ReportError),
}

#[derive(Debug)]
pub enum AnalysisRun {
    /// The store held no usable records; nothing was written.
    NoData { skipped: u64 },
    Completed { total: u64, outcome: ReportOutcome },
}

/// Load the store, aggregate it and write every report artifact to
/// `out_dir`.
pub fn analyze_store(
    store_path: &Path,
    out_dir: &Path,
    config: &AnalysisConfig,
    renderer: &dyn ChartRenderer,
) -> Result<AnalysisRun, AnalysisError> {
    let loaded = read_all(store_path)?;
    let skipped = loaded.skipped.len() as u64;
    if skipped > 0 {
        warn!(skipped, store = %store_path.display(), "store has malformed lines");
    }
    if loaded.records.is_empty() {
        info!(store = %store_path.display(), "no data to analyse");
        return Ok(AnalysisRun::NoData { skipped });
    }

    let result = aggregate(&loaded.records, config);
    let context = ReportContext {
        store_path: store_path.to_path_buf(),
        store_bytes: fs::metadata(store_path).map(|m| m.len()).unwrap_or(0),
        skipped_lines: skipped,
    };
    let outcome = Reporter::new(renderer).write_all(&result, &context, out_dir)?;
    Ok(AnalysisRun::Completed {
        total: result.total_packets,
        outcome,
    })
}
