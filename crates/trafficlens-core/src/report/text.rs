use std::collections::BTreeMap;

use super::ReportContext;
use crate::analysis::AnalysisResult;

/// Plain-text run summary written as `report.txt`.
pub(crate) fn report_text(result: &AnalysisResult, context: &ReportContext) -> String {
    let mut out = format!(
        "Report for {}\nTotal packets: {}\nProtocol count: {}\n",
        context.store_path.display(),
        result.total_packets,
        protocol_counts(&result.protocols)
    );
    if context.skipped_lines > 0 {
        out.push_str(&format!("Skipped lines: {}\n", context.skipped_lines));
    }
    out
}

/// `{TCP=1, UDP=1}`
fn protocol_counts(protocols: &BTreeMap<String, u64>) -> String {
    let entries: Vec<String> = protocols
        .iter()
        .map(|(name, count)| format!("{name}={count}"))
        .collect();
    format!("{{{}}}", entries.join(", "))
}
