use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::chart::{Chart, ChartRenderer, RenderError};

/// Writes the chart data as pretty-printed JSON, for plotting elsewhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

impl ChartRenderer for JsonRenderer {
    fn extension(&self) -> &'static str {
        "json"
    }

    fn render(&self, chart: &Chart, path: &Path) -> Result<(), RenderError> {
        let file = File::create(path).map_err(|e| RenderError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, chart)?;
        writer.write_all(b"\n").map_err(|e| RenderError::io(path, e))?;
        writer.flush().map_err(|e| RenderError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::chart::{ChartKind, ChartPoint};
    use tempfile::TempDir;

    #[test]
    fn chart_round_trips_through_json_value() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("top_talkers.json");
        let chart = Chart::new(ChartKind::Bar, "Top Source IPs", "Source IP", "Count").with_points(
            vec![ChartPoint {
                label: "10.0.0.1".to_string(),
                value: 2.0,
            }],
        );

        JsonRenderer.render(&chart, &path).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["kind"], "bar");
        assert_eq!(value["title"], "Top Source IPs");
        assert_eq!(value["points"][0]["label"], "10.0.0.1");
        assert_eq!(value["points"][0]["value"], 2.0);
    }
}
