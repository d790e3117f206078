use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

/// Shape of a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    /// Adjacent bars over contiguous value ranges.
    Histogram,
    /// A line over time-ordered points.
    TimeSeries,
    /// Separate bars per category.
    Bar,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
}

/// A labeled data series ready to be drawn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub kind: ChartKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Preferred canvas size in pixels.
    pub width: u32,
    pub height: u32,
    pub points: Vec<ChartPoint>,
}

impl Chart {
    pub fn new(kind: ChartKind, title: &str, x_label: &str, y_label: &str) -> Self {
        Self {
            kind,
            title: title.to_string(),
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            width: 800,
            height: 500,
            points: Vec::new(),
        }
    }

    pub fn with_size(self, width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..self
        }
    }

    pub fn with_points(self, points: Vec<ChartPoint>) -> Self {
        Self { points, ..self }
    }

    pub fn max_value(&self) -> f64 {
        self.points.iter().map(|p| p.value).fold(0.0, f64::max)
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize chart: {0}")]
    Json(#[from] serde_json::Error),
}

impl RenderError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Turns a `Chart` into a file.
pub trait ChartRenderer {
    /// File extension (without dot) of the artifacts this renderer writes.
    fn extension(&self) -> &'static str;

    fn render(&self, chart: &Chart, path: &Path) -> Result<(), RenderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_value_of_empty_chart_is_zero() {
        let chart = Chart::new(ChartKind::Bar, "t", "x", "y");
        assert_eq!(chart.max_value(), 0.0);
    }

    #[test]
    fn kind_serializes_snake_case() {
        let value = serde_json::to_value(ChartKind::TimeSeries).unwrap();
        assert_eq!(value, "time_series");
    }
}
