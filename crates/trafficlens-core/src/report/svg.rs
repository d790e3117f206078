use std::fs;
use std::path::Path;

use super::chart::{Chart, ChartKind, ChartRenderer, RenderError};

const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 60.0;
const FILL: &str = "#4a7ab7";

/// Writes standalone SVG images.
#[derive(Debug, Clone, Copy, Default)]
pub struct SvgRenderer;

impl ChartRenderer for SvgRenderer {
    fn extension(&self) -> &'static str {
        "svg"
    }

    fn render(&self, chart: &Chart, path: &Path) -> Result<(), RenderError> {
        fs::write(path, svg_document(chart)).map_err(|e| RenderError::io(path, e))
    }
}

struct Canvas {
    width: f64,
    height: f64,
    plot_width: f64,
    plot_height: f64,
    y_max: f64,
}

impl Canvas {
    fn new(chart: &Chart) -> Self {
        let width = f64::from(chart.width.max(200));
        let height = f64::from(chart.height.max(150));
        let y_max = chart.max_value();
        Self {
            width,
            height,
            plot_width: width - MARGIN_LEFT - MARGIN_RIGHT,
            plot_height: height - MARGIN_TOP - MARGIN_BOTTOM,
            y_max: if y_max > 0.0 { y_max } else { 1.0 },
        }
    }

    fn baseline(&self) -> f64 {
        MARGIN_TOP + self.plot_height
    }

    fn y(&self, value: f64) -> f64 {
        self.baseline() - value / self.y_max * self.plot_height
    }
}

fn svg_document(chart: &Chart) -> String {
    let canvas = Canvas::new(chart);
    let mut out = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n\
         <rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n\
         <text x=\"{cx}\" y=\"24\" text-anchor=\"middle\" font-family=\"sans-serif\" font-size=\"16\">{title}</text>\n",
        w = canvas.width,
        h = canvas.height,
        cx = canvas.width / 2.0,
        title = escape(&chart.title),
    );

    out.push_str(&axes(chart, &canvas));
    match chart.kind {
        ChartKind::Histogram => out.push_str(&bars(chart, &canvas, 1.0, false)),
        ChartKind::Bar => out.push_str(&bars(chart, &canvas, 0.8, true)),
        ChartKind::TimeSeries => out.push_str(&line(chart, &canvas)),
    }
    out.push_str("</svg>\n");
    out
}

fn axes(chart: &Chart, canvas: &Canvas) -> String {
    let right = MARGIN_LEFT + canvas.plot_width;
    let baseline = canvas.baseline();
    format!(
        "<line x1=\"{MARGIN_LEFT}\" y1=\"{MARGIN_TOP}\" x2=\"{MARGIN_LEFT}\" y2=\"{baseline}\" stroke=\"black\"/>\n\
         <line x1=\"{MARGIN_LEFT}\" y1=\"{baseline}\" x2=\"{right}\" y2=\"{baseline}\" stroke=\"black\"/>\n\
         <text x=\"{tick_x}\" y=\"{baseline}\" text-anchor=\"end\" font-family=\"sans-serif\" font-size=\"10\">0</text>\n\
         <text x=\"{tick_x}\" y=\"{top_tick}\" text-anchor=\"end\" font-family=\"sans-serif\" font-size=\"10\">{y_max}</text>\n\
         <text x=\"{cx}\" y=\"{x_label_y}\" text-anchor=\"middle\" font-family=\"sans-serif\" font-size=\"12\">{x_label}</text>\n\
         <text x=\"16\" y=\"{cy}\" text-anchor=\"middle\" font-family=\"sans-serif\" font-size=\"12\" transform=\"rotate(-90 16 {cy})\">{y_label}</text>\n",
        tick_x = MARGIN_LEFT - 6.0,
        top_tick = MARGIN_TOP + 4.0,
        y_max = canvas.y_max,
        cx = MARGIN_LEFT + canvas.plot_width / 2.0,
        x_label_y = canvas.height - 12.0,
        x_label = escape(&chart.x_label),
        cy = MARGIN_TOP + canvas.plot_height / 2.0,
        y_label = escape(&chart.y_label),
    )
}

fn bars(chart: &Chart, canvas: &Canvas, fill_ratio: f64, labels: bool) -> String {
    if chart.points.is_empty() {
        return String::new();
    }
    let slot = canvas.plot_width / chart.points.len() as f64;
    let bar_width = slot * fill_ratio;
    let mut out = String::new();
    for (i, point) in chart.points.iter().enumerate() {
        let x = MARGIN_LEFT + slot * i as f64 + (slot - bar_width) / 2.0;
        let y = canvas.y(point.value);
        out.push_str(&format!(
            "<rect x=\"{x:.2}\" y=\"{y:.2}\" width=\"{bar_width:.2}\" height=\"{h:.2}\" fill=\"{FILL}\"><title>{label}: {value}</title></rect>\n",
            h = canvas.baseline() - y,
            label = escape(&point.label),
            value = point.value,
        ));
        if labels {
            out.push_str(&format!(
                "<text x=\"{cx:.2}\" y=\"{ly:.2}\" text-anchor=\"middle\" font-family=\"sans-serif\" font-size=\"10\">{label}</text>\n",
                cx = x + bar_width / 2.0,
                ly = canvas.baseline() + 14.0,
                label = escape(&point.label),
            ));
        }
    }
    out
}

fn line(chart: &Chart, canvas: &Canvas) -> String {
    let n = chart.points.len();
    if n == 0 {
        return String::new();
    }
    let step = if n > 1 {
        canvas.plot_width / (n - 1) as f64
    } else {
        0.0
    };
    let x = |i: usize| {
        if n > 1 {
            MARGIN_LEFT + step * i as f64
        } else {
            MARGIN_LEFT + canvas.plot_width / 2.0
        }
    };

    let coords: Vec<String> = chart
        .points
        .iter()
        .enumerate()
        .map(|(i, p)| format!("{:.2},{:.2}", x(i), canvas.y(p.value)))
        .collect();
    let mut out = format!(
        "<polyline points=\"{}\" fill=\"none\" stroke=\"{FILL}\" stroke-width=\"1.5\"/>\n",
        coords.join(" ")
    );

    let ly = canvas.baseline() + 14.0;
    let mut edge_labels = vec![(0, "start")];
    if n > 1 {
        edge_labels.push((n - 1, "end"));
    }
    for (i, anchor) in edge_labels {
        out.push_str(&format!(
            "<text x=\"{:.2}\" y=\"{ly:.2}\" text-anchor=\"{anchor}\" font-family=\"sans-serif\" font-size=\"10\">{}</text>\n",
            x(i),
            escape(&chart.points[i].label),
        ));
    }
    out
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
