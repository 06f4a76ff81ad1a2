use std::collections::BTreeMap;

use tracing::debug;

use crate::chart::{Canvas, ChartBackend, ChartError, ChartKind, ChartSpec};

const DEFAULT_HEIGHT: usize = 10;
const AXIS_WIDTH: usize = 14;

#[derive(Debug, PartialEq, Eq)]
pub struct TerminalChartHandle {
    canvas: Canvas,
    id: u64,
}

impl TerminalChartHandle {
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }
}

#[derive(Debug)]
struct LiveChart {
    id: u64,
    frame: String,
}

/// Text canvases; each live chart keeps its rendered frame until destroyed.
#[derive(Debug)]
pub struct TerminalCanvas {
    height: usize,
    next_id: u64,
    live: BTreeMap<Canvas, LiveChart>,
}

impl Default for TerminalCanvas {
    fn default() -> Self {
        Self::new(DEFAULT_HEIGHT)
    }
}

impl TerminalCanvas {
    pub fn new(height: usize) -> Self {
        Self {
            height: height.max(2),
            next_id: 1,
            live: BTreeMap::new(),
        }
    }

    pub fn frame(&self, canvas: Canvas) -> Option<&str> {
        self.live.get(&canvas).map(|chart| chart.frame.as_str())
    }

    pub fn live_charts(&self) -> usize {
        self.live.len()
    }
}

impl ChartBackend for TerminalCanvas {
    type Handle = TerminalChartHandle;

    fn create(&mut self, canvas: Canvas, spec: &ChartSpec) -> Result<Self::Handle, ChartError> {
        if self.live.contains_key(&canvas) {
            return Err(ChartError::CanvasInUse(canvas));
        }
        spec.validate()?;
        let id = self.next_id;
        self.next_id += 1;
        let frame = render_frame(spec, self.height);
        self.live.insert(canvas, LiveChart { id, frame });
        debug!("created chart {id} on {canvas}");
        Ok(TerminalChartHandle { canvas, id })
    }

    fn destroy(&mut self, handle: Self::Handle) {
        let owned = self
            .live
            .get(&handle.canvas)
            .map(|chart| chart.id == handle.id)
            .unwrap_or(false);
        if owned {
            self.live.remove(&handle.canvas);
            debug!("destroyed chart {} on {}", handle.id, handle.canvas);
        }
    }
}

fn render_frame(spec: &ChartSpec, height: usize) -> String {
    let mut out = String::new();
    for dataset in &spec.datasets {
        out.push_str(&dataset.label);
        out.push('\n');
        if spec.labels.is_empty() {
            out.push_str("(no data)\n");
            continue;
        }
        let cell = match spec.kind {
            ChartKind::Line => 2,
            ChartKind::Bar => spec.labels.iter().map(String::len).max().unwrap_or(1) + 2,
        };
        let (lo, hi) = value_range(&dataset.values, spec.kind);
        let rows = plot_rows(&dataset.values, lo, hi, height);

        for row in (0..height).rev() {
            let axis = if row + 1 == height {
                format!("{hi:>w$.0} |", w = AXIS_WIDTH - 2)
            } else if row == 0 {
                format!("{lo:>w$.0} |", w = AXIS_WIDTH - 2)
            } else {
                format!("{:>w$}|", "", w = AXIS_WIDTH - 1)
            };
            out.push_str(&axis);
            for (idx, level) in rows.iter().enumerate() {
                let mark = match (spec.kind, level) {
                    (ChartKind::Bar, Some(level)) if row <= *level => '#',
                    (ChartKind::Line, Some(level)) if row == *level => '*',
                    _ if spec.reference_line == Some(idx) => ':',
                    _ => ' ',
                };
                out.push(mark);
                out.push_str(&" ".repeat(cell - 1));
            }
            out.push('\n');
        }
        out.push_str(&format!("{:>w$}+", "", w = AXIS_WIDTH - 1));
        out.push_str(&"-".repeat(rows.len() * cell));
        out.push('\n');
        out.push_str(&x_axis_labels(spec, cell));
    }
    if let Some(title) = &spec.x_title {
        out.push_str(&format!("{:>w$}{title}", "", w = AXIS_WIDTH));
        if let Some(y) = &spec.y_title {
            out.push_str(&format!(" / {y}"));
        }
        out.push('\n');
    }
    out
}

fn value_range(values: &[f64], kind: ChartKind) -> (f64, f64) {
    let finite = values.iter().copied().filter(|v| v.is_finite());
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for v in finite {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if !lo.is_finite() {
        return (0.0, 1.0);
    }
    if kind == ChartKind::Bar {
        lo = lo.min(0.0);
    }
    (lo, hi)
}

fn plot_rows(values: &[f64], lo: f64, hi: f64, height: usize) -> Vec<Option<usize>> {
    let span = hi - lo;
    values
        .iter()
        .map(|v| {
            if !v.is_finite() {
                return None;
            }
            if span <= f64::EPSILON {
                return Some(height / 2);
            }
            let scaled = ((v - lo) / span * (height - 1) as f64).round() as usize;
            Some(scaled.min(height - 1))
        })
        .collect()
}

fn x_axis_labels(spec: &ChartSpec, cell: usize) -> String {
    let indent = " ".repeat(AXIS_WIDTH);
    match spec.kind {
        ChartKind::Bar => {
            let mut line = indent;
            for label in &spec.labels {
                line.push_str(&format!("{label:<cell$}"));
            }
            line.push('\n');
            line
        }
        ChartKind::Line => {
            let first = spec.labels.first().map(String::as_str).unwrap_or("");
            let last = spec.labels.last().map(String::as_str).unwrap_or("");
            let width = spec.labels.len() * cell;
            let gap = width.saturating_sub(first.len() + last.len());
            let mut line = format!("{indent}{first}{}{last}\n", " ".repeat(gap));
            if let Some(idx) = spec.reference_line {
                if let Some(label) = spec.labels.get(idx) {
                    line.push_str(&format!("{indent}{}^ {label}\n", " ".repeat(idx * cell)));
                }
            }
            line
        }
    }
}
