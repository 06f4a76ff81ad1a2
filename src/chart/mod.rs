pub mod terminal;

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::client::{CurvePoint, RiskDistribution};
use crate::format::format_threshold;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Canvas {
    RiskDistribution,
    CostCurve,
    Tradeoff,
}

impl fmt::Display for Canvas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RiskDistribution => "riskChart",
            Self::CostCurve => "costCurveChart",
            Self::Tradeoff => "tradeoffChart",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Line,
    Bar,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub label: String,
    pub values: Vec<f64>,
    pub fill: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
    pub x_title: Option<String>,
    pub y_title: Option<String>,
    /// Index into `labels` of a dashed vertical marker.
    pub reference_line: Option<usize>,
}

impl ChartSpec {
    /// Every dataset must carry one value per label.
    pub fn validate(&self) -> Result<(), ChartError> {
        for dataset in &self.datasets {
            if dataset.values.len() != self.labels.len() {
                return Err(ChartError::LengthMismatch {
                    label: dataset.label.clone(),
                    values: dataset.values.len(),
                    labels: self.labels.len(),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChartError {
    #[error("canvas {0} already hosts a live chart")]
    CanvasInUse(Canvas),
    #[error("dataset {label} has {values} values for {labels} labels")]
    LengthMismatch {
        label: String,
        values: usize,
        labels: usize,
    },
    #[error("chart backend failed on {canvas}: {reason}")]
    Backend { canvas: Canvas, reason: String },
}

/// Rendering surface that owns every live chart. Handles are tokens; the
/// backend releases a chart's resources when its handle is destroyed.
pub trait ChartBackend {
    type Handle;

    /// Checks a spec without touching any live chart.
    fn validate(&self, _canvas: Canvas, spec: &ChartSpec) -> Result<(), ChartError> {
        spec.validate()
    }

    fn create(&mut self, canvas: Canvas, spec: &ChartSpec) -> Result<Self::Handle, ChartError>;
    fn destroy(&mut self, handle: Self::Handle);
}

/// At most one live chart for a canvas.
#[derive(Debug)]
pub struct ChartSlot<H> {
    canvas: Canvas,
    handle: Option<H>,
}

impl<H> ChartSlot<H> {
    pub fn new(canvas: Canvas) -> Self {
        Self {
            canvas,
            handle: None,
        }
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn is_live(&self) -> bool {
        self.handle.is_some()
    }

    /// Destroys the current chart, if any, before creating its replacement.
    /// On a failed create the slot stays empty.
    pub fn replace<B>(&mut self, backend: &mut B, spec: &ChartSpec) -> Result<(), ChartError>
    where
        B: ChartBackend<Handle = H>,
    {
        self.clear(backend);
        self.handle = Some(backend.create(self.canvas, spec)?);
        Ok(())
    }

    pub fn clear<B>(&mut self, backend: &mut B)
    where
        B: ChartBackend<Handle = H>,
    {
        if let Some(old) = self.handle.take() {
            backend.destroy(old);
        }
    }
}

pub fn threshold_labels(curves: &[CurvePoint]) -> Vec<String> {
    curves.iter().map(|c| format_threshold(c.threshold)).collect()
}

/// Position of the label that matches `threshold` at two decimals.
pub fn reference_index(labels: &[String], threshold: f64) -> Option<usize> {
    let needle = format_threshold(threshold);
    labels.iter().position(|label| *label == needle)
}

pub fn cost_curve_chart(curves: &[CurvePoint], current_threshold: f64) -> ChartSpec {
    let labels = threshold_labels(curves);
    let reference_line = reference_index(&labels, current_threshold);
    ChartSpec {
        kind: ChartKind::Line,
        labels,
        datasets: vec![Dataset {
            label: "Total Expected Cost (Rp)".to_string(),
            values: curves.iter().map(|c| c.total_cost).collect(),
            fill: true,
        }],
        x_title: Some("Threshold".to_string()),
        y_title: Some("Cost (Rp)".to_string()),
        reference_line,
    }
}

pub fn tradeoff_chart(curves: &[CurvePoint]) -> ChartSpec {
    ChartSpec {
        kind: ChartKind::Line,
        labels: threshold_labels(curves),
        datasets: vec![Dataset {
            label: "Intervention Rate (%)".to_string(),
            values: curves.iter().map(|c| c.intervention_rate * 100.0).collect(),
            fill: false,
        }],
        x_title: Some("Threshold".to_string()),
        y_title: Some("%".to_string()),
        reference_line: None,
    }
}

pub fn risk_distribution_chart(distribution: &RiskDistribution) -> ChartSpec {
    ChartSpec {
        kind: ChartKind::Bar,
        labels: vec![
            "Low Risk".to_string(),
            "Medium Risk".to_string(),
            "High Risk".to_string(),
        ],
        datasets: vec![Dataset {
            label: "# of Deliveries".to_string(),
            values: vec![
                distribution.low as f64,
                distribution.medium as f64,
                distribution.high as f64,
            ],
            fill: true,
        }],
        x_title: None,
        y_title: None,
        reference_line: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::RecordingBackend;

    fn labels(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    fn curve(points: &[(f64, f64, f64)]) -> Vec<CurvePoint> {
        points
            .iter()
            .map(|(threshold, total_cost, intervention_rate)| CurvePoint {
                threshold: *threshold,
                total_cost: *total_cost,
                intervention_rate: *intervention_rate,
            })
            .collect()
    }

    #[test]
    fn reference_line_matches_exact_two_decimal_label() {
        let labels = labels(&["0.00", "0.25", "0.50", "0.75", "1.00"]);
        assert_eq!(reference_index(&labels, 0.50), Some(2));
        assert_eq!(reference_index(&labels, 0.33), None);
        assert_eq!(reference_index(&labels, 0.749), Some(3));
    }

    #[test]
    fn cost_curve_omits_marker_without_match() {
        let points = curve(&[(0.01, 900.0, 0.99), (0.06, 850.0, 0.9), (0.11, 800.0, 0.8)]);
        let spec = cost_curve_chart(&points, 0.5);
        assert_eq!(spec.labels, labels(&["0.01", "0.06", "0.11"]));
        assert!(spec.reference_line.is_none());

        let spec = cost_curve_chart(&points, 0.06);
        assert_eq!(spec.reference_line, Some(1));
    }

    #[test]
    fn tradeoff_scales_rates_to_percent() {
        let points = curve(&[(0.1, 0.0, 0.25), (0.2, 0.0, 0.5)]);
        let spec = tradeoff_chart(&points);
        assert_eq!(spec.datasets[0].values, vec![25.0, 50.0]);
        assert!(spec.reference_line.is_none());
    }

    #[test]
    fn risk_chart_orders_low_medium_high() {
        let spec = risk_distribution_chart(&RiskDistribution {
            low: 10,
            medium: 4,
            high: 1,
        });
        assert_eq!(spec.kind, ChartKind::Bar);
        assert_eq!(spec.datasets[0].values, vec![10.0, 4.0, 1.0]);
    }

    #[test]
    fn slot_destroys_before_creating() {
        let mut backend = RecordingBackend::default();
        let mut slot = ChartSlot::new(Canvas::CostCurve);
        let spec = tradeoff_chart(&curve(&[(0.5, 1.0, 0.5)]));

        slot.replace(&mut backend, &spec).expect("first create");
        slot.replace(&mut backend, &spec).expect("second create");

        assert_eq!(backend.live_on(Canvas::CostCurve), 1);
        assert_eq!(
            backend.log(),
            &["create costCurveChart#1", "destroy costCurveChart#1", "create costCurveChart#2"]
        );

        slot.clear(&mut backend);
        assert!(!slot.is_live());
        assert_eq!(backend.live_on(Canvas::CostCurve), 0);
    }
}
