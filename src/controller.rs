//! Interactive cost simulation: parameter controls, the four headline
//! metrics, and the cost-curve / trade-off charts.
//!
//! Every run posts the current controls to the backend. A successful
//! response replaces the metrics and both charts; a failed one is logged and
//! leaves the previous render in place. Each canvas holds at most one live
//! chart: the old chart is destroyed before its replacement is created.
//! Both chart specs are validated before either canvas changes, and a
//! backend that fails midway gets the previous charts re-created.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::chart::{
    cost_curve_chart, tradeoff_chart, Canvas, ChartBackend, ChartError, ChartSlot, ChartSpec,
};
use crate::client::{ApiError, DashboardApi, ImpactSummary, SimulationRequest, SimulationResponse};
use crate::format::{format_count, format_currency, format_threshold};

/// What to do with a response whose request is no longer the latest issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StalePolicy {
    DiscardStale,
    ApplyInArrivalOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimulationControls {
    pub threshold: f64,
    pub cost_fn: f64,
    pub cost_fp: f64,
}

impl SimulationControls {
    pub fn request(&self) -> SimulationRequest {
        SimulationRequest {
            threshold: self.threshold,
            cost_fn: self.cost_fn,
            cost_fp: self.cost_fp,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    #[default]
    Neutral,
    Success,
    Danger,
}

pub fn savings_tone(savings_vs_baseline: f64) -> Tone {
    if savings_vs_baseline < 0.0 {
        Tone::Danger
    } else {
        Tone::Success
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationDisplay {
    pub total_cost: String,
    pub savings: String,
    pub savings_tone: Tone,
    pub interventions: String,
    pub missed: String,
}

impl SimulationDisplay {
    pub fn from_impact(impact: &ImpactSummary) -> Self {
        Self {
            total_cost: format_currency(impact.total_cost),
            savings: format_currency(impact.savings_vs_baseline),
            savings_tone: savings_tone(impact.savings_vs_baseline),
            interventions: format_count(impact.intervention_count),
            missed: format_count(impact.missed_sla_count),
        }
    }
}

/// A request that has been issued but not yet completed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingRun {
    seq: u64,
    request: SimulationRequest,
}

impl PendingRun {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn request(&self) -> &SimulationRequest {
        &self.request
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Applied,
    Stale,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunRecord {
    pub seq: u64,
    pub request: SimulationRequest,
    pub applied_at: DateTime<Utc>,
}

pub struct SimulationController<B: ChartBackend> {
    api: Arc<dyn DashboardApi>,
    charts: B,
    controls: SimulationControls,
    threshold_label: String,
    display: Option<SimulationDisplay>,
    cost_chart: ChartSlot<B::Handle>,
    tradeoff_chart: ChartSlot<B::Handle>,
    rendered: Option<(ChartSpec, ChartSpec)>,
    policy: StalePolicy,
    issued: u64,
    last_applied: Option<RunRecord>,
    last_response: Option<SimulationResponse>,
}

impl<B: ChartBackend> SimulationController<B> {
    pub fn new(
        api: Arc<dyn DashboardApi>,
        charts: B,
        controls: SimulationControls,
        policy: StalePolicy,
    ) -> Self {
        let controls = SimulationControls {
            threshold: controls.threshold.clamp(0.0, 1.0),
            ..controls
        };
        Self {
            api,
            charts,
            threshold_label: format_threshold(controls.threshold),
            controls,
            display: None,
            cost_chart: ChartSlot::new(Canvas::CostCurve),
            tradeoff_chart: ChartSlot::new(Canvas::Tradeoff),
            rendered: None,
            policy,
            issued: 0,
            last_applied: None,
            last_response: None,
        }
    }

    pub fn api(&self) -> Arc<dyn DashboardApi> {
        Arc::clone(&self.api)
    }

    pub fn charts(&self) -> &B {
        &self.charts
    }

    pub fn controls(&self) -> &SimulationControls {
        &self.controls
    }

    pub fn threshold_label(&self) -> &str {
        &self.threshold_label
    }

    /// `None` until the first successful run.
    pub fn display(&self) -> Option<&SimulationDisplay> {
        self.display.as_ref()
    }

    pub fn last_applied(&self) -> Option<&RunRecord> {
        self.last_applied.as_ref()
    }

    pub fn last_response(&self) -> Option<&SimulationResponse> {
        self.last_response.as_ref()
    }

    pub fn has_live_charts(&self) -> bool {
        self.cost_chart.is_live() || self.tradeoff_chart.is_live()
    }

    /// Initial run on startup.
    pub async fn load(&mut self) -> RunOutcome {
        self.run().await
    }

    pub async fn run_clicked(&mut self) -> RunOutcome {
        self.run().await
    }

    /// Live slider movement: moves the control and its label, no request.
    /// Returns false when `raw` holds no number.
    pub fn threshold_input(&mut self, raw: &str) -> bool {
        match parse_control("threshold", raw) {
            Some(value) => {
                self.set_threshold(value);
                true
            }
            None => false,
        }
    }

    /// Slider released: moves the control and runs. Input without a number
    /// issues no request and fails the run.
    pub async fn threshold_changed(&mut self, raw: &str) -> RunOutcome {
        if !self.threshold_input(raw) {
            return RunOutcome::Failed;
        }
        self.run().await
    }

    pub fn set_cost_fn(&mut self, raw: &str) {
        if let Some(value) = parse_control("cost_fn", raw) {
            self.controls.cost_fn = value;
        }
    }

    pub fn set_cost_fp(&mut self, raw: &str) {
        if let Some(value) = parse_control("cost_fp", raw) {
            self.controls.cost_fp = value;
        }
    }

    pub async fn run(&mut self) -> RunOutcome {
        let pending = self.begin_run();
        let result = self.api.simulate(pending.request()).await;
        self.complete_run(pending, result)
    }

    /// Issues the next request from the current controls.
    pub fn begin_run(&mut self) -> PendingRun {
        self.issued += 1;
        let pending = PendingRun {
            seq: self.issued,
            request: self.controls.request(),
        };
        info!(
            "simulation #{} threshold={} cost_fn={} cost_fp={}",
            pending.seq, pending.request.threshold, pending.request.cost_fn, pending.request.cost_fp
        );
        pending
    }

    pub fn complete_run(
        &mut self,
        pending: PendingRun,
        result: Result<SimulationResponse, ApiError>,
    ) -> RunOutcome {
        let response = match result {
            Ok(response) => response,
            Err(err) => {
                error!("simulation #{} failed: {err}", pending.seq);
                return RunOutcome::Failed;
            }
        };
        if self.policy == StalePolicy::DiscardStale && pending.seq < self.issued {
            info!(
                "discarding simulation #{}; #{} is the latest issued",
                pending.seq, self.issued
            );
            return RunOutcome::Stale;
        }
        if let Err(err) = self.apply(&response) {
            error!("simulation #{} could not be rendered: {err}", pending.seq);
            return RunOutcome::Failed;
        }
        self.last_applied = Some(RunRecord {
            seq: pending.seq,
            request: pending.request,
            applied_at: Utc::now(),
        });
        self.last_response = Some(response);
        RunOutcome::Applied
    }

    /// Destroys both charts; the controller renders nothing afterwards.
    pub fn teardown(&mut self) {
        self.cost_chart.clear(&mut self.charts);
        self.tradeoff_chart.clear(&mut self.charts);
        self.rendered = None;
    }

    fn set_threshold(&mut self, value: f64) {
        self.controls.threshold = value.clamp(0.0, 1.0);
        self.threshold_label = format_threshold(self.controls.threshold);
    }

    fn apply(&mut self, response: &SimulationResponse) -> Result<(), ChartError> {
        let cost_spec = cost_curve_chart(&response.curves, response.impact.threshold);
        let tradeoff_spec = tradeoff_chart(&response.curves);
        self.charts.validate(Canvas::CostCurve, &cost_spec)?;
        self.charts.validate(Canvas::Tradeoff, &tradeoff_spec)?;
        if let Err(err) = self.render(&cost_spec, &tradeoff_spec) {
            self.restore();
            return Err(err);
        }
        self.display = Some(SimulationDisplay::from_impact(&response.impact));
        self.rendered = Some((cost_spec, tradeoff_spec));
        Ok(())
    }

    fn render(&mut self, cost: &ChartSpec, tradeoff: &ChartSpec) -> Result<(), ChartError> {
        self.cost_chart.replace(&mut self.charts, cost)?;
        self.tradeoff_chart.replace(&mut self.charts, tradeoff)
    }

    /// Re-creates the last applied charts after a render failed midway.
    fn restore(&mut self) {
        let Some((cost, tradeoff)) = self.rendered.take() else {
            self.teardown();
            return;
        };
        if let Err(err) = self.render(&cost, &tradeoff) {
            warn!("could not restore previous charts: {err}");
        }
        self.rendered = Some((cost, tradeoff));
    }
}

/// Lenient numeric parsing: the longest leading number wins, as browsers
/// read form controls. Unparseable input keeps the previous value.
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let mut end = trimmed.len();
    while end > 0 {
        if let Some(prefix) = trimmed.get(..end) {
            if let Ok(value) = prefix.parse::<f64>() {
                if value.is_finite() {
                    return Some(value);
                }
            }
        }
        end -= 1;
    }
    None
}

fn parse_control(name: &str, raw: &str) -> Option<f64> {
    let parsed = parse_number(raw);
    if parsed.is_none() {
        warn!("ignoring non-numeric {name} input {raw:?}");
    }
    parsed
}
