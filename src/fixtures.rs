use std::cell::RefCell;
use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::chart::{Canvas, ChartBackend, ChartError, ChartSpec};
use crate::client::{
    ApiError, CurvePoint, DashboardApi, DashboardStats, DataRow, ImpactSummary,
    SimulationRequest, SimulationResponse,
};

/// Deterministic stand-in for the backend: costs scale with the request.
#[derive(Default)]
pub struct FakeApi {
    pub stats: Option<DashboardStats>,
    pub rows: Option<Vec<DataRow>>,
    pub fail_simulation: Option<String>,
    pub requests: Mutex<Vec<SimulationRequest>>,
}

impl FakeApi {
    pub fn requests(&self) -> Vec<SimulationRequest> {
        self.requests.lock().expect("request log poisoned").clone()
    }
}

pub fn response_for(request: &SimulationRequest) -> SimulationResponse {
    let flagged = ((1.0 - request.threshold) * 100.0).round() as u64;
    let tp = flagged / 2;
    let fp = flagged - tp;
    let fn_ = 20;
    let total_cost = fn_ as f64 * request.cost_fn + fp as f64 * request.cost_fp;
    let baseline = 20.0 * request.cost_fn + 25.0 * request.cost_fp;
    SimulationResponse {
        impact: ImpactSummary {
            threshold: request.threshold,
            total_cost,
            savings_vs_baseline: baseline - total_cost,
            cost_fn_total: Some(fn_ as f64 * request.cost_fn),
            cost_fp_total: Some(fp as f64 * request.cost_fp),
            intervention_count: flagged,
            missed_sla_count: fn_,
            tp_count: tp,
            fp_count: fp,
            tn_count: 100 - flagged,
            fn_count: fn_,
        },
        curves: [0.0, 0.25, 0.5, 0.75, 1.0]
            .iter()
            .map(|t| CurvePoint {
                threshold: *t,
                total_cost: (1.0 - t) * request.cost_fp * 100.0 + t * request.cost_fn * 40.0,
                intervention_rate: 1.0 - t,
            })
            .collect(),
    }
}

#[async_trait]
impl DashboardApi for FakeApi {
    async fn stats(&self) -> Result<DashboardStats, ApiError> {
        self.stats
            .clone()
            .ok_or_else(|| ApiError::Backend("Stats unavailable".to_string()))
    }

    async fn sample_rows(&self) -> Result<Vec<DataRow>, ApiError> {
        self.rows
            .clone()
            .ok_or_else(|| ApiError::Backend("Data not available".to_string()))
    }

    async fn simulate(&self, request: &SimulationRequest) -> Result<SimulationResponse, ApiError> {
        self.requests
            .lock()
            .expect("request log poisoned")
            .push(*request);
        if let Some(message) = &self.fail_simulation {
            return Err(ApiError::Backend(message.clone()));
        }
        Ok(response_for(request))
    }
}

/// Chart backend that records every create/destroy and counts live charts.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    next_id: u64,
    live: BTreeMap<Canvas, Vec<u64>>,
    specs: BTreeMap<Canvas, ChartSpec>,
    log: Vec<String>,
    attempts: BTreeMap<Canvas, usize>,
    checks: RefCell<BTreeMap<Canvas, usize>>,
    fail_create: Option<(Canvas, usize)>,
    reject_spec: Option<(Canvas, usize)>,
}

#[derive(Debug)]
pub struct RecordedHandle {
    canvas: Canvas,
    id: u64,
}

impl RecordingBackend {
    /// The `nth` create on `canvas` (1-based) fails.
    pub fn failing_create(canvas: Canvas, nth: usize) -> Self {
        Self {
            fail_create: Some((canvas, nth)),
            ..Self::default()
        }
    }

    /// The `nth` validation on `canvas` (1-based) rejects its spec.
    pub fn rejecting_spec(canvas: Canvas, nth: usize) -> Self {
        Self {
            reject_spec: Some((canvas, nth)),
            ..Self::default()
        }
    }

    pub fn live_on(&self, canvas: Canvas) -> usize {
        self.live.get(&canvas).map(Vec::len).unwrap_or(0)
    }

    pub fn last_spec(&self, canvas: Canvas) -> Option<&ChartSpec> {
        self.specs.get(&canvas)
    }

    pub fn log(&self) -> &[String] {
        &self.log
    }
}

impl ChartBackend for RecordingBackend {
    type Handle = RecordedHandle;

    fn validate(&self, canvas: Canvas, spec: &ChartSpec) -> Result<(), ChartError> {
        let check = {
            let mut checks = self.checks.borrow_mut();
            let count = checks.entry(canvas).or_default();
            *count += 1;
            *count
        };
        if self.reject_spec == Some((canvas, check)) {
            return Err(ChartError::Backend {
                canvas,
                reason: format!("spec check {check} rejected"),
            });
        }
        spec.validate()
    }

    fn create(&mut self, canvas: Canvas, spec: &ChartSpec) -> Result<Self::Handle, ChartError> {
        let attempt = {
            let count = self.attempts.entry(canvas).or_default();
            *count += 1;
            *count
        };
        if self.fail_create == Some((canvas, attempt)) {
            self.log.push(format!("fail {canvas}"));
            return Err(ChartError::Backend {
                canvas,
                reason: format!("create {attempt} refused"),
            });
        }
        self.next_id += 1;
        let id = self.next_id;
        self.live.entry(canvas).or_default().push(id);
        self.specs.insert(canvas, spec.clone());
        self.log.push(format!("create {canvas}#{id}"));
        Ok(RecordedHandle { canvas, id })
    }

    fn destroy(&mut self, handle: Self::Handle) {
        if let Some(ids) = self.live.get_mut(&handle.canvas) {
            ids.retain(|id| *id != handle.id);
        }
        self.log
            .push(format!("destroy {}#{}", handle.canvas, handle.id));
    }
}
