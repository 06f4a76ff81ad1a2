pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// One row of the dataset sample. Key order follows the backend payload.
pub type DataRow = Map<String, Value>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned {status}: {preview}")]
    Status {
        url: String,
        status: u16,
        preview: String,
    },
    /// An `error` field in the payload.
    #[error("backend reported an error: {0}")]
    Backend(String),
    /// A `detail` field, as the backend's framework sends on rejected requests.
    #[error("backend rejected the request: {0}")]
    Detail(String),
    #[error("unexpected payload from {url}: {reason}")]
    Malformed { url: String, reason: String },
}

impl ApiError {
    /// Backend-reported failures carry a message meant for display.
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            Self::Backend(message) | Self::Detail(message) => Some(message.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationRequest {
    pub threshold: f64,
    pub cost_fn: f64,
    pub cost_fp: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResponse {
    pub impact: ImpactSummary,
    #[serde(default)]
    pub curves: Vec<CurvePoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactSummary {
    pub threshold: f64,
    pub total_cost: f64,
    pub savings_vs_baseline: f64,
    #[serde(default)]
    pub cost_fn_total: Option<f64>,
    #[serde(default)]
    pub cost_fp_total: Option<f64>,
    pub intervention_count: u64,
    pub missed_sla_count: u64,
    pub tp_count: u64,
    pub fp_count: u64,
    pub tn_count: u64,
    pub fn_count: u64,
}

impl ImpactSummary {
    pub fn total_count(&self) -> u64 {
        self.tp_count + self.fp_count + self.tn_count + self.fn_count
    }

    /// Share of interventions that were necessary; `None` when nothing was flagged.
    pub fn precision(&self) -> Option<f64> {
        let flagged = self.tp_count + self.fp_count;
        if flagged == 0 {
            return None;
        }
        Some(self.tp_count as f64 / flagged as f64)
    }

    pub fn compliance_rate(&self) -> Option<f64> {
        let total = self.total_count();
        if total == 0 {
            return None;
        }
        Some(1.0 - self.missed_sla_count as f64 / total as f64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub threshold: f64,
    pub total_cost: f64,
    pub intervention_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_deliveries: u64,
    pub predicted_breaches: u64,
    pub breach_rate: f64,
    pub total_risk_exposure: f64,
    pub risk_distribution: RiskDistribution,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskDistribution {
    pub low: u64,
    pub medium: u64,
    pub high: u64,
}

#[async_trait]
pub trait DashboardApi: Send + Sync {
    async fn stats(&self) -> Result<DashboardStats, ApiError>;
    async fn sample_rows(&self) -> Result<Vec<DataRow>, ApiError>;
    async fn simulate(&self, request: &SimulationRequest) -> Result<SimulationResponse, ApiError>;
}

/// The error a payload reports through an `error` or `detail` field, if any.
/// `error` wins when both are set.
pub fn backend_error(value: &Value) -> Option<ApiError> {
    let object = value.as_object()?;
    if let Some(message) = field_message(object, "error") {
        return Some(ApiError::Backend(message));
    }
    field_message(object, "detail").map(ApiError::Detail)
}

fn field_message(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::Null | Value::Bool(false) => None,
        Value::String(message) if message.is_empty() => None,
        Value::String(message) => Some(message.clone()),
        other => Some(other.to_string()),
    }
}
