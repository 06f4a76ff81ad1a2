use serde::Serialize;
use tracing::error;

use crate::client::{DashboardApi, ImpactSummary, SimulationRequest};
use crate::format::{format_currency, format_optional_percent};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutiveView {
    pub risk: String,
    pub savings: String,
    pub compliance: String,
    pub efficiency: String,
    pub narrative: String,
}

impl ExecutiveView {
    pub fn from_impact(impact: &ImpactSummary) -> Self {
        let risk = format_currency(impact.total_cost);
        let efficiency = precision_text(impact);
        let narrative = format!(
            "Current risk exposure is {risk}. The system successfully identified {} critical \
             breaches, preventing potential penalties.\n\nIntervention precision is at {efficiency}, \
             meaning most actions taken were necessary. Recommendation: Maintain current threshold \
             or tighten slightly to reduce FN if budget allows.",
            impact.tp_count
        );
        Self {
            savings: format_currency(impact.savings_vs_baseline.max(0.0)),
            compliance: format_optional_percent(impact.compliance_rate()),
            risk,
            efficiency,
            narrative,
        }
    }
}

/// `N/A` exactly when nothing was flagged.
pub fn precision_text(impact: &ImpactSummary) -> String {
    format_optional_percent(impact.precision())
}

pub async fn load_executive(
    api: &dyn DashboardApi,
    request: &SimulationRequest,
) -> Option<ExecutiveView> {
    match api.simulate(request).await {
        Ok(response) => Some(ExecutiveView::from_impact(&response.impact)),
        Err(err) => {
            error!("executive summary unavailable: {err}");
            None
        }
    }
}
