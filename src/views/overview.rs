use serde::Serialize;
use tracing::error;

use crate::chart::{risk_distribution_chart, ChartSpec};
use crate::client::{DashboardApi, DashboardStats, RiskDistribution};
use crate::format::{format_count, format_currency, format_percent};

pub const NOMINAL_TEXT: &str = "All systems nominal. No immediate actions required.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Escalate,
    Prioritize,
    Nominal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionItem {
    pub kind: ActionKind,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewView {
    pub total_deliveries: String,
    pub predicted_breaches: String,
    pub breach_rate: String,
    pub risk_exposure: String,
    pub actions: Vec<ActionItem>,
    pub risk_chart: ChartSpec,
}

impl OverviewView {
    pub fn from_stats(stats: &DashboardStats) -> Self {
        Self {
            total_deliveries: format_count(stats.total_deliveries),
            predicted_breaches: format_count(stats.predicted_breaches),
            breach_rate: format_percent(stats.breach_rate),
            risk_exposure: format_currency(stats.total_risk_exposure),
            actions: action_items(&stats.risk_distribution),
            risk_chart: risk_distribution_chart(&stats.risk_distribution),
        }
    }
}

pub fn action_items(distribution: &RiskDistribution) -> Vec<ActionItem> {
    let mut items = Vec::new();
    if distribution.high > 0 {
        items.push(ActionItem {
            kind: ActionKind::Escalate,
            text: format!(
                "Escalate: {} deliveries require immediate intervention.",
                distribution.high
            ),
        });
    }
    if distribution.medium > 0 {
        items.push(ActionItem {
            kind: ActionKind::Prioritize,
            text: format!(
                "Prioritize: {} deliveries at risk. Monitor closely.",
                distribution.medium
            ),
        });
    }
    if items.is_empty() {
        items.push(ActionItem {
            kind: ActionKind::Nominal,
            text: NOMINAL_TEXT.to_string(),
        });
    }
    items
}

/// Failures are logged and leave the page empty.
pub async fn load_overview(api: &dyn DashboardApi) -> Option<OverviewView> {
    match api.stats().await {
        Ok(stats) => Some(OverviewView::from_stats(&stats)),
        Err(err) => {
            error!("dashboard stats unavailable: {err}");
            None
        }
    }
}
