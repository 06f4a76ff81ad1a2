use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Table};

use crate::chart::terminal::TerminalCanvas;
use crate::chart::Canvas;
use crate::controller::{SimulationController, Tone};
use crate::format::format_currency;
use crate::views::{ActionKind, DatasetView, ExecutiveView, OverviewView};

const PLACEHOLDER: &str = "-";

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn tone_cell(text: &str, tone: Tone) -> Cell {
    match tone {
        Tone::Success => Cell::new(text).fg(Color::Green),
        Tone::Danger => Cell::new(text).fg(Color::Red),
        Tone::Neutral => Cell::new(text),
    }
}

pub fn render_simulation(controller: &SimulationController<TerminalCanvas>) -> String {
    let controls = controller.controls();
    let mut params = new_table();
    params.set_header(vec!["Threshold", "Cost per missed SLA", "Cost per intervention"]);
    params.add_row(vec![
        controller.threshold_label().to_string(),
        format_currency(controls.cost_fn),
        format_currency(controls.cost_fp),
    ]);

    let mut metrics = new_table();
    metrics.set_header(vec![
        "Total Expected Cost",
        "Savings vs Baseline",
        "Interventions",
        "Missed SLAs",
    ]);
    match controller.display() {
        Some(display) => {
            metrics.add_row(vec![
                Cell::new(&display.total_cost),
                tone_cell(&display.savings, display.savings_tone),
                Cell::new(&display.interventions),
                Cell::new(&display.missed),
            ]);
        }
        None => {
            metrics.add_row(vec![PLACEHOLDER; 4]);
        }
    }

    let mut out = String::new();
    out.push_str(&params.to_string());
    out.push('\n');
    out.push_str(&metrics.to_string());
    out.push('\n');
    if let Some(record) = controller.last_applied() {
        out.push_str(&format!(
            "Run #{} at threshold {:.2}, updated {}\n",
            record.seq,
            record.request.threshold,
            record.applied_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }
    for canvas in [Canvas::CostCurve, Canvas::Tradeoff] {
        if let Some(frame) = controller.charts().frame(canvas) {
            out.push('\n');
            out.push_str(frame);
        }
    }
    out
}

pub fn render_overview(view: &OverviewView, risk_frame: Option<&str>) -> String {
    let mut metrics = new_table();
    metrics.set_header(vec![
        "Total Deliveries",
        "Predicted Breaches",
        "Breach Rate",
        "Risk Exposure",
    ]);
    metrics.add_row(vec![
        view.total_deliveries.clone(),
        view.predicted_breaches.clone(),
        view.breach_rate.clone(),
        view.risk_exposure.clone(),
    ]);

    let mut actions = new_table();
    actions.set_header(vec!["Recommended Actions"]);
    for item in &view.actions {
        let cell = match item.kind {
            ActionKind::Escalate => Cell::new(&item.text).fg(Color::Red),
            ActionKind::Prioritize => Cell::new(&item.text).fg(Color::Yellow),
            ActionKind::Nominal => Cell::new(&item.text),
        };
        actions.add_row(vec![cell]);
    }

    let mut out = String::new();
    out.push_str(&metrics.to_string());
    out.push('\n');
    if let Some(frame) = risk_frame {
        out.push('\n');
        out.push_str(frame);
        out.push('\n');
    }
    out.push_str(&actions.to_string());
    out
}

pub fn render_dataset(view: &DatasetView) -> String {
    let mut table = new_table();
    match view {
        DatasetView::Table { columns, rows } => {
            table.set_header(columns.clone());
            for row in rows {
                table.add_row(row.clone());
            }
        }
        DatasetView::Message { text } => {
            table.add_row(vec![text.clone()]);
        }
    }
    table.to_string()
}

pub fn render_executive(view: &ExecutiveView) -> String {
    let mut table = new_table();
    table.set_header(vec![
        "Risk Exposure",
        "Optimization Gain",
        "SLA Compliance",
        "Intervention Efficiency",
    ]);
    table.add_row(vec![
        view.risk.clone(),
        view.savings.clone(),
        view.compliance.clone(),
        view.efficiency.clone(),
    ]);
    format!("{table}\n\n{}", view.narrative)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::RiskDistribution;
    use crate::views::overview::action_items;

    #[test]
    fn dataset_message_has_no_header() {
        let out = render_dataset(&DatasetView::Message {
            text: "No data available.".to_string(),
        });
        assert!(out.contains("No data available."));
        assert_eq!(out.matches("No data available.").count(), 1);
    }

    #[test]
    fn overview_lists_actions() {
        let view = OverviewView {
            total_deliveries: "10".to_string(),
            predicted_breaches: "2".to_string(),
            breach_rate: "20.0%".to_string(),
            risk_exposure: "Rp\u{a0}100.000".to_string(),
            actions: action_items(&RiskDistribution {
                low: 0,
                medium: 0,
                high: 0,
            }),
            risk_chart: crate::chart::risk_distribution_chart(&RiskDistribution::default()),
        };
        let out = render_overview(&view, None);
        assert!(out.contains("All systems nominal."));
        assert!(out.contains("20.0%"));
    }
}
