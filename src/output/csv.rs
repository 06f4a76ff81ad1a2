use anyhow::Result;

use crate::client::CurvePoint;
use crate::views::DatasetView;

pub fn dataset_to_csv(view: &DatasetView) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    match view {
        DatasetView::Table { columns, rows } => {
            writer.write_record(columns)?;
            for row in rows {
                writer.write_record(row)?;
            }
        }
        DatasetView::Message { text } => {
            writer.write_record(["message"])?;
            writer.write_record([text])?;
        }
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

pub fn curves_to_csv(curves: &[CurvePoint]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(["threshold", "total_cost", "intervention_rate"])?;
    for point in curves {
        writer.write_record([
            format!("{:.4}", point.threshold),
            format!("{:.2}", point.total_cost),
            format!("{:.4}", point.intervention_rate),
        ])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}
