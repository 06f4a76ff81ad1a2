use serde::Serialize;
use serde_json::Value;
use tracing::error;

use crate::client::{ApiError, DashboardApi, DataRow};

pub const NO_DATA: &str = "No data available.";
pub const LOAD_FAILED: &str = "Failed to load data.";

/// The dataset page: either the sample table or one message row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DatasetView {
    Table {
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    Message {
        text: String,
    },
}

impl DatasetView {
    /// Columns come from the first row; every row is read through them.
    pub fn from_rows(rows: &[DataRow]) -> Self {
        let Some(first) = rows.first() else {
            return Self::message(NO_DATA);
        };
        let columns = first.keys().cloned().collect::<Vec<_>>();
        let rows = rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|col| row.get(col).map(cell_text).unwrap_or_default())
                    .collect()
            })
            .collect();
        Self::Table { columns, rows }
    }

    pub fn from_result(result: Result<Vec<DataRow>, ApiError>) -> Self {
        match result {
            Ok(rows) => Self::from_rows(&rows),
            // only an `error` field is shown inline; `detail` bodies read as failures
            Err(ApiError::Backend(message)) => Self::message(format!("Error: {message}")),
            Err(err) => {
                error!("failed to load dataset: {err}");
                Self::message(LOAD_FAILED)
            }
        }
    }

    fn message(text: impl Into<String>) -> Self {
        Self::Message { text: text.into() }
    }
}

pub async fn load_dataset(api: &dyn DashboardApi) -> DatasetView {
    DatasetView::from_result(api.sample_rows().await)
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => format!("{f:.0}"),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}
