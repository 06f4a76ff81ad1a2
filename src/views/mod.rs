//! Read-only pages built from a single backend call each.

pub mod dataset;
pub mod executive;
pub mod overview;

pub use dataset::{load_dataset, DatasetView};
pub use executive::{load_executive, ExecutiveView};
pub use overview::{load_overview, ActionItem, ActionKind, OverviewView};
