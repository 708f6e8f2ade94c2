use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::absence::{AbsenceRequest, AbsenceStatus};
use super::id::Id;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ColumnView {
    pub id: AbsenceStatus,
    #[schema(example = "Pending")]
    pub title: String,
    pub count: usize,
    pub items: Vec<AbsenceRequest>,
}

/// Snapshot of the four status columns.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BoardView {
    pub columns: Vec<ColumnView>,
    #[schema(example = "Failed to load absence requests. Please try again.")]
    pub error: Option<String>,
}

#[cfg(test)]
impl BoardView {
    pub fn column(&self, status: AbsenceStatus) -> Option<&ColumnView> {
        self.columns.iter().find(|column| column.id == status)
    }
}

/// Drop event delivered by the drag-and-drop layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DragEvent {
    pub source_column_id: AbsenceStatus,
    /// Absent when the ticket was dropped outside every column.
    #[serde(default)]
    pub dest_column_id: Option<AbsenceStatus>,
    pub source_index: usize,
    #[serde(default)]
    pub dest_index: usize,
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "17")]
    pub dragged_item_id: Option<Id>,
}
