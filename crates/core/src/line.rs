//! Order line kinds.

use serde::{Deserialize, Serialize};

/// Kind of an order line.
///
/// Only [`LineType::Line`] carries a product and a quantity; the other kinds
/// are layout lines (sections, subtotals, free text) on the order document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineType {
    #[default]
    Line,
    Subtotal,
    Title,
    Comment,
}

impl LineType {
    /// Whether the line is an ordinary orderable line.
    pub fn is_orderable(self) -> bool {
        matches!(self, LineType::Line)
    }
}
