//! Exception resolution of cancelled fulfillment records and invoices.

use serde::{Deserialize, Serialize};

/// How a cancelled record was reconciled against its order.
///
/// A record is classified exactly once: once `Ignored` or `Recreated` it is
/// never reclassified. Only `Unclassified` records are candidates for the
/// exception-resolution step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    #[default]
    Unclassified,
    /// The quantity (or amount) is considered lost; nothing replaces it.
    Ignored,
    /// The record was regenerated elsewhere.
    Recreated,
}

impl Resolution {
    pub fn is_classified(self) -> bool {
        !matches!(self, Resolution::Unclassified)
    }

    /// Classify an unclassified record.
    ///
    /// Returns `None` when the record was already classified.
    pub fn classify(self, recreate: bool) -> Option<Resolution> {
        if self.is_classified() {
            return None;
        }
        Some(if recreate {
            Resolution::Recreated
        } else {
            Resolution::Ignored
        })
    }
}
