//! Sale module configuration (stored singleton).

use serde::{Deserialize, Serialize};

/// Margin used when the configuration leaves it unset.
pub const DEFAULT_EXCEPTION_MARGIN_DAYS: u32 = 10;

/// Stored sale configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleConfiguration {
    /// Age (in days) after which a sale stuck in exception is fixed
    /// automatically.
    pub sale_exception_margin: Option<u32>,
}

impl SaleConfiguration {
    pub fn margin_days(&self) -> u32 {
        match self.sale_exception_margin {
            Some(days) if days > 0 => days,
            _ => DEFAULT_EXCEPTION_MARGIN_DAYS,
        }
    }
}
