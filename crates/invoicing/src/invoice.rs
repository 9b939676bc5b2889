use serde::{Deserialize, Serialize};

use forgeerp_core::{DomainError, DomainResult, Entity, Resolution, record_id};
use forgeerp_products::ProductId;
use forgeerp_stock::MoveId;

record_id!(
    /// Invoice identifier.
    InvoiceId
);

/// Invoice state lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceState {
    Draft,
    Validated,
    Posted,
    Paid,
    Cancelled,
}

impl InvoiceState {
    pub fn as_str(self) -> &'static str {
        match self {
            InvoiceState::Draft => "draft",
            InvoiceState::Validated => "validated",
            InvoiceState::Posted => "posted",
            InvoiceState::Paid => "paid",
            InvoiceState::Cancelled => "cancelled",
        }
    }

    /// States an invoice may be in while its order is revoked.
    pub fn allows_revoke(self) -> bool {
        matches!(
            self,
            InvoiceState::Cancelled | InvoiceState::Draft | InvoiceState::Posted | InvoiceState::Paid
        )
    }
}

/// Invoice line, optionally generated from stock moves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub product: Option<ProductId>,
    pub description: String,
    pub quantity: f64,
    /// Price in smallest currency unit (e.g., cents).
    pub unit_price: i64,
    pub stock_moves: Vec<MoveId>,
}

/// Invoice document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub number: Option<String>,
    pub state: InvoiceState,
    pub lines: Vec<InvoiceLine>,
    pub resolution: Resolution,
}

impl Invoice {
    pub fn new(lines: Vec<InvoiceLine>) -> Self {
        Self {
            id: InvoiceId::generate(),
            number: None,
            state: InvoiceState::Draft,
            lines,
            resolution: Resolution::Unclassified,
        }
    }

    pub fn with_number(mut self, number: impl Into<String>) -> Self {
        self.number = Some(number.into());
        self
    }

    pub fn with_state(mut self, state: InvoiceState) -> Self {
        self.state = state;
        self
    }

    /// Cancelled and not yet reconciled against its order.
    pub fn is_pending_exception(&self) -> bool {
        self.state == InvoiceState::Cancelled && !self.resolution.is_classified()
    }

    pub fn stock_moves(&self) -> impl Iterator<Item = MoveId> + '_ {
        self.lines.iter().flat_map(|l| l.stock_moves.iter().copied())
    }

    /// Cancel a draft invoice. Cancelling a cancelled invoice is a no-op.
    pub fn cancel(&mut self) -> DomainResult<()> {
        match self.state {
            InvoiceState::Cancelled => Ok(()),
            InvoiceState::Draft | InvoiceState::Validated => {
                self.state = InvoiceState::Cancelled;
                Ok(())
            }
            other => Err(DomainError::invariant(format!(
                "invoice \"{}\" is {} and cannot be cancelled",
                self.rec_name(),
                other.as_str()
            ))),
        }
    }

    /// Record how the cancelled invoice was reconciled.
    ///
    /// An ignored invoice stays on its order but no longer invoices any
    /// stock move.
    pub fn resolve(&mut self, recreate: bool) -> DomainResult<()> {
        if self.state != InvoiceState::Cancelled {
            return Err(DomainError::invariant(format!(
                "invoice \"{}\" is {} and cannot be reconciled",
                self.rec_name(),
                self.state.as_str()
            )));
        }
        self.resolution = self.resolution.classify(recreate).ok_or_else(|| {
            DomainError::conflict(format!(
                "invoice \"{}\" is already reconciled",
                self.rec_name()
            ))
        })?;
        if self.resolution == Resolution::Ignored {
            for line in &mut self.lines {
                line.stock_moves.clear();
            }
        }
        Ok(())
    }
}

impl Entity for Invoice {
    type Id = InvoiceId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn rec_name(&self) -> String {
        match &self.number {
            Some(number) => number.clone(),
            None => format!("({})", self.id),
        }
    }
}
