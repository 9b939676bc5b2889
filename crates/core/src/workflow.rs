//! Order lifecycle and its transition table.
//!
//! Modules extend the base table instead of patching the order type: an
//! extension registers extra `(from, to)` pairs and the order checks every
//! state change against the resulting [`Workflow`].

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Lifecycle state shared by sale and purchase orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderState {
    Draft,
    Quotation,
    Confirmed,
    Processing,
    Done,
    Cancelled,
}

impl OrderState {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderState::Draft => "draft",
            OrderState::Quotation => "quotation",
            OrderState::Confirmed => "confirmed",
            OrderState::Processing => "processing",
            OrderState::Done => "done",
            OrderState::Cancelled => "cancelled",
        }
    }
}

impl core::fmt::Display for OrderState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Allowed state transitions of an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workflow {
    transitions: HashSet<(OrderState, OrderState)>,
}

impl Workflow {
    /// The base order workflow.
    pub fn base() -> Self {
        use OrderState::*;
        Self::from_transitions([
            (Draft, Quotation),
            (Quotation, Confirmed),
            (Quotation, Draft),
            (Confirmed, Processing),
            (Processing, Processing),
            (Processing, Done),
            (Draft, Cancelled),
            (Quotation, Cancelled),
            (Cancelled, Draft),
        ])
    }

    pub fn from_transitions(
        transitions: impl IntoIterator<Item = (OrderState, OrderState)>,
    ) -> Self {
        Self {
            transitions: transitions.into_iter().collect(),
        }
    }

    /// Register extra transitions on top of the current table.
    pub fn extend(
        mut self,
        transitions: impl IntoIterator<Item = (OrderState, OrderState)>,
    ) -> Self {
        self.transitions.extend(transitions);
        self
    }

    pub fn allows(&self, from: OrderState, to: OrderState) -> bool {
        self.transitions.contains(&(from, to))
    }

    pub fn check(&self, from: OrderState, to: OrderState) -> DomainResult<()> {
        if self.allows(from, to) {
            Ok(())
        } else {
            Err(DomainError::conflict(format!(
                "transition from {from} to {to} is not allowed"
            )))
        }
    }
}

impl Default for Workflow {
    fn default() -> Self {
        Self::base()
    }
}
