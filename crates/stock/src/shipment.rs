use serde::{Deserialize, Serialize};

use forgeerp_core::{DomainError, DomainResult, Entity, record_id};

use crate::stock_move::MoveId;

record_id!(
    /// Shipment identifier.
    ShipmentId
);

/// Kind of shipment document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentKind {
    /// Goods leaving to a customer.
    CustomerOut,
    /// Goods returned by a customer.
    CustomerReturn,
    /// Goods received from a supplier.
    SupplierIn,
    /// Goods returned to a supplier.
    SupplierReturn,
}

/// Move collections of a shipment.
///
/// Customer shipments hand goods over through `Outgoing` moves fed by
/// `Inventory` moves; supplier receptions come in through `Incoming` moves
/// and are stored by `Inventory` moves. Returns to suppliers only have
/// `Outgoing` moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveCollection {
    Inventory,
    Outgoing,
    Incoming,
}

/// Shipment state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShipmentState {
    Draft,
    Waiting,
    Assigned,
    Picked,
    Packed,
    Shipped,
    Received,
    Done,
    Cancelled,
}

impl ShipmentState {
    pub fn as_str(self) -> &'static str {
        match self {
            ShipmentState::Draft => "draft",
            ShipmentState::Waiting => "waiting",
            ShipmentState::Assigned => "assigned",
            ShipmentState::Picked => "picked",
            ShipmentState::Packed => "packed",
            ShipmentState::Shipped => "shipped",
            ShipmentState::Received => "received",
            ShipmentState::Done => "done",
            ShipmentState::Cancelled => "cancelled",
        }
    }
}

/// Shipment document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shipment {
    pub id: ShipmentId,
    pub kind: ShipmentKind,
    pub number: String,
    pub state: ShipmentState,
    pub inventory_moves: Vec<MoveId>,
    pub outgoing_moves: Vec<MoveId>,
    pub incoming_moves: Vec<MoveId>,
}

impl Shipment {
    pub fn new(kind: ShipmentKind, number: impl Into<String>) -> Self {
        Self {
            id: ShipmentId::generate(),
            kind,
            number: number.into(),
            state: ShipmentState::Draft,
            inventory_moves: Vec::new(),
            outgoing_moves: Vec::new(),
            incoming_moves: Vec::new(),
        }
    }

    pub fn with_state(mut self, state: ShipmentState) -> Self {
        self.state = state;
        self
    }

    pub fn moves(&self, collection: MoveCollection) -> &[MoveId] {
        match collection {
            MoveCollection::Inventory => &self.inventory_moves,
            MoveCollection::Outgoing => &self.outgoing_moves,
            MoveCollection::Incoming => &self.incoming_moves,
        }
    }

    pub fn moves_mut(&mut self, collection: MoveCollection) -> &mut Vec<MoveId> {
        match collection {
            MoveCollection::Inventory => &mut self.inventory_moves,
            MoveCollection::Outgoing => &mut self.outgoing_moves,
            MoveCollection::Incoming => &mut self.incoming_moves,
        }
    }

    /// Every move of the shipment, across collections.
    pub fn all_moves(&self) -> impl Iterator<Item = MoveId> + '_ {
        self.inventory_moves
            .iter()
            .chain(&self.outgoing_moves)
            .chain(&self.incoming_moves)
            .copied()
    }

    /// Put a waiting shipment back to draft.
    pub fn reset_to_draft(&mut self) -> DomainResult<()> {
        match self.state {
            ShipmentState::Draft => Ok(()),
            ShipmentState::Waiting => {
                self.state = ShipmentState::Draft;
                Ok(())
            }
            other => Err(DomainError::invariant(format!(
                "shipment \"{}\" is {} and cannot be reset to draft",
                self.number,
                other.as_str()
            ))),
        }
    }

    /// Cancel a draft shipment. Cancelling a cancelled shipment is a no-op.
    pub fn cancel(&mut self) -> DomainResult<()> {
        match self.state {
            ShipmentState::Cancelled => Ok(()),
            ShipmentState::Draft => {
                self.state = ShipmentState::Cancelled;
                Ok(())
            }
            other => Err(DomainError::invariant(format!(
                "shipment \"{}\" is {} and cannot be cancelled",
                self.number,
                other.as_str()
            ))),
        }
    }
}

impl Entity for Shipment {
    type Id = ShipmentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn rec_name(&self) -> String {
        self.number.clone()
    }
}
