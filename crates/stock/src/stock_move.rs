use serde::{Deserialize, Serialize};

use forgeerp_core::{AggregateId, DomainError, DomainResult, Entity, Resolution, record_id};
use forgeerp_products::{ProductId, UomId};

use crate::shipment::ShipmentId;

record_id!(
    /// Stock move identifier.
    MoveId
);

/// Stock move state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveState {
    Staging,
    Draft,
    Assigned,
    Done,
    Cancelled,
}

impl MoveState {
    pub fn as_str(self) -> &'static str {
        match self {
            MoveState::Staging => "staging",
            MoveState::Draft => "draft",
            MoveState::Assigned => "assigned",
            MoveState::Done => "done",
            MoveState::Cancelled => "cancelled",
        }
    }

    /// States a move may be in while its order is revoked.
    pub fn allows_revoke(self) -> bool {
        matches!(self, MoveState::Cancelled | MoveState::Draft | MoveState::Done)
    }
}

/// Stock move: the atomic unit of physical quantity movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Move {
    pub id: MoveId,
    pub product: ProductId,
    /// Product name, used for display.
    pub description: String,
    pub quantity: f64,
    pub uom: UomId,
    pub state: MoveState,
    /// Order line the move fulfills, if any.
    pub origin: Option<AggregateId>,
    pub shipment: Option<ShipmentId>,
    pub resolution: Resolution,
}

impl Move {
    pub fn new(
        product: ProductId,
        description: impl Into<String>,
        quantity: f64,
        uom: UomId,
    ) -> Self {
        Self {
            id: MoveId::generate(),
            product,
            description: description.into(),
            quantity,
            uom,
            state: MoveState::Draft,
            origin: None,
            shipment: None,
            resolution: Resolution::Unclassified,
        }
    }

    pub fn with_origin(mut self, line: AggregateId) -> Self {
        self.origin = Some(line);
        self
    }

    pub fn with_state(mut self, state: MoveState) -> Self {
        self.state = state;
        self
    }

    /// Cancelled and not yet reconciled against its order.
    pub fn is_pending_exception(&self) -> bool {
        self.state == MoveState::Cancelled && !self.resolution.is_classified()
    }

    /// Cancel the move. Cancelling a cancelled move is a no-op.
    pub fn cancel(&mut self) -> DomainResult<()> {
        match self.state {
            MoveState::Cancelled => Ok(()),
            MoveState::Staging | MoveState::Draft | MoveState::Assigned => {
                self.state = MoveState::Cancelled;
                Ok(())
            }
            MoveState::Done => Err(DomainError::invariant(format!(
                "cannot cancel done move \"{}\"",
                self.rec_name()
            ))),
        }
    }

    /// Record how the cancelled move was reconciled.
    pub fn resolve(&mut self, recreate: bool) -> DomainResult<()> {
        if self.state != MoveState::Cancelled {
            return Err(DomainError::invariant(format!(
                "move \"{}\" is {} and cannot be reconciled",
                self.rec_name(),
                self.state.as_str()
            )));
        }
        self.resolution = self.resolution.classify(recreate).ok_or_else(|| {
            DomainError::conflict(format!("move \"{}\" is already reconciled", self.rec_name()))
        })?;
        Ok(())
    }

    /// Draft copy of the move carrying the same quantity, used to recreate it.
    pub fn recreated(&self) -> Self {
        Self {
            id: MoveId::generate(),
            state: MoveState::Draft,
            shipment: None,
            resolution: Resolution::Unclassified,
            ..self.clone()
        }
    }
}

impl Entity for Move {
    type Id = MoveId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn rec_name(&self) -> String {
        format!("{} {}", self.quantity, self.description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_move() -> Move {
        Move::new(ProductId::generate(), "Widget", 10.0, UomId::generate())
    }

    #[test]
    fn draft_move_cancels() {
        let mut mv = test_move();
        mv.cancel().unwrap();
        assert_eq!(mv.state, MoveState::Cancelled);
        assert!(mv.is_pending_exception());
        mv.cancel().unwrap();
        assert_eq!(mv.state, MoveState::Cancelled);
    }

    #[test]
    fn done_move_cannot_be_cancelled() {
        let mut mv = test_move().with_state(MoveState::Done);
        let err = mv.cancel().unwrap_err();
        assert_eq!(err, DomainError::invariant("cannot cancel done move \"10 Widget\""));
        assert_eq!(mv.state, MoveState::Done);
    }

    #[test]
    fn only_cancelled_moves_are_reconciled() {
        let mut mv = test_move();
        assert!(mv.resolve(false).is_err());

        mv.cancel().unwrap();
        mv.resolve(false).unwrap();
        assert_eq!(mv.resolution, Resolution::Ignored);
        assert!(!mv.is_pending_exception());
    }

    #[test]
    fn reconciliation_is_final() {
        let mut mv = test_move().with_state(MoveState::Cancelled);
        mv.resolve(true).unwrap();
        let err = mv.resolve(false).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(mv.resolution, Resolution::Recreated);
    }

    #[test]
    fn recreated_copy_is_a_fresh_draft() {
        let line = AggregateId::new();
        let mv = test_move().with_origin(line).with_state(MoveState::Cancelled);
        let copy = mv.recreated();
        assert_ne!(copy.id, mv.id);
        assert_eq!(copy.state, MoveState::Draft);
        assert_eq!(copy.origin, Some(line));
        assert_eq!(copy.quantity, mv.quantity);
    }

    #[test]
    fn revoke_allows_only_settled_or_unstarted_moves() {
        assert!(MoveState::Draft.allows_revoke());
        assert!(MoveState::Done.allows_revoke());
        assert!(MoveState::Cancelled.allows_revoke());
        assert!(!MoveState::Assigned.allows_revoke());
        assert!(!MoveState::Staging.allows_revoke());
    }
}
