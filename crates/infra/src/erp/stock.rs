//! Shipments and stock moves.

use forgeerp_core::{DomainError, DomainResult};
use forgeerp_revoke::StockService;
use forgeerp_stock::{
    Move, MoveCollection, MoveId, MoveState, Shipment, ShipmentId, ShipmentState,
};

use super::{ErpState, InMemoryErp};

impl ErpState {
    /// Store `shipment` with its moves, linking each move to it.
    pub(super) fn insert_shipment(
        &mut self,
        mut shipment: Shipment,
        moves: Vec<(MoveCollection, Move)>,
    ) -> ShipmentId {
        let id = shipment.id;
        for (collection, mut mv) in moves {
            mv.shipment = Some(id);
            shipment.moves_mut(collection).push(mv.id);
            self.moves.insert(mv.id, mv);
        }
        self.shipments.insert(id, shipment);
        id
    }

    fn cancel_shipment(&mut self, id: ShipmentId) -> DomainResult<()> {
        let shipment = self.shipment_mut(id)?;
        if shipment.state == ShipmentState::Cancelled {
            return Ok(());
        }
        shipment.cancel()?;
        let moves: Vec<_> = shipment.all_moves().collect();
        for move_id in moves {
            let mv = self.stock_move_mut(move_id)?;
            if mv.state != MoveState::Done {
                mv.cancel()?;
            }
        }
        Ok(())
    }
}

impl StockService for InMemoryErp {
    fn shipment(&self, id: ShipmentId) -> DomainResult<Shipment> {
        self.read().shipment(id).cloned()
    }

    fn stock_move(&self, id: MoveId) -> DomainResult<Move> {
        self.read().stock_move(id).cloned()
    }

    fn draft_shipments(&self, ids: &[ShipmentId]) -> DomainResult<()> {
        let mut state = self.write();
        for id in ids {
            state.shipment_mut(*id)?.reset_to_draft()?;
        }
        Ok(())
    }

    fn cancel_shipments(&self, ids: &[ShipmentId]) -> DomainResult<()> {
        let mut state = self.write();
        for id in ids {
            state.cancel_shipment(*id)?;
            state.refresh_sales_shipping(*id)?;
        }
        Ok(())
    }

    fn cancel_moves(&self, ids: &[MoveId]) -> DomainResult<()> {
        let mut state = self.write();
        for id in ids {
            let mv = state.stock_move_mut(*id)?;
            if mv.state != MoveState::Draft && mv.state != MoveState::Cancelled {
                return Err(DomainError::invariant(format!(
                    "move {id} is {} and cannot be cancelled",
                    mv.state.as_str()
                )));
            }
            mv.cancel()?;
        }
        state.refresh_sales_with_moves(ids)
    }
}

/// Warehouse operations used to drive shipments forward.
impl InMemoryErp {
    /// Reserve stock for a draft or waiting shipment.
    pub fn assign_shipment(&self, id: ShipmentId) -> DomainResult<()> {
        let mut state = self.write();
        let shipment = state.shipment_mut(id)?;
        if !matches!(shipment.state, ShipmentState::Draft | ShipmentState::Waiting) {
            return Err(DomainError::invariant(format!(
                "shipment \"{}\" is {} and cannot be assigned",
                shipment.number,
                shipment.state.as_str()
            )));
        }
        shipment.state = ShipmentState::Assigned;
        let moves: Vec<_> = shipment.all_moves().collect();
        for move_id in moves {
            let mv = state.stock_move_mut(move_id)?;
            if mv.state == MoveState::Draft {
                mv.state = MoveState::Assigned;
            }
        }
        Ok(())
    }

    /// Ship a waiting or assigned customer shipment.
    ///
    /// Outgoing moves listed in `shipped` only ship the given quantity; the
    /// remainder is put on a new waiting shipment. Unlisted moves ship in
    /// full. Returns the backorder shipment, if any.
    pub fn complete_shipment(
        &self,
        id: ShipmentId,
        shipped: &[(MoveId, f64)],
    ) -> DomainResult<Option<ShipmentId>> {
        let mut state = self.write();
        let shipment = state.shipment(id)?.clone();
        if !matches!(shipment.state, ShipmentState::Waiting | ShipmentState::Assigned) {
            return Err(DomainError::invariant(format!(
                "shipment \"{}\" is {} and cannot be shipped",
                shipment.number,
                shipment.state.as_str()
            )));
        }

        let mut backorder = Vec::new();
        for move_id in shipment.outgoing_moves.iter().chain(&shipment.incoming_moves) {
            let requested = shipped.iter().find(|(m, _)| m == move_id).map(|(_, q)| *q);
            let mv = state.stock_move_mut(*move_id)?;
            if let Some(quantity) = requested {
                if quantity < 0.0 || quantity > mv.quantity {
                    return Err(DomainError::validation(format!(
                        "cannot ship {quantity} of move {move_id}"
                    )));
                }
                let remainder = mv.quantity - quantity;
                if remainder > 0.0 {
                    let mut rest = mv.recreated();
                    rest.quantity = remainder;
                    backorder.push(rest);
                }
                mv.quantity = quantity;
            }
            mv.state = MoveState::Done;
        }
        for move_id in &shipment.inventory_moves {
            state.stock_move_mut(*move_id)?.state = MoveState::Done;
        }
        state.shipment_mut(id)?.state = ShipmentState::Done;

        if backorder.is_empty() {
            state.refresh_sales_shipping(id)?;
            return Ok(None);
        }

        let number = state.next_number("OUT-");
        let mut moves = Vec::new();
        for rest in backorder {
            let inventory = Move {
                id: MoveId::generate(),
                origin: None,
                ..rest.clone()
            };
            moves.push((MoveCollection::Inventory, inventory));
            moves.push((MoveCollection::Outgoing, rest));
        }
        let origins: Vec<_> = moves
            .iter()
            .filter_map(|(c, mv)| (*c == MoveCollection::Outgoing).then_some(mv.clone()))
            .collect();
        let new_id = state.insert_shipment(
            Shipment::new(shipment.kind, number).with_state(ShipmentState::Waiting),
            moves,
        );
        for mv in origins {
            state.attach_line_move(&mv)?;
        }
        for sale in state.sales.values_mut() {
            if sale.shipments.contains(&id) {
                sale.shipments.push(new_id);
            }
        }
        state.refresh_sales_shipping(id)?;
        Ok(Some(new_id))
    }
}
