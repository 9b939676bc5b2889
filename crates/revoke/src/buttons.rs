//! Visibility rules of the order buttons.

use forgeerp_core::OrderState;

/// The revoke button is offered on confirmed and processing orders.
pub fn revoke_visible(state: OrderState) -> bool {
    matches!(state, OrderState::Confirmed | OrderState::Processing)
}

/// The pending-moves button is offered on processing and done orders that
/// have ignored moves.
pub fn create_pending_moves_visible(state: OrderState, has_ignored_moves: bool) -> bool {
    has_ignored_moves && matches!(state, OrderState::Processing | OrderState::Done)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revoke_button() {
        assert!(revoke_visible(OrderState::Confirmed));
        assert!(revoke_visible(OrderState::Processing));
        assert!(!revoke_visible(OrderState::Quotation));
        assert!(!revoke_visible(OrderState::Done));
    }

    #[test]
    fn pending_moves_button_needs_ignored_moves() {
        assert!(create_pending_moves_visible(OrderState::Done, true));
        assert!(!create_pending_moves_visible(OrderState::Done, false));
        assert!(!create_pending_moves_visible(OrderState::Confirmed, true));
    }
}
