//! Follow-up orders for quantities that were never delivered.
//!
//! The ignored moves of an order are summed per product, in the unit the
//! order kind uses for that product, and a draft copy of the order is
//! created with one line per product carrying exactly that quantity.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info};

use forgeerp_core::{DomainResult, Resolution};
use forgeerp_products::{ProductId, UomConverter, UomId};
use forgeerp_stock::Move;

use crate::error::RevokeResult;
use crate::order::{OrderLineView, RevocableOrder};
use crate::ports::{LineOverrides, Platform, StockService};

/// Ignored moves of every line of `order`, in line order.
pub fn ignored_moves<O, S>(stock: &S, order: &O) -> DomainResult<Vec<Move>>
where
    O: RevocableOrder,
    S: StockService + ?Sized,
{
    let mut ignored = Vec::new();
    for id in order.line_moves() {
        let mv = stock.stock_move(id)?;
        if mv.resolution == Resolution::Ignored {
            ignored.push(mv);
        }
    }
    Ok(ignored)
}

/// Quantity per product, converted without rounding to the unit returned by
/// `unit_of`.
pub fn aggregate_ignored<C>(
    moves: &[Move],
    converter: &C,
    mut unit_of: impl FnMut(ProductId) -> DomainResult<UomId>,
) -> DomainResult<HashMap<ProductId, (f64, UomId)>>
where
    C: UomConverter + ?Sized,
{
    let mut totals: HashMap<ProductId, (f64, UomId)> = HashMap::new();
    for mv in moves {
        let unit = match totals.get(&mv.product) {
            Some((_, unit)) => *unit,
            None => unit_of(mv.product)?,
        };
        let quantity = if mv.uom != unit {
            converter.compute_qty(mv.uom, mv.quantity, unit, false)?
        } else {
            mv.quantity
        };
        totals.entry(mv.product).or_insert((0.0, unit)).0 += quantity;
    }
    Ok(totals)
}

/// Creates the follow-up orders.
pub struct PendingMovesCreator<'p, P> {
    platform: &'p P,
}

impl<'p, P> PendingMovesCreator<'p, P> {
    pub fn new(platform: &'p P) -> Self {
        Self { platform }
    }

    /// Create one draft order per input order with ignored moves not yet
    /// carried into a follow-up order. Returns the new orders.
    pub fn create_pending_moves<O>(&self, ids: &[O::Id]) -> RevokeResult<Vec<O::Id>>
    where
        O: RevocableOrder,
        P: Platform<O>,
    {
        let mut created = Vec::new();
        for id in ids {
            if let Some(new_id) = self.platform.atomically(|| self.create_one::<O>(*id))? {
                created.push(new_id);
            }
        }
        Ok(created)
    }

    fn create_one<O>(&self, id: O::Id) -> RevokeResult<Option<O::Id>>
    where
        O: RevocableOrder,
        P: Platform<O>,
    {
        let order: O = self.platform.load(id)?;
        let carried: HashSet<_> = order.followed_up_moves().iter().copied().collect();
        let moves: Vec<Move> = ignored_moves(self.platform, &order)?
            .into_iter()
            .filter(|mv| !carried.contains(&mv.id))
            .collect();
        if moves.is_empty() {
            debug!(order = %id, "no ignored moves left to follow up");
            return Ok(None);
        }

        let mut totals = aggregate_ignored(&moves, self.platform, |product| {
            Ok(O::order_uom(&self.platform.product(product)?))
        })?;

        let new_id = self.platform.copy_order(id)?;
        let mut lines = 0usize;
        for line in order.lines() {
            if !line.line_type().is_orderable() {
                continue;
            }
            let Some(product) = line.product() else {
                continue;
            };
            // The whole product quantity goes on its first line.
            let Some((quantity, unit)) = totals.remove(&product) else {
                continue;
            };
            if quantity <= 0.0 {
                continue;
            }
            self.platform
                .copy_line(line, new_id, LineOverrides { quantity, unit })?;
            lines += 1;
        }

        let move_ids: Vec<_> = moves.iter().map(|mv| mv.id).collect();
        self.platform.record_follow_up(id, &move_ids)?;

        info!(order = %id, new_order = %new_id, lines, "pending moves order created");
        Ok(Some(new_id))
    }
}
