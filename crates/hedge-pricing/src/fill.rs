//! Order book fill simulation.
//!
//! Walks one price-sorted side of a book, consuming volume level by level
//! until the target is met. The walk is a fold over the levels; the state
//! carried between levels is the remaining volume, accumulated cost, filled
//! volume and the last level price touched.

use std::ops::ControlFlow;

use hedge_core::{OrderBookLevel, OrderSide, Price, Size, VenueSnapshot};
use rust_decimal::Decimal;
use tracing::warn;

/// Cost reported for a fill that cannot be completed.
///
/// Larger than any feasible cost, so infeasible quotes sort last.
pub const INFEASIBLE_COST: Decimal = Decimal::MAX;

/// Outcome of simulating a fill against one book side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillResult {
    /// Total cost (sum of price × consumed volume), or [`INFEASIBLE_COST`].
    pub cost: Decimal,
    /// Price of the last level touched. `None` if no level was touched.
    pub limit_price: Option<Price>,
    /// Volume consumed.
    pub filled: Size,
    /// Volume requested.
    pub target: Size,
    /// Whether `filled >= target`.
    pub feasible: bool,
}

impl FillResult {
    /// Volume the book could not supply.
    pub fn shortfall(&self) -> Size {
        self.target.saturating_sub(self.filled)
    }
}

#[derive(Debug, Clone, Copy)]
struct Walk {
    remaining: Size,
    cost: Decimal,
    filled: Size,
    last_price: Option<Price>,
}

/// Consume one level. Breaks once the target is met or on overflow.
fn consume_level(walk: Walk, level: &OrderBookLevel) -> ControlFlow<Option<Walk>, Walk> {
    if walk.remaining.is_zero() {
        return ControlFlow::Break(Some(walk));
    }
    if level.size.is_zero() {
        return ControlFlow::Continue(walk);
    }

    let take = walk.remaining.min(level.size);
    let Some(cost) = take
        .inner()
        .checked_mul(level.price.inner())
        .and_then(|notional| walk.cost.checked_add(notional))
    else {
        return ControlFlow::Break(None);
    };

    let next = Walk {
        remaining: walk.remaining - take,
        cost,
        filled: walk.filled + take,
        last_price: Some(level.price),
    };
    if next.remaining.is_zero() {
        ControlFlow::Break(Some(next))
    } else {
        ControlFlow::Continue(next)
    }
}

/// Simulate filling `target` against `levels`, best level first.
///
/// Deterministic and side-effect free. If the levels run out before the
/// target is met, the result is infeasible and carries [`INFEASIBLE_COST`].
pub fn simulate_fill(levels: &[OrderBookLevel], target: Size) -> FillResult {
    let start = Walk {
        remaining: target,
        cost: Decimal::ZERO,
        filled: Size::ZERO,
        last_price: None,
    };

    let walk = match levels.iter().try_fold(start, consume_level) {
        ControlFlow::Continue(walk) | ControlFlow::Break(Some(walk)) => walk,
        ControlFlow::Break(None) => {
            return FillResult {
                cost: INFEASIBLE_COST,
                limit_price: None,
                filled: Size::ZERO,
                target,
                feasible: false,
            }
        }
    };

    let feasible = walk.filled >= target;
    FillResult {
        cost: if feasible { walk.cost } else { INFEASIBLE_COST },
        limit_price: walk.last_price,
        filled: walk.filled,
        target,
        feasible,
    }
}

/// Simulate a fill on the side of `snapshot` consumed by `side`.
///
/// Logs the shortfall when the book cannot cover `target`.
pub fn simulate_snapshot_fill(snapshot: &VenueSnapshot, side: OrderSide, target: Size) -> FillResult {
    let fill = simulate_fill(snapshot.levels_for(side), target);
    if !fill.feasible {
        warn!(
            venue = %snapshot.venue,
            symbol = %snapshot.symbol,
            %target,
            filled = %fill.filled,
            shortfall = %fill.shortfall(),
            "Insufficient liquidity for target volume"
        );
    }
    fill
}
