/// Order - one participant's resting or incoming intent
///
/// Pure bookkeeping: tracks how much of the order has traded and at what
/// notional. `fill` trusts its caller to never exceed the remaining quantity.

use crate::shared::protocol::{OrderId, OrderReport, Price, Quantity, Side};
use crate::shared::timestamp::coarse_nanos;

#[derive(Clone, Debug, PartialEq)]
pub struct Order {
    id: OrderId,
    side: Side,
    price: Price,
    qty: Quantity,
    filled_qty: Quantity,
    // 累计成交金额（price * qty 之和），用 u128 防止溢出
    filled_notional: u128,
    timestamp: u64,
    // 所在价格档位（挂单时为 Some，未挂单时为 None）
    level: Option<Price>,
}

impl Order {
    pub fn new(id: OrderId, side: Side, price: Price, qty: Quantity) -> Self {
        Self {
            id,
            side,
            price,
            qty,
            filled_qty: 0,
            filled_notional: 0,
            timestamp: coarse_nanos(),
            level: None,
        }
    }

    /// Records a fill of `qty` at `price`. Caller guarantees
    /// `qty <= self.remaining_qty()`.
    #[inline]
    pub fn fill(&mut self, price: Price, qty: Quantity) {
        debug_assert!(qty <= self.remaining_qty(), "overfill on order {}", self.id);
        self.filled_notional += qty as u128 * price as u128;
        self.filled_qty += qty;
    }

    #[inline]
    pub fn remaining_qty(&self) -> Quantity {
        self.qty - self.filled_qty
    }

    #[inline]
    pub fn is_filled(&self) -> bool {
        self.remaining_qty() == 0
    }

    /// 0.0 until something fills.
    pub fn average_fill_price(&self) -> f64 {
        if self.filled_qty == 0 {
            return 0.0;
        }
        self.filled_notional as f64 / self.filled_qty as f64
    }

    #[inline]
    pub fn is_market(&self) -> bool {
        self.price == 0
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn price(&self) -> Price {
        self.price
    }

    pub fn qty(&self) -> Quantity {
        self.qty
    }

    pub fn filled_qty(&self) -> Quantity {
        self.filled_qty
    }

    pub fn filled_notional(&self) -> u128 {
        self.filled_notional
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Price key of the level this order rests in, `None` when not resting.
    pub fn level(&self) -> Option<Price> {
        self.level
    }

    pub fn is_resting(&self) -> bool {
        self.level.is_some()
    }

    pub(crate) fn set_level(&mut self, level: Option<Price>) {
        self.level = level;
    }

    pub(crate) fn set_qty(&mut self, qty: Quantity) {
        self.qty = qty;
    }

    pub fn to_report(&self) -> OrderReport {
        OrderReport {
            order_id: self.id,
            side: self.side,
            price: self.price,
            quantity: self.qty,
            filled_quantity: self.filled_qty,
            remaining_quantity: self.remaining_qty(),
            average_fill_price: self.average_fill_price(),
            resting: self.is_resting(),
        }
    }
}
