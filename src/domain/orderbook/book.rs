/// Orderbook - single-instrument book facade
///
/// Owns both sides and the order id index. The index maps every resting
/// order to its `OrderLocation` and is kept in step with the sides on every
/// insert, fill-to-empty and cancel.
///
/// ## Concurrency contract
/// `Orderbook` has no internal locking. All mutations for one instrument
/// must be serialized by the owner: run it inside a single worker
/// (`BookService`) or behind an external lock (`SharedBook`).

use super::order::Order;
use super::side::{BookSide, OrderLocation};
use crate::domain::errors::OrderbookError;
use crate::shared::protocol::{BookSnapshot, LevelSnapshot, OrderId, Price, Quantity, Side};
use std::collections::HashMap;

/// Base/quote currency pair the book trades.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instrument {
    pub base: String,
    pub quote: String,
}

impl Instrument {
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            quote: quote.into(),
        }
    }

    /// `BASE-QUOTE`, e.g. `BTC-USD`.
    pub fn symbol(&self) -> String {
        format!("{}-{}", self.base, self.quote)
    }
}

#[derive(Clone, Debug)]
pub struct Orderbook {
    instrument: Instrument,
    symbol: String,
    bids: BookSide,
    asks: BookSide,
    orders_by_id: HashMap<OrderId, OrderLocation>,
    last_fill_price: Price,
}

impl Orderbook {
    /// Empty book for `base`/`quote`.
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Self {
        let instrument = Instrument::new(base, quote);
        Self {
            symbol: instrument.symbol(),
            instrument,
            bids: BookSide::new(Side::Bid),
            asks: BookSide::new(Side::Ask),
            orders_by_id: HashMap::with_capacity(10_000),
            last_fill_price: 0,
        }
    }

    /// Submits a new order. A `price` of 0 is a market order.
    ///
    /// The order matches against the opposite side first; whatever is left
    /// of a limit order rests on its own side. The returned order carries
    /// the final fill state (`filled_qty`, `average_fill_price`, and whether
    /// it is now resting).
    ///
    /// # Errors
    /// - `NotEnoughLiquidity` for a market order larger than the opposite
    ///   depth; nothing is changed.
    /// - `DuplicateOrderId` if `id` is still resting; nothing is changed.
    /// - `QuantityOverflow` for a limit order whose quantity would overflow
    ///   its side's resting depth; nothing is changed.
    pub fn add_order(
        &mut self,
        id: OrderId,
        side: Side,
        price: Price,
        qty: Quantity,
    ) -> Result<Order, OrderbookError> {
        if self.orders_by_id.contains_key(&id) {
            return Err(OrderbookError::DuplicateOrderId(id));
        }

        let mut order = Order::new(id, side, price, qty);

        let orders_by_id = &mut self.orders_by_id;
        let register = |id: OrderId, location: OrderLocation| {
            orders_by_id.insert(id, location);
        };

        let execution = match side {
            Side::Bid => self.bids.execute_order(&mut order, &mut self.asks, register)?,
            Side::Ask => self.asks.execute_order(&mut order, &mut self.bids, register)?,
        };

        // 完全成交的对手订单不再挂单
        for filled in &execution.completed {
            self.orders_by_id.remove(filled);
        }

        if execution.last_fill_price != 0 {
            self.last_fill_price = execution.last_fill_price;
        }

        Ok(order)
    }

    /// Removes a resting order.
    ///
    /// # Errors
    /// `OrderNotFound` if `id` is not resting.
    pub fn cancel_order(&mut self, id: OrderId) -> Result<(), OrderbookError> {
        let location = self
            .orders_by_id
            .remove(&id)
            .ok_or(OrderbookError::OrderNotFound(id))?;

        self.side_mut(location.side).cancel_order(&location);
        Ok(())
    }

    /// Changes a resting order's quantity in place. Time priority is kept,
    /// including when the quantity grows.
    ///
    /// # Errors
    /// - `OrderNotFound` if `id` is not resting.
    /// - `AmendTooLow` if `new_qty` is below the order's filled quantity.
    /// - `QuantityOverflow` if the increase would overflow the side's depth.
    pub fn amend_order(&mut self, id: OrderId, new_qty: Quantity) -> Result<(), OrderbookError> {
        let location = *self
            .orders_by_id
            .get(&id)
            .ok_or(OrderbookError::OrderNotFound(id))?;

        self.side_mut(location.side).amend_order_qty(&location, new_qty)
    }

    fn side_mut(&mut self, side: Side) -> &mut BookSide {
        match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        }
    }

    pub fn side(&self, side: Side) -> &BookSide {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }

    pub fn bids(&self) -> &BookSide {
        &self.bids
    }

    pub fn asks(&self) -> &BookSide {
        &self.asks
    }

    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Price of the most recent trade, 0 before the first one.
    pub fn last_fill_price(&self) -> Price {
        self.last_fill_price
    }

    pub fn best_bid(&self) -> Option<Price> {
        Some(self.bids.best_price()).filter(|&p| p != 0)
    }

    pub fn best_ask(&self) -> Option<Price> {
        Some(self.asks.best_price()).filter(|&p| p != 0)
    }

    /// A resting order by id.
    pub fn order(&self, id: OrderId) -> Option<&Order> {
        let location = self.orders_by_id.get(&id)?;
        self.side(location.side).order(location)
    }

    pub fn location(&self, id: OrderId) -> Option<OrderLocation> {
        self.orders_by_id.get(&id).copied()
    }

    /// Number of resting orders.
    pub fn len(&self) -> usize {
        self.orders_by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders_by_id.is_empty()
    }

    /// Top `levels` price levels of each side, best first.
    pub fn snapshot(&self, levels: usize) -> BookSnapshot {
        let aggregate = |side: &BookSide| -> Vec<LevelSnapshot> {
            side.levels()
                .take(levels)
                .map(|level| LevelSnapshot {
                    price: level.price(),
                    quantity: level.total_qty(),
                    orders: level.len() as u32,
                })
                .collect()
        };

        BookSnapshot {
            symbol: self.symbol.clone(),
            best_bid: self.bids.best_price(),
            best_ask: self.asks.best_price(),
            bid_depth: self.bids.depth(),
            ask_depth: self.asks.depth(),
            last_fill_price: self.last_fill_price,
            bids: aggregate(&self.bids),
            asks: aggregate(&self.asks),
        }
    }
}
