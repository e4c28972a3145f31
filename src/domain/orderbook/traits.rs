/// MatchingBook Trait - Domain Layer Abstraction
///
/// The interface the application layer drives a book through. It lets the
/// book service be generic over the book implementation (monomorphized, no
/// vtable) and lets tests substitute a mock.
///
/// ## Example
/// ```rust
/// use orderbook_engine::domain::orderbook::{MatchingBook, Orderbook};
/// use orderbook_engine::shared::protocol::Side;
///
/// fn quote<B: MatchingBook>(book: &mut B) {
///     book.add_order(1, Side::Bid, 99, 10).unwrap();
///     book.add_order(2, Side::Ask, 101, 10).unwrap();
///     assert_eq!(book.spread(), Some(2));
/// }
///
/// quote(&mut Orderbook::new("BTC", "USD"));
/// ```

use super::book::Orderbook;
use super::order::Order;
use crate::domain::errors::OrderbookError;
use crate::shared::protocol::{BookSnapshot, OrderId, Price, Quantity, Side};

pub trait MatchingBook {
    /// Trading symbol, used for metric labels and snapshots.
    fn symbol(&self) -> &str;

    /// Matches and/or rests a new order; price 0 is a market order.
    fn add_order(
        &mut self,
        id: OrderId,
        side: Side,
        price: Price,
        qty: Quantity,
    ) -> Result<Order, OrderbookError>;

    fn cancel_order(&mut self, id: OrderId) -> Result<(), OrderbookError>;

    fn amend_order(&mut self, id: OrderId, new_qty: Quantity) -> Result<(), OrderbookError>;

    /// Top `levels` levels per side.
    fn snapshot(&self, levels: usize) -> BookSnapshot;

    fn best_bid(&self) -> Option<Price>;

    fn best_ask(&self) -> Option<Price>;

    /// Resting quantity on `side`.
    fn depth(&self, side: Side) -> Quantity;

    /// Price of the most recent trade, 0 before the first one.
    fn last_fill_price(&self) -> Price;

    /// Number of orders resting on both sides.
    fn resting_orders(&self) -> usize;

    /// best_ask - best_bid, `None` if either side is empty or the book is
    /// locked/crossed.
    fn spread(&self) -> Option<Price> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) if ask > bid => Some(ask - bid),
            _ => None,
        }
    }

    fn mid_price(&self) -> Option<Price> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(bid / 2 + ask / 2 + (bid % 2 + ask % 2) / 2),
            _ => None,
        }
    }
}

impl MatchingBook for Orderbook {
    fn symbol(&self) -> &str {
        Orderbook::symbol(self)
    }

    fn add_order(
        &mut self,
        id: OrderId,
        side: Side,
        price: Price,
        qty: Quantity,
    ) -> Result<Order, OrderbookError> {
        Orderbook::add_order(self, id, side, price, qty)
    }

    fn cancel_order(&mut self, id: OrderId) -> Result<(), OrderbookError> {
        Orderbook::cancel_order(self, id)
    }

    fn amend_order(&mut self, id: OrderId, new_qty: Quantity) -> Result<(), OrderbookError> {
        Orderbook::amend_order(self, id, new_qty)
    }

    fn snapshot(&self, levels: usize) -> BookSnapshot {
        Orderbook::snapshot(self, levels)
    }

    fn best_bid(&self) -> Option<Price> {
        Orderbook::best_bid(self)
    }

    fn best_ask(&self) -> Option<Price> {
        Orderbook::best_ask(self)
    }

    fn depth(&self, side: Side) -> Quantity {
        self.side(side).depth()
    }

    fn last_fill_price(&self) -> Price {
        Orderbook::last_fill_price(self)
    }

    fn resting_orders(&self) -> usize {
        self.len()
    }
}
