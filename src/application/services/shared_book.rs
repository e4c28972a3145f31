/// Shared Book - Lock-guarded Orderbook
///
/// For callers that want to drive a book from several threads directly
/// instead of going through the book service. Every operation takes the
/// lock for its whole duration, so operations never interleave.

use crate::domain::errors::OrderbookError;
use crate::domain::orderbook::{Order, Orderbook};
use crate::shared::protocol::{BookSnapshot, OrderId, Price, Quantity, Side};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct SharedBook {
    inner: Arc<Mutex<Orderbook>>,
}

impl SharedBook {
    pub fn new(book: Orderbook) -> Self {
        Self {
            inner: Arc::new(Mutex::new(book)),
        }
    }

    pub fn add_order(
        &self,
        id: OrderId,
        side: Side,
        price: Price,
        qty: Quantity,
    ) -> Result<Order, OrderbookError> {
        self.inner.lock().add_order(id, side, price, qty)
    }

    pub fn cancel_order(&self, id: OrderId) -> Result<(), OrderbookError> {
        self.inner.lock().cancel_order(id)
    }

    pub fn amend_order(&self, id: OrderId, new_qty: Quantity) -> Result<(), OrderbookError> {
        self.inner.lock().amend_order(id, new_qty)
    }

    pub fn snapshot(&self, levels: usize) -> BookSnapshot {
        self.inner.lock().snapshot(levels)
    }

    pub fn best_bid(&self) -> Option<Price> {
        self.inner.lock().best_bid()
    }

    pub fn best_ask(&self) -> Option<Price> {
        self.inner.lock().best_ask()
    }

    /// Runs `f` with the book locked.
    pub fn with_book<R>(&self, f: impl FnOnce(&Orderbook) -> R) -> R {
        f(&self.inner.lock())
    }
}
