/// BookSide - one side of the book
///
/// Price levels are kept in a `BTreeMap` keyed by price. Priority order is
/// direction dependent: bids iterate from the highest key, asks from the
/// lowest. `best_price` is cached and only recomputed when the best level
/// is deleted; `depth` is the total resting quantity on the side.

use super::order::Order;
use super::price_level::{PriceLevel, SlotId};
use crate::domain::errors::OrderbookError;
use crate::shared::protocol::{OrderId, Price, Quantity, Side};
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// Where a resting order lives: side, level price key and slot handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrderLocation {
    pub side: Side,
    pub price: Price,
    pub slot: SlotId,
}

/// Result of running an incoming order against the opposite side.
#[derive(Debug, Default)]
pub struct Execution {
    /// Price of the last level traded against, 0 if nothing matched.
    pub last_fill_price: Price,
    /// Total quantity the incoming order traded.
    pub matched: Quantity,
    /// Resting orders on the opposite side that were completely filled.
    pub completed: SmallVec<[OrderId; 8]>,
}

#[derive(Clone, Debug)]
pub struct BookSide {
    side: Side,
    levels: BTreeMap<Price, PriceLevel>,
    best_price: Price,
    depth: Quantity,
}

impl BookSide {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            levels: BTreeMap::new(),
            best_price: 0,
            depth: 0,
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Cached best price, 0 when the side is empty.
    pub fn best_price(&self) -> Price {
        self.best_price
    }

    pub fn depth(&self) -> Quantity {
        self.depth
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn level(&self, price: Price) -> Option<&PriceLevel> {
        self.levels.get(&price)
    }

    /// Levels from best to worst price.
    pub fn levels(&self) -> Box<dyn Iterator<Item = &PriceLevel> + '_> {
        match self.side {
            Side::Bid => Box::new(self.levels.values().rev()),
            Side::Ask => Box::new(self.levels.values()),
        }
    }

    pub fn order(&self, location: &OrderLocation) -> Option<&Order> {
        self.levels.get(&location.price)?.get(location.slot)
    }

    /// Price of the first level in priority order, 0 if none.
    fn first_price(&self) -> Price {
        let first = match self.side {
            Side::Bid => self.levels.keys().next_back(),
            Side::Ask => self.levels.keys().next(),
        };
        first.copied().unwrap_or(0)
    }

    /// Fails if adding `qty` more resting quantity would overflow `depth`.
    /// A level's total never exceeds its side's depth, so this also covers
    /// the level totals.
    fn check_capacity(&self, order_id: OrderId, qty: Quantity) -> Result<(), OrderbookError> {
        match self.depth.checked_add(qty) {
            Some(_) => Ok(()),
            None => Err(OrderbookError::QuantityOverflow(order_id)),
        }
    }

    /// Crossing test for an incoming order priced `order_price` against a
    /// level of this side priced `level_price`. A price of 0 is a market
    /// order and crosses anything.
    #[inline]
    pub fn can_match(&self, order_price: Price, level_price: Price) -> bool {
        if order_price == 0 {
            return true;
        }

        match self.side {
            // incoming ask: bid level must be at or above the ask
            Side::Bid => level_price != 0 && order_price <= level_price,
            // incoming bid: ask level must be at or below the bid
            Side::Ask => order_price >= level_price,
        }
    }

    /// Runs `order` (which belongs to this side) against `opposite`, then
    /// rests any remainder of a limit order here.
    ///
    /// A market order that `opposite` cannot fill completely is rejected
    /// before anything is touched, as is a limit order whose full quantity
    /// could not rest here without overflowing this side's depth.
    ///
    /// # Panics
    /// If a market order still has quantity left after matching. The
    /// liquidity guard makes that state unreachable.
    pub fn execute_order<F>(
        &mut self,
        order: &mut Order,
        opposite: &mut BookSide,
        on_rest: F,
    ) -> Result<Execution, OrderbookError>
    where
        F: FnOnce(OrderId, OrderLocation),
    {
        debug_assert_eq!(order.side(), self.side);

        // 市价单必须能够全部成交
        if order.is_market() && opposite.depth < order.qty() {
            return Err(OrderbookError::NotEnoughLiquidity {
                requested: order.qty(),
                available: opposite.depth,
            });
        }
        if !order.is_market() {
            self.check_capacity(order.id(), order.remaining_qty())?;
        }

        let mut execution = Execution::default();
        let mut update_best_price = false;

        while !order.is_filled() {
            if opposite.levels.is_empty() {
                break;
            }
            let level_price = opposite.first_price();
            if !opposite.can_match(order.price(), level_price) {
                break;
            }

            let Some(level) = opposite.levels.get_mut(&level_price) else {
                break;
            };

            let fill = level.fill(order);
            let level_emptied = level.is_empty();

            opposite.depth -= fill.matched;
            execution.matched += fill.matched;
            if fill.matched > 0 {
                execution.last_fill_price = level_price;
            }
            execution.completed.extend(fill.completed);

            if level_emptied {
                if opposite.best_price == level_price {
                    update_best_price = true;
                }
                opposite.levels.remove(&level_price);
            } else {
                // level still has liquidity, so the order must be filled
                break;
            }
        }

        if update_best_price {
            opposite.best_price = opposite.first_price();
        }

        if !order.is_filled() {
            if order.is_market() {
                panic!(
                    "market order {} left with {} unfilled after passing the liquidity guard",
                    order.id(),
                    order.remaining_qty()
                );
            }
            self.add_to_book(order, on_rest)?;
        }

        Ok(execution)
    }

    /// Rests `order` at the back of its price level. `order` is updated to
    /// point at the level and a copy is stored in the level; `on_rest`
    /// receives the new location.
    ///
    /// # Errors
    /// `QuantityOverflow` if the side's depth cannot hold the order; nothing
    /// is changed.
    pub fn add_to_book<F>(&mut self, order: &mut Order, on_rest: F) -> Result<(), OrderbookError>
    where
        F: FnOnce(OrderId, OrderLocation),
    {
        self.check_capacity(order.id(), order.remaining_qty())?;

        let price = order.price();
        self.depth += order.remaining_qty();

        order.set_level(Some(price));
        let slot = self
            .levels
            .entry(price)
            .or_insert_with(|| PriceLevel::new(price))
            .push_back(order.clone());

        on_rest(
            order.id(),
            OrderLocation {
                side: self.side,
                price,
                slot,
            },
        );

        match self.side {
            Side::Bid => {
                if price > self.best_price {
                    self.best_price = price;
                }
            }
            Side::Ask => {
                if self.best_price == 0 || price < self.best_price {
                    self.best_price = price;
                }
            }
        }
        Ok(())
    }

    /// Removes the order at `location` and returns it.
    ///
    /// # Panics
    /// If nothing rests at `location`. Locations come from the book's id
    /// index, so that means the index is out of sync.
    pub fn cancel_order(&mut self, location: &OrderLocation) -> Order {
        let side = self.side;
        let level = self.level_at(location);
        let Some(mut order) = level.remove(location.slot) else {
            panic!("no order in slot {} at {:?} {}", location.slot, side, location.price);
        };
        let level_emptied = level.is_empty();

        self.depth -= order.remaining_qty();

        if level_emptied {
            self.levels.remove(&location.price);
            if self.best_price == location.price {
                self.best_price = self.first_price();
            }
        }

        order.set_level(None);
        order
    }

    /// Changes the quantity of the order at `location` in place, keeping its
    /// time priority.
    ///
    /// # Errors
    /// - `AmendTooLow` if `new_qty` is below the filled quantity.
    /// - `QuantityOverflow` if the increase would overflow the side's depth.
    ///
    /// Nothing is changed on error.
    ///
    /// # Panics
    /// If nothing rests at `location`, same as [`BookSide::cancel_order`].
    pub fn amend_order_qty(
        &mut self,
        location: &OrderLocation,
        new_qty: Quantity,
    ) -> Result<(), OrderbookError> {
        let (side, depth) = (self.side, self.depth);
        let level = self.level_at(location);
        let Some(order) = level.get(location.slot) else {
            panic!("no order in slot {} at {:?} {}", location.slot, side, location.price);
        };
        let (order_id, old_qty, filled) = (order.id(), order.qty(), order.filled_qty());

        if new_qty < filled {
            return Err(OrderbookError::AmendTooLow {
                order_id,
                requested: new_qty,
                filled,
            });
        }
        let new_depth = if new_qty >= old_qty {
            depth
                .checked_add(new_qty - old_qty)
                .ok_or(OrderbookError::QuantityOverflow(order_id))?
        } else {
            depth - (old_qty - new_qty)
        };

        level.set_order_qty(location.slot, new_qty);
        self.depth = new_depth;
        Ok(())
    }

    fn level_at(&mut self, location: &OrderLocation) -> &mut PriceLevel {
        match self.levels.get_mut(&location.price) {
            Some(level) => level,
            None => panic!("no {:?} level at {}", self.side, location.price),
        }
    }
}
