/// PriceLevel - FIFO queue of orders resting at one price
///
/// Orders live in a slot arena owned by the level and are chained into a
/// doubly linked list (oldest at the head). A slot handle stays valid until
/// its order leaves the level, after which the slot goes onto the free list
/// and is reused by the next insert.
///
/// - `push_back`: O(1), always last priority at this price
/// - `remove(slot)`: O(1) from anywhere in the queue
/// - `fill`: consumes from the head, strict time priority

use super::order::Order;
use crate::shared::protocol::{OrderId, Price, Quantity};
use smallvec::SmallVec;

/// Stable handle to an order's slot inside its level.
pub type SlotId = usize;

#[derive(Clone, Debug)]
struct OrderNode {
    order: Order,
    prev: Option<SlotId>,
    next: Option<SlotId>,
}

#[derive(Clone, Debug)]
enum Slot {
    Occupied(OrderNode),
    // 空闲链表中的下一个空槽
    Vacant { next_free: Option<SlotId> },
}

/// Outcome of matching an aggressor against one level.
#[derive(Debug, Default)]
pub struct LevelFill {
    /// Quantity traded at this level.
    pub matched: Quantity,
    /// Resting orders that were completely filled and left the level.
    pub completed: SmallVec<[OrderId; 8]>,
}

#[derive(Clone, Debug)]
pub struct PriceLevel {
    price: Price,
    total_qty: Quantity,
    slots: Vec<Slot>,
    head: Option<SlotId>,
    tail: Option<SlotId>,
    free_head: Option<SlotId>,
    len: usize,
}

impl PriceLevel {
    pub fn new(price: Price) -> Self {
        Self {
            price,
            total_qty: 0,
            slots: Vec::new(),
            head: None,
            tail: None,
            free_head: None,
            len: 0,
        }
    }

    pub fn price(&self) -> Price {
        self.price
    }

    /// Sum of remaining quantity over every order in the queue.
    pub fn total_qty(&self) -> Quantity {
        self.total_qty
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Oldest (highest priority) order.
    pub fn front(&self) -> Option<&Order> {
        self.head.and_then(|slot| self.get(slot))
    }

    pub fn get(&self, slot: SlotId) -> Option<&Order> {
        match self.slots.get(slot) {
            Some(Slot::Occupied(node)) => Some(&node.order),
            _ => None,
        }
    }

    fn get_mut(&mut self, slot: SlotId) -> Option<&mut Order> {
        match self.slots.get_mut(slot) {
            Some(Slot::Occupied(node)) => Some(&mut node.order),
            _ => None,
        }
    }

    fn node(&self, slot: SlotId) -> Option<&OrderNode> {
        match self.slots.get(slot) {
            Some(Slot::Occupied(node)) => Some(node),
            _ => None,
        }
    }

    fn node_mut(&mut self, slot: SlotId) -> Option<&mut OrderNode> {
        match self.slots.get_mut(slot) {
            Some(Slot::Occupied(node)) => Some(node),
            _ => None,
        }
    }

    /// Orders in time priority, oldest first.
    pub fn iter(&self) -> LevelIter<'_> {
        LevelIter {
            level: self,
            cursor: self.head,
        }
    }

    /// Appends `order` at the back of the queue and adds its remaining
    /// quantity to the level total. Returns the order's slot handle.
    pub fn push_back(&mut self, order: Order) -> SlotId {
        self.total_qty += order.remaining_qty();

        let node = OrderNode {
            order,
            prev: self.tail,
            next: None,
        };

        // 优先复用空闲槽位
        let slot = match self.free_head {
            Some(free) => {
                if let Slot::Vacant { next_free } = self.slots[free] {
                    self.free_head = next_free;
                }
                self.slots[free] = Slot::Occupied(node);
                free
            }
            None => {
                self.slots.push(Slot::Occupied(node));
                self.slots.len() - 1
            }
        };

        match self.tail {
            Some(tail) => {
                if let Some(tail_node) = self.node_mut(tail) {
                    tail_node.next = Some(slot);
                }
            }
            None => self.head = Some(slot),
        }
        self.tail = Some(slot);
        self.len += 1;

        slot
    }

    /// Unlinks the order in `slot` and frees the slot. The level total is
    /// reduced by the order's remaining quantity. Returns `None` for a
    /// vacant or out-of-range slot.
    pub fn remove(&mut self, slot: SlotId) -> Option<Order> {
        let (prev, next) = {
            let node = self.node(slot)?;
            (node.prev, node.next)
        };

        match prev {
            Some(p) => {
                if let Some(prev_node) = self.node_mut(p) {
                    prev_node.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(n) => {
                if let Some(next_node) = self.node_mut(n) {
                    next_node.prev = prev;
                }
            }
            None => self.tail = prev,
        }

        let vacated = std::mem::replace(
            &mut self.slots[slot],
            Slot::Vacant {
                next_free: self.free_head,
            },
        );
        self.free_head = Some(slot);
        self.len -= 1;

        match vacated {
            Slot::Occupied(node) => {
                self.total_qty -= node.order.remaining_qty();
                Some(node.order)
            }
            Slot::Vacant { .. } => None,
        }
    }

    /// Changes the quantity of the order in `slot` without moving it in the
    /// queue. Caller guarantees `new_qty >= filled_qty` and that the new
    /// total fits in a `Quantity`. Returns the old quantity.
    pub(crate) fn set_order_qty(&mut self, slot: SlotId, new_qty: Quantity) -> Option<Quantity> {
        let order = self.get_mut(slot)?;
        let old_qty = order.qty();
        order.set_qty(new_qty);

        if new_qty >= old_qty {
            self.total_qty += new_qty - old_qty;
        } else {
            self.total_qty -= old_qty - new_qty;
        }
        Some(old_qty)
    }

    /// Matches `aggressor` against the queue, oldest order first, at this
    /// level's price. Caller has already checked the level crosses.
    ///
    /// Stops once the aggressor is filled or the level runs dry.
    pub fn fill(&mut self, aggressor: &mut Order) -> LevelFill {
        let price = self.price;
        let mut result = LevelFill::default();

        while let Some(head) = self.head {
            let Some(resting) = self.get_mut(head) else {
                panic!("price level {price}: head slot {head} is vacant");
            };

            let qty = aggressor.remaining_qty().min(resting.remaining_qty());
            resting.fill(price, qty);
            let resting_filled = resting.is_filled();
            let resting_id = resting.id();

            aggressor.fill(price, qty);
            self.total_qty -= qty;
            result.matched += qty;

            if resting_filled {
                self.remove(head);
                result.completed.push(resting_id);
            }

            if aggressor.is_filled() {
                break;
            }
        }

        result
    }
}

/// FIFO iterator over a level's orders.
pub struct LevelIter<'a> {
    level: &'a PriceLevel,
    cursor: Option<SlotId>,
}

impl<'a> Iterator for LevelIter<'a> {
    type Item = (SlotId, &'a Order);

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.cursor?;
        let node = self.level.node(slot)?;
        self.cursor = node.next;
        Some((slot, &node.order))
    }
}
