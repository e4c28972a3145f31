//! Randomized operation sequences checked against the book's structural
//! invariants after every step.

use orderbook_engine::domain::orderbook::{BookSide, Orderbook};
use orderbook_engine::domain::OrderbookError;
use orderbook_engine::shared::protocol::{OrderId, Quantity, Side};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Position of `id` inside its price level's queue.
fn queue_position(book: &Orderbook, id: OrderId) -> Option<usize> {
    let location = book.location(id)?;
    book.side(location.side)
        .level(location.price)?
        .iter()
        .position(|(_, order)| order.id() == id)
}

fn check_side(book: &Orderbook, side: &BookSide) -> usize {
    let mut depth: Quantity = 0;
    let mut orders = 0;
    let mut previous_price = None;

    for level in side.levels() {
        assert!(!level.is_empty(), "empty level {} left in the index", level.price());

        if let Some(previous) = previous_price {
            match side.side() {
                Side::Bid => assert!(level.price() < previous, "bids not best-first"),
                Side::Ask => assert!(level.price() > previous, "asks not best-first"),
            }
        }
        previous_price = Some(level.price());

        let mut level_qty = 0;
        let mut last_id = None;
        for (slot, order) in level.iter() {
            assert!(order.filled_qty() <= order.qty(), "order {} overfilled", order.id());
            assert_eq!(order.price(), level.price());
            assert_eq!(order.side(), side.side());

            // ids are issued in increasing order, so FIFO means increasing ids
            if let Some(last) = last_id {
                assert!(order.id() > last, "queue out of arrival order at {}", level.price());
            }
            last_id = Some(order.id());

            let location = book.location(order.id()).expect("resting order missing from index");
            assert_eq!(location.side, side.side());
            assert_eq!(location.price, level.price());
            assert_eq!(location.slot, slot);

            level_qty += order.remaining_qty();
            orders += 1;
        }
        assert_eq!(level.total_qty(), level_qty, "level {} total out of sync", level.price());
        depth += level_qty;
    }

    assert_eq!(side.depth(), depth, "{:?} depth out of sync", side.side());
    assert_eq!(side.best_price(), side.levels().next().map_or(0, |l| l.price()));
    orders
}

fn check_book(book: &Orderbook) {
    let resting = check_side(book, book.bids()) + check_side(book, book.asks());
    assert_eq!(book.len(), resting, "id index holds orders that are not resting");
}

fn run_random_sequence(seed: u64, steps: usize) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut book = Orderbook::new("RAND", "USD");
    let mut next_id: OrderId = 0;

    for _ in 0..steps {
        let roll = rng.gen_range(0..100);

        if roll < 55 || next_id == 0 {
            next_id += 1;
            let side = if rng.gen::<bool>() { Side::Bid } else { Side::Ask };
            let market = rng.gen_range(0..100) < 10;
            let price = if market { 0 } else { rng.gen_range(990..=1010) };
            let qty = rng.gen_range(1..=30);

            let opposite_depth = book.side(side.opposite()).depth();
            let before = book.snapshot(usize::MAX);

            match book.add_order(next_id, side, price, qty) {
                Ok(order) => {
                    assert!(order.filled_qty() <= order.qty());
                    if market {
                        assert!(order.is_filled(), "market order left unfilled");
                        assert!(book.order(next_id).is_none());
                    } else {
                        assert_eq!(order.is_resting(), !order.is_filled());
                        assert_eq!(book.order(next_id).is_some(), !order.is_filled());
                    }
                    if order.filled_qty() > 0 {
                        assert_eq!(
                            book.side(side.opposite()).depth(),
                            opposite_depth - order.filled_qty()
                        );
                    }
                }
                Err(OrderbookError::NotEnoughLiquidity { requested, available }) => {
                    assert!(market);
                    assert_eq!(requested, qty);
                    assert_eq!(available, opposite_depth);
                    assert!(qty > opposite_depth);
                    assert_eq!(book.snapshot(usize::MAX), before, "failed market order changed the book");
                }
                Err(e) => panic!("unexpected add error {e}"),
            }
        } else if roll < 80 {
            let id = rng.gen_range(1..=next_id);
            let position = queue_position(&book, id);
            let new_qty = rng.gen_range(1..=40);

            match book.amend_order(id, new_qty) {
                Ok(()) => {
                    assert_eq!(book.order(id).map(|o| o.qty()), Some(new_qty));
                    assert_eq!(queue_position(&book, id), position, "amend moved order {id}");
                }
                Err(OrderbookError::OrderNotFound(missing)) => {
                    assert_eq!(missing, id);
                    assert!(position.is_none());
                }
                Err(OrderbookError::AmendTooLow { filled, requested, .. }) => {
                    assert!(requested < filled);
                    assert_eq!(queue_position(&book, id), position);
                }
                Err(e) => panic!("unexpected amend error {e}"),
            }
        } else {
            let id = rng.gen_range(1..=next_id);
            let was_resting = book.order(id).is_some();
            match book.cancel_order(id) {
                Ok(()) => assert!(was_resting),
                Err(OrderbookError::OrderNotFound(_)) => assert!(!was_resting),
                Err(e) => panic!("unexpected cancel error {e}"),
            }
            assert!(book.order(id).is_none());
        }

        check_book(&book);
    }
}

#[test]
fn invariants_hold_over_random_sequences() {
    for seed in 0..20 {
        run_random_sequence(seed, 2_000);
    }
}

#[test]
fn earlier_order_is_filled_before_later_one_gets_anything() {
    let mut rng = StdRng::seed_from_u64(99);

    for _ in 0..200 {
        let mut book = Orderbook::new("FIFO", "USD");
        let first = rng.gen_range(1..=50);
        let second = rng.gen_range(1..=50);
        book.add_order(1, Side::Ask, 700, first).unwrap();
        book.add_order(2, Side::Ask, 700, second).unwrap();

        let take = rng.gen_range(1..=first + second);
        book.add_order(3, Side::Bid, 0, take).unwrap();

        let second_filled = book.order(2).map_or(second, |o| o.filled_qty());
        if take <= first {
            assert_eq!(second_filled, 0);
        } else {
            assert!(book.order(1).is_none());
            assert_eq!(second_filled, take - first);
        }
    }
}
