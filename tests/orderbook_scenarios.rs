use orderbook_engine::domain::orderbook::Orderbook;
use orderbook_engine::domain::OrderbookError;
use orderbook_engine::shared::protocol::Side;

fn book() -> Orderbook {
    Orderbook::new("BTC", "USD")
}

#[test]
fn bid_rest_then_partial_cross() {
    let mut book = book();

    book.add_order(1, Side::Bid, 1000, 100).unwrap();
    assert_eq!(book.bids().best_price(), 1000);
    assert_eq!(book.bids().depth(), 100);

    book.add_order(2, Side::Bid, 1100, 100).unwrap();
    assert_eq!(book.bids().best_price(), 1100);
    assert_eq!(book.bids().depth(), 200);

    let ask = book.add_order(3, Side::Ask, 800, 120).unwrap();
    assert!(ask.is_filled());
    assert_eq!(ask.filled_qty(), 120);
    assert_eq!(ask.average_fill_price(), 1083.3333333333333);
    assert!(!ask.is_resting());

    assert_eq!(book.bids().best_price(), 1000);
    assert_eq!(book.bids().depth(), 80);
    assert_eq!(book.asks().best_price(), 0);
    assert_eq!(book.asks().depth(), 0);
    assert_eq!(book.last_fill_price(), 1000);

    // order 2 traded out completely and left the id index
    assert!(book.order(2).is_none());
    assert_eq!(book.order(1).unwrap().filled_qty(), 20);
}

#[test]
fn cancel_clears_level() {
    let mut book = book();

    book.add_order(5, Side::Bid, 1000, 100).unwrap();
    assert_eq!(book.bids().best_price(), 1000);
    assert_eq!(book.bids().depth(), 100);

    book.cancel_order(5).unwrap();
    assert_eq!(book.bids().best_price(), 0);
    assert_eq!(book.bids().depth(), 0);
    assert_eq!(book.bids().level_count(), 0);
    assert_eq!(book.cancel_order(5), Err(OrderbookError::OrderNotFound(5)));
}

#[test]
fn amend_too_low_is_rejected_without_side_effects() {
    let mut book = book();

    book.add_order(1, Side::Bid, 1000, 100).unwrap();
    book.add_order(2, Side::Ask, 1000, 30).unwrap();
    assert_eq!(book.order(1).unwrap().filled_qty(), 30);

    let before = book.snapshot(usize::MAX);
    let err = book.amend_order(1, 29).unwrap_err();
    assert_eq!(
        err,
        OrderbookError::AmendTooLow { order_id: 1, requested: 29, filled: 30 }
    );
    assert_eq!(book.snapshot(usize::MAX), before);
    assert_eq!(book.order(1).unwrap().qty(), 100);

    // amending to exactly the filled quantity is allowed
    book.amend_order(1, 30).unwrap();
    assert_eq!(book.bids().depth(), 0);
}

#[test]
fn market_order_wipeout() {
    let mut book = book();

    book.add_order(1, Side::Bid, 1000, 120).unwrap();
    book.add_order(2, Side::Bid, 990, 80).unwrap();

    let ask = book.add_order(3, Side::Ask, 0, 200).unwrap();
    assert!(ask.is_filled());
    assert_eq!(ask.filled_qty(), 200);

    for side in [book.bids(), book.asks()] {
        assert_eq!(side.best_price(), 0);
        assert_eq!(side.depth(), 0);
        assert!(side.is_empty());
    }
    assert!(book.is_empty());
}

#[test]
fn market_order_without_liquidity_leaves_book_untouched() {
    let mut book = book();

    book.add_order(1, Side::Ask, 1000, 50).unwrap();
    book.add_order(2, Side::Ask, 1010, 50).unwrap();
    let before = book.snapshot(usize::MAX);

    let err = book.add_order(3, Side::Bid, 0, 101).unwrap_err();
    assert_eq!(
        err,
        OrderbookError::NotEnoughLiquidity { requested: 101, available: 100 }
    );
    assert_eq!(book.snapshot(usize::MAX), before);
    assert!(book.order(3).is_none());

    // a market order against an empty side is rejected the same way
    let err = book.add_order(4, Side::Ask, 0, 1).unwrap_err();
    assert_eq!(err, OrderbookError::NotEnoughLiquidity { requested: 1, available: 0 });
}

#[test]
fn limit_order_sweeps_levels_and_rests_remainder() {
    let mut book = book();

    book.add_order(1, Side::Ask, 101, 10).unwrap();
    book.add_order(2, Side::Ask, 102, 10).unwrap();
    book.add_order(3, Side::Ask, 104, 10).unwrap();

    let bid = book.add_order(4, Side::Bid, 103, 25).unwrap();
    assert_eq!(bid.filled_qty(), 20);
    assert_eq!(bid.remaining_qty(), 5);
    assert!(bid.is_resting());
    assert_eq!(bid.average_fill_price(), 101.5);

    assert_eq!(book.bids().best_price(), 103);
    assert_eq!(book.bids().depth(), 5);
    assert_eq!(book.asks().best_price(), 104);
    assert_eq!(book.asks().depth(), 10);
    assert_eq!(book.order(4).unwrap().remaining_qty(), 5);
}

#[test]
fn non_crossing_orders_both_rest() {
    let mut book = book();

    book.add_order(1, Side::Bid, 99, 10).unwrap();
    let ask = book.add_order(2, Side::Ask, 100, 10).unwrap();
    assert_eq!(ask.filled_qty(), 0);
    assert_eq!(book.best_bid(), Some(99));
    assert_eq!(book.best_ask(), Some(100));
    assert_eq!(book.len(), 2);
}

#[test]
fn same_price_orders_fill_in_arrival_order() {
    let mut book = book();

    book.add_order(10, Side::Ask, 500, 5).unwrap();
    book.add_order(11, Side::Ask, 500, 5).unwrap();
    book.add_order(12, Side::Ask, 500, 5).unwrap();

    book.add_order(20, Side::Bid, 500, 7).unwrap();
    assert!(book.order(10).is_none());
    assert_eq!(book.order(11).unwrap().filled_qty(), 2);
    assert_eq!(book.order(12).unwrap().filled_qty(), 0);

    // growing the middle order keeps it ahead of order 12
    book.amend_order(11, 50).unwrap();
    book.add_order(21, Side::Bid, 500, 48).unwrap();
    assert!(book.order(11).is_none());
    assert_eq!(book.order(12).unwrap().filled_qty(), 0);
}

#[test]
fn cancel_best_level_recomputes_best_price() {
    let mut book = book();

    book.add_order(1, Side::Ask, 105, 1).unwrap();
    book.add_order(2, Side::Ask, 103, 1).unwrap();
    book.add_order(3, Side::Ask, 104, 1).unwrap();
    assert_eq!(book.asks().best_price(), 103);

    book.cancel_order(2).unwrap();
    assert_eq!(book.asks().best_price(), 104);
    book.cancel_order(1).unwrap();
    assert_eq!(book.asks().best_price(), 104);
    book.cancel_order(3).unwrap();
    assert_eq!(book.asks().best_price(), 0);
}

#[test]
fn resting_id_cannot_be_reused_until_it_leaves_the_book() {
    let mut book = book();

    book.add_order(1, Side::Bid, 100, 5).unwrap();
    assert_eq!(
        book.add_order(1, Side::Ask, 200, 5).unwrap_err(),
        OrderbookError::DuplicateOrderId(1)
    );

    book.add_order(2, Side::Ask, 100, 5).unwrap();
    assert!(book.order(1).is_none());
    book.add_order(1, Side::Ask, 200, 5).unwrap();
    assert_eq!(book.best_ask(), Some(200));
}

#[test]
fn snapshot_lists_levels_best_first() {
    let mut book = book();

    book.add_order(1, Side::Bid, 98, 1).unwrap();
    book.add_order(2, Side::Bid, 99, 2).unwrap();
    book.add_order(3, Side::Bid, 99, 3).unwrap();
    book.add_order(4, Side::Ask, 102, 4).unwrap();
    book.add_order(5, Side::Ask, 101, 5).unwrap();

    let snapshot = book.snapshot(1);
    assert_eq!(snapshot.symbol, "BTC-USD");
    assert_eq!(snapshot.bids.len(), 1);
    assert_eq!(snapshot.bids[0].price, 99);
    assert_eq!(snapshot.bids[0].quantity, 5);
    assert_eq!(snapshot.bids[0].orders, 2);
    assert_eq!(snapshot.asks[0].price, 101);
    assert_eq!(snapshot.bid_depth, 6);
    assert_eq!(snapshot.ask_depth, 9);

    let full = book.snapshot(10);
    let bid_prices: Vec<_> = full.bids.iter().map(|l| l.price).collect();
    let ask_prices: Vec<_> = full.asks.iter().map(|l| l.price).collect();
    assert_eq!(bid_prices, vec![99, 98]);
    assert_eq!(ask_prices, vec![101, 102]);
}

#[test]
fn oversized_quantities_are_rejected_without_side_effects() {
    let mut book = book();

    book.add_order(1, Side::Bid, 100, u64::MAX).unwrap();
    let before = book.snapshot(usize::MAX);
    assert_eq!(
        book.add_order(2, Side::Bid, 101, 1).unwrap_err(),
        OrderbookError::QuantityOverflow(2)
    );
    assert_eq!(book.snapshot(usize::MAX), before);
    assert!(book.order(2).is_none());

    // the other side is unaffected
    book.add_order(3, Side::Ask, 200, 10).unwrap();
    book.add_order(4, Side::Ask, 200, 10).unwrap();
    let before = book.snapshot(usize::MAX);
    assert_eq!(
        book.amend_order(3, u64::MAX).unwrap_err(),
        OrderbookError::QuantityOverflow(3)
    );
    assert_eq!(book.snapshot(usize::MAX), before);
    assert_eq!(book.order(3).unwrap().qty(), 10);
}

#[test]
fn sweeping_an_amended_out_level_is_not_a_trade() {
    let mut book = book();

    book.add_order(1, Side::Ask, 1000, 10).unwrap();
    book.add_order(2, Side::Bid, 1000, 4).unwrap();
    book.add_order(3, Side::Ask, 990, 1).unwrap();
    book.add_order(4, Side::Bid, 990, 1).unwrap();
    assert_eq!(book.last_fill_price(), 990);

    // order 1 keeps its slot at 1000 with nothing left to trade
    book.amend_order(1, 4).unwrap();
    assert_eq!(book.asks().depth(), 0);
    assert_eq!(book.best_ask(), Some(1000));

    let bid = book.add_order(5, Side::Bid, 1000, 3).unwrap();
    assert_eq!(bid.filled_qty(), 0);
    assert!(bid.is_resting());

    assert_eq!(book.last_fill_price(), 990);
    assert!(book.order(1).is_none());
    assert!(book.asks().is_empty());
    assert_eq!(book.best_ask(), None);
    assert_eq!(book.best_bid(), Some(1000));
    assert_eq!(book.snapshot(1).last_fill_price, 990);
}
