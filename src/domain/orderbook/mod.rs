/// Domain Layer - OrderBook Module
///
/// Single-instrument limit order book with price-time priority.
///
/// ## Structure (leaf first)
/// - `order`: fill bookkeeping for one order
/// - `price_level`: FIFO queue of resting orders at one price (slot arena +
///   intrusive linked list, O(1) removal anywhere)
/// - `side`: price-indexed levels for one side, cached best price and depth
/// - `book`: `Orderbook` facade with the id index (add / cancel / amend)
///
/// ## Trait Abstraction
/// `MatchingBook` is the interface the application layer drives a book
/// through.

pub mod order;
pub mod price_level;
pub mod side;
pub mod book;
pub mod traits;

pub use book::{Instrument, Orderbook};
pub use order::Order;
pub use price_level::{LevelFill, PriceLevel, SlotId};
pub use side::{BookSide, Execution, OrderLocation};
pub use traits::MatchingBook;
