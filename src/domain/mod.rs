/// Domain Layer - Core Business Logic
///
/// The matching engine itself: orders, price levels, book sides and the
/// order book facade, plus order validation rules. No I/O and no threading;
/// callers own the book and serialize access to it.
///
/// ## Modules
/// - `orderbook`: Order book implementation
/// - `errors`: Caller-facing book errors
/// - `validation`: Request validation applied before the book is touched

pub mod orderbook;
pub mod errors;
pub mod validation;

// Re-export key types
pub use errors::OrderbookError;
pub use orderbook::{MatchingBook, Order, Orderbook};
