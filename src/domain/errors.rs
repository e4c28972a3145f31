/// Order book errors
///
/// Every variant is an expected, recoverable condition reported back to the
/// caller. Broken internal invariants are not represented here: they panic.

use crate::shared::protocol::{ErrorCode, OrderId, Quantity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum OrderbookError {
    /// Market order larger than the opposite side's resting depth.
    /// The book is left untouched.
    #[error("not enough liquidity: market order for {requested} against depth {available}")]
    NotEnoughLiquidity {
        requested: Quantity,
        available: Quantity,
    },

    #[error("order {0} not found")]
    OrderNotFound(OrderId),

    /// New quantity would be below what has already traded.
    #[error("cannot amend order {order_id} to {requested}: {filled} already filled")]
    AmendTooLow {
        order_id: OrderId,
        requested: Quantity,
        filled: Quantity,
    },

    /// The id is still resting in the book.
    #[error("order {0} is already resting in the book")]
    DuplicateOrderId(OrderId),

    /// Resting the quantity would overflow the side's total depth.
    /// The book is left untouched.
    #[error("order {0}: quantity would overflow the resting depth")]
    QuantityOverflow(OrderId),
}

impl OrderbookError {
    /// Wire code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            OrderbookError::NotEnoughLiquidity { .. } => ErrorCode::NotEnoughLiquidity,
            OrderbookError::OrderNotFound(_) => ErrorCode::OrderNotFound,
            OrderbookError::AmendTooLow { .. } => ErrorCode::AmendTooLow,
            OrderbookError::DuplicateOrderId(_) => ErrorCode::DuplicateOrderId,
            OrderbookError::QuantityOverflow(_) => ErrorCode::InvalidOrder,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = OrderbookError::NotEnoughLiquidity { requested: 200, available: 199 };
        assert_eq!(
            err.to_string(),
            "not enough liquidity: market order for 200 against depth 199"
        );
        assert_eq!(OrderbookError::OrderNotFound(7).to_string(), "order 7 not found");
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(OrderbookError::OrderNotFound(1).code(), ErrorCode::OrderNotFound);
        assert_eq!(
            OrderbookError::AmendTooLow { order_id: 1, requested: 1, filled: 2 }.code(),
            ErrorCode::AmendTooLow
        );
        assert_ne!(
            OrderbookError::OrderNotFound(1).code(),
            OrderbookError::AmendTooLow { order_id: 1, requested: 1, filled: 2 }.code()
        );
        assert_eq!(OrderbookError::QuantityOverflow(1).code(), ErrorCode::InvalidOrder);
    }
}
