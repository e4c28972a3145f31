/// Order Validator - Request Validation
///
/// Checks requests before they reach the book. The book itself accepts any
/// scalar input; these are the adapter-level rules for what a client may
/// submit.
///
/// ## Validation Rules
/// - Quantity must be positive and within `[min_quantity, max_quantity]`
/// - Limit price must not exceed `max_price` (price 0 is a market order)
/// - Amended quantity must not exceed `max_quantity`
///
/// ## Usage
/// ```rust
/// use orderbook_engine::domain::validation::OrderValidator;
/// use orderbook_engine::shared::protocol::{AddOrderRequest, Side};
///
/// let validator = OrderValidator::new();
/// let request = AddOrderRequest { order_id: 1, side: Side::Bid, price: 100, quantity: 5 };
/// assert!(validator.validate_add(&request).is_ok());
/// ```

use crate::shared::protocol::{AddOrderRequest, AmendOrderRequest, Price, Quantity};

/// Validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("price out of range: {0}")]
    PriceOutOfRange(String),

    #[error("quantity out of range: {0}")]
    QuantityOutOfRange(String),
}

/// Order validation configuration
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    /// Maximum limit price (inclusive)
    pub max_price: Price,

    /// Minimum quantity (inclusive)
    pub min_quantity: Quantity,

    /// Maximum quantity (inclusive)
    pub max_quantity: Quantity,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_price: u64::MAX,
            min_quantity: 1,
            max_quantity: 1_000_000,
        }
    }
}

/// Order validator
#[derive(Debug, Clone, Default)]
pub struct OrderValidator {
    config: ValidationConfig,
}

impl OrderValidator {
    /// Creates a new validator with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new validator with custom configuration
    pub fn with_config(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validates a new order request
    pub fn validate_add(&self, request: &AddOrderRequest) -> Result<(), ValidationError> {
        self.validate_price(request.price)?;
        self.validate_quantity(request.quantity)?;
        Ok(())
    }

    /// Validates an amend request. Shrinking below the filled quantity is a
    /// book rule and is left to the book.
    pub fn validate_amend(&self, request: &AmendOrderRequest) -> Result<(), ValidationError> {
        if request.quantity > self.config.max_quantity {
            return Err(ValidationError::QuantityOutOfRange(format!(
                "Quantity {} exceeds maximum {}",
                request.quantity, self.config.max_quantity
            )));
        }
        Ok(())
    }

    fn validate_price(&self, price: Price) -> Result<(), ValidationError> {
        if price > self.config.max_price {
            return Err(ValidationError::PriceOutOfRange(format!(
                "Price {} exceeds maximum {}",
                price, self.config.max_price
            )));
        }
        Ok(())
    }

    fn validate_quantity(&self, quantity: Quantity) -> Result<(), ValidationError> {
        if quantity == 0 {
            return Err(ValidationError::InvalidQuantity(
                "Quantity must be greater than zero".to_string(),
            ));
        }

        if quantity < self.config.min_quantity {
            return Err(ValidationError::QuantityOutOfRange(format!(
                "Quantity {} is below minimum {}",
                quantity, self.config.min_quantity
            )));
        }

        if quantity > self.config.max_quantity {
            return Err(ValidationError::QuantityOutOfRange(format!(
                "Quantity {} exceeds maximum {}",
                quantity, self.config.max_quantity
            )));
        }

        Ok(())
    }
}
