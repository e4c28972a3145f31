/// Shared utilities and types used across all layers
///
/// This module contains:
/// - Protocol definitions (scalar aliases, requests, replies, wire messages)
/// - Timestamps for order time priority
/// - Prometheus metrics

pub mod protocol;
pub mod timestamp;
pub mod metrics;

// Re-export commonly used types
pub use protocol::{
    ClientMessage, ServerMessage, ErrorCode,
    OrderId, Price, Quantity, Side,
};

pub use timestamp::coarse_nanos;
