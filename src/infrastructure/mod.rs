/// Infrastructure Layer - Technical Implementations
///
/// Everything that touches the outside world: the TCP order server and its
/// wire codec, plus the HTTP observability endpoints.
///
/// The infrastructure layer depends on the application and domain layers;
/// neither depends back on it.
///
/// ## Modules
/// - `network`: length-delimited TCP protocol (server, client, codec)
/// - `observability`: Prometheus metrics and health endpoints

pub mod network;
pub mod observability;

// Re-export key types
pub use network::{OrderClient, OrderServer, WireFormat};
pub use observability::{HealthChecker, ObservabilityServer};
