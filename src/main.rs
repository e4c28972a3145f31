/// Main entry point for the orderbook engine
///
/// Thin wrapper that delegates to the interfaces layer.

use orderbook_engine::interfaces::cli;

#[tokio::main]
async fn main() {
    if let Err(e) = cli::run().await {
        eprintln!("orderbook-engine: {}", e);
        std::process::exit(1);
    }
}
