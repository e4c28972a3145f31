/// Application Layer - Services
///
/// Orchestrates the domain book for concurrent callers. It depends on the
/// domain layer but not on networking or the CLI.

pub mod services;

// Re-export key services
pub use services::{BookHandle, BookService, SharedBook};
