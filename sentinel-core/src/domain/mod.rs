pub mod catalog;
pub mod checks;
pub mod dataset;
pub mod error;
pub mod ports;
pub mod project;

// Re-exports
pub use error::DomainError;
