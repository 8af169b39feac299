// sentinel-core/src/ports/mod.rs

pub mod provider;
pub mod sink;

pub use provider::DatasetProvider;
pub use sink::DurableSink;
