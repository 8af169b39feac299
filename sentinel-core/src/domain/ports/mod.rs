// src/domain/ports/mod.rs

pub mod oracle;

pub use oracle::UniquenessOracle;
