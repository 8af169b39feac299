// sentinel-core/src/infrastructure/config/mod.rs

pub mod project;

pub use crate::domain::project::{CascadeMode, ProjectConfig};
pub use project::{load_project_config, load_rule_catalog};
