// sentinel-core/src/domain/checks/rules/mod.rs

// Structural checks
pub mod foreign_key;
pub mod format;
pub mod required;
pub mod uniqueness;

// Business rules
pub mod daily_limit;
pub mod device_trust;
pub mod high_value_auth;
pub mod subtype;

pub use daily_limit::DailyLimitAuthRule;
pub use device_trust::DeviceTrustRule;
pub use foreign_key::ForeignKeyRule;
pub use format::{CompiledFormat, FormatRule};
pub use high_value_auth::HighValueAuthRule;
pub use required::RequiredFieldsRule;
pub use subtype::SubtypeConstraintRule;
pub use uniqueness::UniquenessRule;
