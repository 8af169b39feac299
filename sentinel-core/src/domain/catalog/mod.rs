// sentinel-core/src/domain/catalog/mod.rs

pub mod configuration;
pub mod relationship;

pub use configuration::{
    DAILY_LIMIT_AUTH_CHECK, DEVICE_TRUST_CHECK, DailyLimitAuthConfig, DeviceTrustConfig,
    FOREIGN_KEY_CHECK, FORMAT_CHECK, FormatBinding, HIGH_VALUE_AUTH_CHECK, HighValueAuthConfig,
    REQUIRED_FIELDS_CHECK, RuleCatalog, SUBTYPE_CONSTRAINT_CHECK, SubtypeConstraintConfig,
    SubtypeFields, UNIQUENESS_CHECK,
};
pub use relationship::{DependencyGraph, ForeignKey};
