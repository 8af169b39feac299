// sentinel-core/src/domain/checks/rule_set.rs

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

use super::Rule;
use super::rules::{
    CompiledFormat, DailyLimitAuthRule, DeviceTrustRule, ForeignKeyRule, FormatRule,
    HighValueAuthRule, RequiredFieldsRule, SubtypeConstraintRule, UniquenessRule,
};
use crate::domain::catalog::RuleCatalog;
use crate::domain::error::DomainError;
use crate::domain::ports::UniquenessOracle;

pub struct RuleEntry {
    pub rule: Box<dyn Rule>,
    /// False for informational rules: reported, never cleaned.
    pub feeds_cleaning: bool,
}

/// The executable form of a `RuleCatalog`, in a fixed order:
/// structural checks first, then business rules.
pub struct RuleSet {
    entries: Vec<RuleEntry>,
}

impl RuleSet {
    /// Validates the catalog and builds every rule. Any configuration problem
    /// is returned here, before a single check runs.
    #[instrument(skip_all)]
    pub fn compile(
        catalog: &RuleCatalog,
        oracle: Option<Arc<dyn UniquenessOracle>>,
        oracle_timeout: Duration,
    ) -> Result<Self, DomainError> {
        catalog.validate_catalog()?;

        let formats = catalog
            .formats
            .iter()
            .map(|b| CompiledFormat::compile(b, &catalog.patterns))
            .collect::<Result<Vec<_>, _>>()?;

        let mut rules: Vec<Box<dyn Rule>> = vec![
            Box::new(RequiredFieldsRule::new(catalog.required_fields.clone())),
            Box::new(UniquenessRule::new(
                catalog.unique_fields.clone(),
                oracle,
                oracle_timeout,
            )),
            Box::new(FormatRule::new(formats)),
            Box::new(ForeignKeyRule::new(catalog.foreign_keys.clone())),
        ];
        if let Some(cfg) = &catalog.high_value_auth {
            rules.push(Box::new(HighValueAuthRule::new(cfg.clone())));
        }
        if let Some(cfg) = &catalog.device_trust {
            rules.push(Box::new(DeviceTrustRule::new(cfg.clone())));
        }
        if let Some(cfg) = &catalog.daily_limit_auth {
            rules.push(Box::new(DailyLimitAuthRule::new(cfg.clone())));
        }
        if let Some(cfg) = &catalog.subtype_constraints {
            rules.push(Box::new(SubtypeConstraintRule::new(cfg.clone())));
        }

        let entries: Vec<RuleEntry> = rules
            .into_iter()
            .map(|rule| {
                let feeds_cleaning = catalog.feeds_cleaning(rule.id());
                RuleEntry {
                    rule,
                    feeds_cleaning,
                }
            })
            .collect();
        debug!(rules = entries.len(), "Rule catalog compiled");

        Ok(Self { entries })
    }

    /// Rule set with hand-picked rules, all feeding the cleaner.
    pub fn from_rules(rules: Vec<Box<dyn Rule>>) -> Self {
        Self {
            entries: rules
                .into_iter()
                .map(|rule| RuleEntry {
                    rule,
                    feeds_cleaning: true,
                })
                .collect(),
        }
    }

    pub fn entries(&self) -> &[RuleEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
