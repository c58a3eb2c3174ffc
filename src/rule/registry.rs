//! Rule registry — id-keyed lookup table for registered operators
//!
//! Registration is append-only: no removal, no mutation. A registry is
//! typically built once, wrapped in an `Arc`, and shared read-only across
//! any number of interpreters.

use std::collections::HashMap;

use log::debug;

use super::Rule;
use crate::error::{PlenumError, Result};

#[derive(Debug, Default)]
pub struct RuleRegistry {
    rules: HashMap<String, Rule>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule; fails if the id is already taken
    pub fn register(&mut self, rule: Rule) -> Result<()> {
        if self.rules.contains_key(&rule.id) {
            return Err(PlenumError::DuplicateRule(rule.id));
        }
        debug!(
            "registered rule {} ({} -> {}, budget {})",
            rule.id, rule.src, rule.dst, rule.entropy_budget
        );
        self.rules.insert(rule.id.clone(), rule);
        Ok(())
    }

    /// Look up a rule by id
    pub fn get(&self, rule_id: &str) -> Result<&Rule> {
        self.rules
            .get(rule_id)
            .ok_or_else(|| PlenumError::UnknownRule(rule_id.to_string()))
    }

    pub fn contains(&self, rule_id: &str) -> bool {
        self.rules.contains_key(rule_id)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{RuleContext, RuleOutput};
    use serde_json::{json, Value};

    fn noop(id: &str) -> Rule {
        Rule::new(id, "text", "text", 0.1, |v: &Value, _: &RuleContext| {
            RuleOutput::new(v.clone(), 0.0)
        })
    }

    #[test]
    fn test_register_and_get() {
        let mut reg = RuleRegistry::new();
        reg.register(noop("summ")).unwrap();
        assert!(reg.contains("summ"));
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get("summ").unwrap().id, "summ");
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut reg = RuleRegistry::new();
        reg.register(noop("summ")).unwrap();
        let err = reg.register(noop("summ")).unwrap_err();
        assert!(matches!(err, PlenumError::DuplicateRule(id) if id == "summ"));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_unknown_rule() {
        let reg = RuleRegistry::new();
        let err = reg.get("ghost").unwrap_err();
        assert!(matches!(err, PlenumError::UnknownRule(id) if id == "ghost"));
    }
}
