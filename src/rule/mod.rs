//! Typed operators and their lookup table

mod operator;
mod registry;

pub use operator::{Rule, RuleContext, RuleImpl, RuleOutput, BUDGET_SLACK};
pub use registry::RuleRegistry;
