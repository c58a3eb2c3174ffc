//! Rules — typed, entropy-budgeted transform operators
//!
//! A rule moves content from one modality slot to another through an opaque
//! deterministic body. The engine owns the guards: the source modality must
//! be present, and the body's reported entropy delta must fit the rule's
//! budget. Bodies are substitutable behind the [`RuleImpl`] trait.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{PlenumError, Result};
use crate::model::{ProvenanceNode, Sphere};

/// Slack applied to every budget and allowance comparison, absorbing float
/// accumulation error.
pub const BUDGET_SLACK: f64 = 1e-12;

/// What a rule body returns: the produced value, a signed entropy delta,
/// and free-form metadata recorded into provenance.
#[derive(Debug, Clone)]
pub struct RuleOutput {
    pub value: Value,
    pub delta_entropy: f64,
    pub meta: Map<String, Value>,
}

impl RuleOutput {
    pub fn new(value: Value, delta_entropy: f64) -> Self {
        Self {
            value,
            delta_entropy,
            meta: Map::new(),
        }
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: Value) -> Self {
        self.meta.insert(key.into(), value);
        self
    }
}

/// Invocation context handed to rule bodies. The interpreter stamps the
/// target sphere id during chain execution and a closure marker during
/// media-quine synthesis.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RuleContext {
    entries: std::collections::BTreeMap<String, Value>,
}

impl RuleContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: Value) -> Self {
        self.entries.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }
}

/// Capability interface for rule bodies: pure, deterministic, total.
///
/// Determinism is required for fingerprint reproducibility; failure modes
/// (missing modality, blown budget) belong to the engine, not the body.
pub trait RuleImpl: Send + Sync {
    fn transform(&self, value: &Value, ctx: &RuleContext) -> RuleOutput;
}

impl<F> RuleImpl for F
where
    F: Fn(&Value, &RuleContext) -> RuleOutput + Send + Sync,
{
    fn transform(&self, value: &Value, ctx: &RuleContext) -> RuleOutput {
        self(value, ctx)
    }
}

/// A typed operator: `src` modality in, `dst` modality out, bounded by an
/// entropy budget. Immutable after registration.
#[derive(Clone)]
pub struct Rule {
    pub id: String,
    pub src: String,
    pub dst: String,
    pub entropy_budget: f64,
    body: Arc<dyn RuleImpl>,
}

impl Rule {
    pub fn new(
        id: impl Into<String>,
        src: impl Into<String>,
        dst: impl Into<String>,
        entropy_budget: f64,
        body: impl RuleImpl + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            src: src.into(),
            dst: dst.into(),
            entropy_budget: entropy_budget.max(0.0),
            body: Arc::new(body),
        }
    }

    /// Apply this rule to a sphere, producing a fresh sphere and the
    /// provenance node recording the step.
    ///
    /// Fails `TypeMismatch` if the source modality is missing or null, and
    /// `EntropyBudgetExceeded` if the body reports a delta above budget.
    /// The resulting entropy is floored at zero even for large negative
    /// deltas.
    pub fn apply(&self, sphere: &Sphere, ctx: &RuleContext) -> Result<(Sphere, ProvenanceNode)> {
        let src_val = sphere
            .modality(&self.src)
            .ok_or_else(|| PlenumError::TypeMismatch {
                rule: self.id.clone(),
                modality: self.src.clone(),
                sphere: sphere.id.clone(),
            })?;

        let out = self.body.transform(src_val, ctx);
        if out.delta_entropy > self.entropy_budget + BUDGET_SLACK {
            return Err(PlenumError::EntropyBudgetExceeded {
                rule: self.id.clone(),
                delta: out.delta_entropy,
                budget: self.entropy_budget,
            });
        }

        let mut new_sphere = sphere.clone();
        new_sphere.content.insert(self.dst.clone(), out.value);
        new_sphere.entropy = (new_sphere.entropy + out.delta_entropy).max(0.0);

        let node = ProvenanceNode::new(
            self.id.clone(),
            vec![sphere.id.clone()],
            new_sphere.id.clone(),
            out.meta,
        );
        new_sphere.provenance.push(node.clone());
        Ok((new_sphere, node))
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("src", &self.src)
            .field("dst", &self.dst)
            .field("entropy_budget", &self.entropy_budget)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reverse_tts() -> Rule {
        Rule::new("tts", "text", "audio", 0.02, |v: &Value, _: &RuleContext| {
            let text = v.as_str().unwrap_or_default();
            let audio: String = text.chars().rev().collect();
            RuleOutput::new(json!(audio), 0.01).with_meta("len", json!(text.len()))
        })
    }

    #[test]
    fn test_apply_transforms_and_accounts_entropy() {
        let s = Sphere::with_id("A", ["text", "audio"])
            .set_content("text", json!("hello world"))
            .with_entropy(0.05);

        let (out, node) = reverse_tts().apply(&s, &RuleContext::new()).unwrap();
        assert_eq!(out.modality("audio").unwrap(), &json!("dlrow olleh"));
        assert!((out.entropy - 0.06).abs() < 1e-12);
        assert_eq!(node.rule_id, "tts");
        assert_eq!(node.inputs, vec!["A"]);
        assert_eq!(out.provenance.len(), 1);
        // input untouched
        assert!(s.modality("audio").is_none());
        assert_eq!(s.provenance.len(), 0);
    }

    #[test]
    fn test_missing_modality_is_type_mismatch() {
        let s = Sphere::with_id("A", ["text", "audio"]);
        let err = reverse_tts().apply(&s, &RuleContext::new()).unwrap_err();
        assert!(matches!(err, PlenumError::TypeMismatch { .. }));
    }

    #[test]
    fn test_budget_guard() {
        let greedy = Rule::new("boil", "text", "audio", 0.01, |_: &Value, _: &RuleContext| {
            RuleOutput::new(json!("x"), 0.5)
        });
        let s = Sphere::with_id("A", ["text"]).set_content("text", json!("t"));
        let err = greedy.apply(&s, &RuleContext::new()).unwrap_err();
        assert!(matches!(err, PlenumError::EntropyBudgetExceeded { .. }));
    }

    #[test]
    fn test_entropy_floored_at_zero() {
        let compress = Rule::new("summ", "text", "text", 0.05, |_: &Value, _: &RuleContext| {
            RuleOutput::new(json!("s"), -10.0)
        });
        let s = Sphere::with_id("A", ["text"])
            .set_content("text", json!("long text"))
            .with_entropy(0.3);
        let (out, _) = compress.apply(&s, &RuleContext::new()).unwrap();
        assert_eq!(out.entropy, 0.0);
    }

    #[test]
    fn test_delta_at_exact_budget_passes() {
        let edge = Rule::new("edge", "text", "audio", 0.02, |_: &Value, _: &RuleContext| {
            RuleOutput::new(json!("a"), 0.02)
        });
        let s = Sphere::with_id("A", ["text"]).set_content("text", json!("t"));
        assert!(edge.apply(&s, &RuleContext::new()).is_ok());
    }
}
