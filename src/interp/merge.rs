//! Entropy-bounded merge — combine two spheres under a growth allowance
//!
//! The merged entropy starts from the larger of the two inputs and grows by
//! a per-modality mismatch penalty; if the candidate exceeds the configured
//! allowance the merge is rejected wholesale. Content conflicts are decided
//! by the `allow_overwrite` flag, and provenance histories are concatenated
//! without deduplication.

use std::collections::BTreeSet;

use crate::error::{PlenumError, Result};
use crate::fingerprint::fingerprint;
use crate::model::Sphere;
use crate::rule::BUDGET_SLACK;

/// Penalty when exactly one side carries a value for a modality
pub const PARTIAL_COVERAGE_PENALTY: f64 = 0.01;
/// Penalty when both sides carry values whose fingerprints differ
pub const DIVERGENCE_PENALTY: f64 = 0.02;

/// Merge `a` into `b`, preserving `b`'s identity.
///
/// With `allow_overwrite`, `a`'s values win every conflict; otherwise `a`
/// only fills slots `b` leaves absent or null. Fails `MergeEntropyExceeded`
/// when the candidate entropy outgrows `max(a, b) + epsilon`.
pub fn merge_spheres(a: &Sphere, b: &Sphere, allow_overwrite: bool, epsilon: f64) -> Result<Sphere> {
    let max_e = a.entropy.max(b.entropy);

    let mut mismatch_penalty = 0.0;
    let keys: BTreeSet<&String> = a.content.keys().chain(b.content.keys()).collect();
    for key in keys {
        match (a.modality(key), b.modality(key)) {
            (None, None) => {}
            (Some(va), Some(vb)) => {
                if fingerprint(va) != fingerprint(vb) {
                    mismatch_penalty += DIVERGENCE_PENALTY;
                }
            }
            _ => mismatch_penalty += PARTIAL_COVERAGE_PENALTY,
        }
    }

    let e_m = max_e + mismatch_penalty;
    let allowed = max_e + epsilon;
    if e_m > allowed + BUDGET_SLACK {
        return Err(PlenumError::MergeEntropyExceeded {
            candidate: e_m,
            allowed,
        });
    }

    let mut out = b.clone();
    out.entropy = e_m;
    for (key, value) in &a.content {
        if allow_overwrite || out.modality(key).is_none() {
            out.content.insert(key.clone(), value.clone());
        }
    }
    // target history first, then source; duplicates accumulate on purpose
    out.provenance.extend(a.provenance.iter().cloned());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_self_merge_is_neutral() {
        let a = Sphere::with_id("A", ["text"])
            .set_content("text", json!("same"))
            .with_entropy(0.07);
        let out = merge_spheres(&a, &a, false, 0.05).unwrap();
        assert_eq!(out.entropy, a.entropy);
        assert_eq!(out.content, a.content);
        assert_eq!(out.id, "A");
    }

    #[test]
    fn test_divergence_penalty_within_allowance() {
        let b = Sphere::with_id("B", ["text"])
            .set_content("text", json!("x"))
            .with_entropy(0.04);
        let c = Sphere::with_id("C", ["text"])
            .set_content("text", json!("y"))
            .with_entropy(0.05);
        let out = merge_spheres(&b, &c, false, 0.05).unwrap();
        assert!((out.entropy - 0.07).abs() < 1e-12);
        // no overwrite: target keeps its value
        assert_eq!(out.modality("text").unwrap(), &json!("y"));
    }

    #[test]
    fn test_divergence_over_allowance_rejected() {
        let b = Sphere::with_id("B", ["text"])
            .set_content("text", json!("x"))
            .with_entropy(0.04);
        let c = Sphere::with_id("C", ["text"])
            .set_content("text", json!("y"))
            .with_entropy(0.05);
        let err = merge_spheres(&b, &c, false, 0.01).unwrap_err();
        assert!(matches!(err, PlenumError::MergeEntropyExceeded { .. }));
    }

    #[test]
    fn test_partial_coverage_penalty() {
        let a = Sphere::with_id("A", ["text"])
            .set_content("audio", json!("<a>"))
            .with_entropy(0.02);
        let b = Sphere::with_id("B", ["text"])
            .set_content("text", json!("t"))
            .with_entropy(0.03);
        // two one-sided keys -> 0.02 total penalty
        let out = merge_spheres(&a, &b, false, 0.05).unwrap();
        assert!((out.entropy - 0.05).abs() < 1e-12);
        assert_eq!(out.modality("audio").unwrap(), &json!("<a>"));
        assert_eq!(out.modality("text").unwrap(), &json!("t"));
    }

    #[test]
    fn test_overwrite_priority() {
        let a = Sphere::with_id("A", ["text"]).set_content("text", json!("new"));
        let b = Sphere::with_id("B", ["text"]).set_content("text", json!("old"));
        let out = merge_spheres(&a, &b, true, 0.05).unwrap();
        assert_eq!(out.modality("text").unwrap(), &json!("new"));
    }

    #[test]
    fn test_null_slot_fills_without_overwrite() {
        let a = Sphere::with_id("A", ["text"]).set_content("text", json!("filled"));
        let b = Sphere::with_id("B", ["text"]).set_content("text", serde_json::Value::Null);
        let out = merge_spheres(&a, &b, false, 0.05).unwrap();
        assert_eq!(out.modality("text").unwrap(), &json!("filled"));
    }

    #[test]
    fn test_provenance_concatenated_target_first() {
        use crate::model::ProvenanceNode;
        use serde_json::Map;

        let mut a = Sphere::with_id("A", ["text"]).set_content("text", json!("t"));
        a.provenance
            .push(ProvenanceNode::new("ra", vec!["A".into()], "A", Map::new()));
        let mut b = Sphere::with_id("B", ["text"]);
        b.provenance
            .push(ProvenanceNode::new("rb", vec!["B".into()], "B", Map::new()));

        let out = merge_spheres(&a, &b, false, 0.05).unwrap();
        let order: Vec<&str> = out.provenance.iter().map(|n| n.rule_id.as_str()).collect();
        assert_eq!(order, vec!["rb", "ra"]);

        // merging again accumulates duplicates rather than deduplicating
        let again = merge_spheres(&a, &out, false, 0.05).unwrap();
        assert_eq!(again.provenance.len(), 3);
    }
}
