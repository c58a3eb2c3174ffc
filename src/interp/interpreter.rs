//! Interpreter — executes rule chains, guarded merges, and closure
//!
//! The interpreter exclusively owns its sphere store (id -> latest value)
//! and shares a read-only rule registry. Every operation computes on copies
//! and commits through a single store write at the end, so a failure leaves
//! the store exactly as it was.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::merge::merge_spheres;
use crate::error::{PlenumError, Result};
use crate::model::Sphere;
use crate::proof::AuditRecord;
use crate::rule::{RuleContext, RuleRegistry};

/// Default allowance for merge-induced entropy growth
pub const DEFAULT_MERGE_EPSILON: f64 = 0.05;

/// Transducer table for media-quine closure: `(src, dst)` modality pair to
/// the id of a rule producing `dst` from `src`. The `BTreeMap` fixes the
/// candidate order to lexicographic `(src, dst)`, so closure is
/// deterministic regardless of how the table was built.
pub type TransducerMap = BTreeMap<(String, String), String>;

/// Aggregate view of the interpreter's store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterpreterStats {
    pub spheres: usize,
    pub well_typed: usize,
    pub total_entropy: f64,
    pub avg_entropy: f64,
    pub provenance_nodes: usize,
}

/// Sequential engine over a sphere store and a shared rule registry
pub struct Interpreter {
    registry: Arc<RuleRegistry>,
    spheres: HashMap<String, Sphere>,
    merge_epsilon: f64,
}

impl Interpreter {
    pub fn new(registry: Arc<RuleRegistry>) -> Self {
        Self {
            registry,
            spheres: HashMap::new(),
            merge_epsilon: DEFAULT_MERGE_EPSILON,
        }
    }

    pub fn with_merge_epsilon(mut self, epsilon: f64) -> Self {
        self.merge_epsilon = epsilon.max(0.0);
        self
    }

    pub fn merge_epsilon(&self) -> f64 {
        self.merge_epsilon
    }

    /// Add a sphere to the store; fails if the id is already taken
    pub fn add_sphere(&mut self, sphere: Sphere) -> Result<()> {
        if self.spheres.contains_key(&sphere.id) {
            return Err(PlenumError::DuplicateSphere(sphere.id));
        }
        info!("added sphere {}", sphere.summary());
        self.spheres.insert(sphere.id.clone(), sphere);
        Ok(())
    }

    /// Independent copy of the latest value stored under `id`
    pub fn get(&self, id: &str) -> Result<Sphere> {
        self.spheres
            .get(id)
            .cloned()
            .ok_or_else(|| PlenumError::SphereNotFound(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.spheres.contains_key(id)
    }

    /// Stored sphere ids, sorted
    pub fn sphere_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.spheres.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.spheres.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spheres.is_empty()
    }

    /// Big-step chain execution: apply `rule_chain` strictly in order
    /// starting from the source sphere, then merge the result into the
    /// target with overwrite priority. The merged sphere is stored under
    /// the target's id and returned.
    pub fn pop(&mut self, source_id: &str, target_id: &str, rule_chain: &[&str]) -> Result<Sphere> {
        let target = self.get(target_id)?;
        let mut current = self.get(source_id)?;

        let ctx = RuleContext::new().set("target", json!(target_id));
        for rule_id in rule_chain {
            let rule = self.registry.get(rule_id)?;
            let (next, _node) = rule.apply(&current, &ctx)?;
            debug!("pop step {}: {} -> {}", rule_id, rule.src, rule.dst);
            current = next;
        }

        let merged = merge_spheres(&current, &target, true, self.merge_epsilon)?;
        info!(
            "pop {} -> {} via {:?}: entropy {:.4}",
            source_id, target_id, rule_chain, merged.entropy
        );
        self.spheres.insert(merged.id.clone(), merged.clone());
        Ok(merged)
    }

    /// Gap-filling merge of `a` into `b`: `b`'s values win ties, `a` only
    /// fills absent or null slots. Stored under `out_id` when given, else
    /// under `b`'s id.
    pub fn merge(&mut self, a_id: &str, b_id: &str, out_id: Option<&str>) -> Result<Sphere> {
        let a = self.get(a_id)?;
        let b = self.get(b_id)?;
        let mut merged = merge_spheres(&a, &b, false, self.merge_epsilon)?;
        if let Some(out) = out_id {
            merged.id = out.to_string();
        }
        info!(
            "merged {} into {} as {}: entropy {:.4}",
            a_id, b_id, merged.id, merged.entropy
        );
        self.spheres.insert(merged.id.clone(), merged.clone());
        Ok(merged)
    }

    /// Fixed-point synthesis of missing required modalities.
    ///
    /// Scans declared types in sorted order; each missing modality is
    /// matched against the transducer table in its canonical `(src, dst)`
    /// order, and the first applicable rule fires before the scan restarts.
    /// Stops when the sphere is well-typed or a full scan makes no
    /// progress — an unfillable gap is not an error, and the caller checks
    /// `is_well_typed` on the result. Rule failures (unknown id, blown
    /// budget) propagate and leave the store unchanged.
    pub fn close_media_quine(
        &mut self,
        sphere_id: &str,
        transducers: &TransducerMap,
    ) -> Result<Sphere> {
        let mut sphere = self.get(sphere_id)?;
        let ctx = RuleContext::new().set("closure", json!(true));

        'scan: loop {
            let required: Vec<String> = sphere.types.iter().cloned().collect();
            for needed in &required {
                if sphere.modality(needed).is_some() {
                    continue;
                }
                for ((src, dst), rule_id) in transducers {
                    if dst != needed || sphere.modality(src).is_none() {
                        continue;
                    }
                    let rule = self.registry.get(rule_id)?;
                    let (next, _) = rule.apply(&sphere, &ctx)?;
                    debug!("closure synthesized '{}' from '{}' via {}", dst, src, rule_id);
                    sphere = next;
                    continue 'scan;
                }
            }
            break;
        }

        info!(
            "closure of {}: well_typed={} entropy={:.4}",
            sphere_id,
            sphere.is_well_typed(),
            sphere.entropy
        );
        self.spheres.insert(sphere.id.clone(), sphere.clone());
        Ok(sphere)
    }

    /// Read-only audit export for a stored sphere
    pub fn emit_proof_log(&self, sphere_id: &str) -> Result<AuditRecord> {
        let sphere = self.get(sphere_id)?;
        Ok(AuditRecord::from_sphere(&sphere))
    }

    pub fn stats(&self) -> InterpreterStats {
        let spheres = self.spheres.len();
        let total_entropy: f64 = self.spheres.values().map(|s| s.entropy).sum();
        InterpreterStats {
            spheres,
            well_typed: self.spheres.values().filter(|s| s.is_well_typed()).count(),
            total_entropy,
            avg_entropy: if spheres > 0 {
                total_entropy / spheres as f64
            } else {
                0.0
            },
            provenance_nodes: self.spheres.values().map(|s| s.provenance.len()).sum(),
        }
    }
}
