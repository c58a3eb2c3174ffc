//! Audit records — proof-carrying export of a sphere's causal chain
//!
//! An audit record pins a sphere's fingerprint plus one entry per
//! provenance node, enough for an independent party to recompute every hash
//! and verify the chain from original inputs to the current value.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::Sphere;

/// One provenance node in exported form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub rule: String,
    pub inputs: Vec<String>,
    pub output: String,
    pub fingerprint: String,
}

/// Exported proof log for a sphere
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub sphere_id: String,
    pub fingerprint: String,
    pub provenance: Vec<AuditEntry>,
}

impl AuditRecord {
    /// Build the export for a sphere's current state
    pub fn from_sphere(sphere: &Sphere) -> Self {
        Self {
            sphere_id: sphere.id.clone(),
            fingerprint: sphere.fingerprint(),
            provenance: sphere
                .provenance
                .iter()
                .map(|node| AuditEntry {
                    rule: node.rule_id.clone(),
                    inputs: node.inputs.clone(),
                    output: node.output_id.clone(),
                    fingerprint: node.fingerprint(),
                })
                .collect(),
        }
    }

    /// Recompute every fingerprint from `sphere` and compare against this
    /// record. True iff the record still describes that sphere exactly.
    pub fn verify(&self, sphere: &Sphere) -> bool {
        if self.sphere_id != sphere.id || self.fingerprint != sphere.fingerprint() {
            return false;
        }
        if self.provenance.len() != sphere.provenance.len() {
            return false;
        }
        self.provenance
            .iter()
            .zip(&sphere.provenance)
            .all(|(entry, node)| {
                entry.rule == node.rule_id
                    && entry.inputs == node.inputs
                    && entry.output == node.output_id
                    && entry.fingerprint == node.fingerprint()
            })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
