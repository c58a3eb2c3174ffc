//! Provenance nodes — immutable audit records of single rule applications
//!
//! Every transform appends one node to the output sphere's history. A node
//! is never edited after construction; its fingerprint pins the application
//! for later proof-log verification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::fingerprint::fingerprint;

/// One entry in a sphere's causal history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvenanceNode {
    /// Rule that produced this step
    pub rule_id: String,
    /// Ids of the input spheres, sorted
    pub inputs: Vec<String>,
    /// Id of the sphere the step produced
    pub output_id: String,
    /// When the step ran
    pub timestamp: DateTime<Utc>,
    /// Free-form metadata reported by the rule body
    pub meta: Map<String, Value>,
}

impl ProvenanceNode {
    /// Record a rule application. Inputs are sorted so the fingerprint does
    /// not depend on argument order.
    pub fn new(
        rule_id: impl Into<String>,
        inputs: Vec<String>,
        output_id: impl Into<String>,
        meta: Map<String, Value>,
    ) -> Self {
        let mut inputs = inputs;
        inputs.sort();
        Self {
            rule_id: rule_id.into(),
            inputs,
            output_id: output_id.into(),
            timestamp: Utc::now(),
            meta,
        }
    }

    /// Canonical hash of this node (microsecond timestamp precision)
    pub fn fingerprint(&self) -> String {
        fingerprint(&json!({
            "rule_id": self.rule_id,
            "inputs": self.inputs,
            "output_id": self.output_id,
            "timestamp": self.timestamp.timestamp_micros(),
            "meta": Value::Object(self.meta.clone()),
        }))
    }
}
