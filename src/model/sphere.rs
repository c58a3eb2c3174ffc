//! Sphere — typed multimodal container with entropy cost and provenance
//!
//! A sphere declares the modalities it requires (`types`), carries whatever
//! content it currently has (`content`), a non-negative entropy scalar, and
//! an append-only causal history. Spheres are value types: every transform
//! in the engine produces a fresh sphere rather than mutating one in place.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use super::ProvenanceNode;
use crate::error::Result;
use crate::fingerprint::fingerprint;

/// Multimodal typed container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sphere {
    pub id: String,
    /// Required modality keys, e.g. {"text", "audio", "code"}
    pub types: BTreeSet<String>,
    /// Modality -> value. A null value and an absent key mean the same
    /// thing everywhere in the engine.
    pub content: BTreeMap<String, Value>,
    /// Semantic entropy, always >= 0
    pub entropy: f64,
    /// Causal history, oldest first
    pub provenance: Vec<ProvenanceNode>,
}

impl Sphere {
    /// Create an empty sphere with a generated id
    pub fn new(types: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), types)
    }

    /// Create an empty sphere with an explicit id
    pub fn with_id(
        id: impl Into<String>,
        types: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            id: id.into(),
            types: types.into_iter().map(Into::into).collect(),
            content: BTreeMap::new(),
            entropy: 0.0,
            provenance: Vec::new(),
        }
    }

    /// Set one modality slot, builder style
    pub fn set_content(mut self, modality: impl Into<String>, value: Value) -> Self {
        self.content.insert(modality.into(), value);
        self
    }

    /// Set the entropy cost, clamped at zero
    pub fn with_entropy(mut self, entropy: f64) -> Self {
        self.entropy = entropy.max(0.0);
        self
    }

    /// Present, non-null value for a modality
    pub fn modality(&self, key: &str) -> Option<&Value> {
        self.content.get(key).filter(|v| !v.is_null())
    }

    /// True iff every declared modality has a present, non-null value
    pub fn is_well_typed(&self) -> bool {
        self.types.iter().all(|t| self.modality(t).is_some())
    }

    /// Declared modalities that are still missing or null
    pub fn missing_modalities(&self) -> Vec<&str> {
        self.types
            .iter()
            .filter(|t| self.modality(t).is_none())
            .map(String::as_str)
            .collect()
    }

    /// Canonical hash over identity, types, content keys, entropy (rounded
    /// to 9 decimals) and provenance fingerprints
    pub fn fingerprint(&self) -> String {
        let prov_fps: Vec<String> = self.provenance.iter().map(|p| p.fingerprint()).collect();
        fingerprint(&json!({
            "id": self.id,
            "types": self.types,
            "content_keys": self.content.keys().collect::<Vec<_>>(),
            "entropy": (self.entropy * 1e9).round() / 1e9,
            "prov": prov_fps,
        }))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(data: &str) -> Result<Self> {
        Ok(serde_json::from_str(data)?)
    }

    pub fn summary(&self) -> String {
        let populated: Vec<&str> = self
            .content
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, _)| k.as_str())
            .collect();
        format!(
            "Sphere '{}' | types={:?} | populated={:?} | entropy={:.4} | history={}",
            self.id,
            self.types,
            populated,
            self.entropy,
            self.provenance.len()
        )
    }
}
