//! Plenum — entropy-budgeted multimodal transform engine
//!
//! Typed containers (spheres) hold content across named modalities; rules
//! are deterministic, entropy-budgeted operators moving content between
//! modalities; the interpreter composes rule chains, merges spheres under a
//! bounded-entropy-growth guarantee, synthesizes missing modalities to a
//! fixed point, and exports proof-carrying provenance for audit.

pub mod error;
pub mod fingerprint;
pub mod interp;
pub mod model;
pub mod proof;
pub mod rule;

pub use error::{PlenumError, Result};
pub use fingerprint::{fingerprint, fingerprint_of};
pub use interp::{Interpreter, InterpreterStats, TransducerMap, DEFAULT_MERGE_EPSILON};
pub use model::{ProvenanceNode, Sphere};
pub use proof::{AuditEntry, AuditRecord};
pub use rule::{Rule, RuleContext, RuleImpl, RuleOutput, RuleRegistry};
