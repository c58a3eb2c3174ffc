//! Proof-log export and verification

mod audit;

pub use audit::{AuditEntry, AuditRecord};
