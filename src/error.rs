//! Engine error taxonomy
//!
//! Every failure is synchronous and leaves the interpreter store untouched;
//! an operation either commits its single store write or returns one of
//! these.

/// Errors raised by the sphere/rule/interpreter engine
#[derive(Debug, thiserror::Error)]
pub enum PlenumError {
    #[error("Sphere {0} already exists")]
    DuplicateSphere(String),

    #[error("Rule {0} already registered")]
    DuplicateRule(String),

    #[error("Sphere {0} not found")]
    SphereNotFound(String),

    #[error("Unknown rule {0}")]
    UnknownRule(String),

    #[error("Rule {rule} expects modality '{modality}' present on sphere {sphere}")]
    TypeMismatch {
        rule: String,
        modality: String,
        sphere: String,
    },

    #[error("Rule {rule} would increase entropy by {delta} > budget {budget}")]
    EntropyBudgetExceeded {
        rule: String,
        delta: f64,
        budget: f64,
    },

    #[error("Merge would exceed entropy allowance: {candidate:.4} > {allowed:.4}")]
    MergeEntropyExceeded { candidate: f64, allowed: f64 },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PlenumError>;
