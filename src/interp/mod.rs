//! Rule-chain execution, entropy-guarded merge, and media-quine closure

mod interpreter;
mod merge;

pub use interpreter::{Interpreter, InterpreterStats, TransducerMap, DEFAULT_MERGE_EPSILON};
pub use merge::{merge_spheres, DIVERGENCE_PENALTY, PARTIAL_COVERAGE_PENALTY};
