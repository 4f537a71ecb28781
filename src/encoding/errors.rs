use std::io;

use thiserror::Error;

/// Represents the outer-level, user-facing errors of the executor bytecode compiler.
///
/// Every error is synchronous and aborts the whole compilation: either the complete buffer is
/// produced or none is.
/// Variants:
/// - `StructuralViolation`: The route tree (or the data aligned with it) breaks an invariant, e.g.
///   percentages that do not sum to 100, empty swap lists or a parameter count mismatch.
/// - `PatternNotFound`: A literal that the selected flag needs to patch at runtime could not be
///   located inside the sub-call body.
/// - `UnsupportedTopology`: The combination of special exchange handling, branching and native
///   asset handling is not covered. Callers may fall back to an alternate route.
/// - `InvalidInput`: Malformed external input, such as a request that cannot be parsed.
/// - `FatalError`: There is a problem with the application setup (configuration, I/O).
#[derive(Error, Debug, PartialEq)]
pub enum EncodingError {
    #[error("Structural violation: {0}")]
    StructuralViolation(String),
    #[error("Pattern not found: {0}")]
    PatternNotFound(String),
    #[error("Unsupported topology: {0}")]
    UnsupportedTopology(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Fatal error: {0}")]
    FatalError(String),
}

impl From<io::Error> for EncodingError {
    fn from(err: io::Error) -> Self {
        EncodingError::FatalError(err.to_string())
    }
}

impl From<serde_json::Error> for EncodingError {
    fn from(err: serde_json::Error) -> Self {
        EncodingError::FatalError(err.to_string())
    }
}
