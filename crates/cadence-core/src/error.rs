use thiserror::Error;

/// Core-level errors
#[derive(Error, Debug)]
pub enum CoreError {
    /// Shared state that the server wires up at startup is missing.
    #[error("Invariant violation: {0}")]
    InvariantViolation(&'static str),
}
