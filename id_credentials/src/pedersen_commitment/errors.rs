use thiserror::Error;

/// Misuse of a commitment key. These are configuration errors and are never
/// the outcome of checking a commitment against an opening.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CommitmentError {
    #[error("The key commits to {expected} values, but {actual} were given.")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("A vector commitment key must have at least one base.")]
    EmptyKey,
}
