use thiserror::Error;

/// Reasons a signing or verification request is rejected before any group
/// arithmetic happens.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum SignatureError {
    #[error("The message has {message} components, but the key only supports {key}.")]
    KeyMessageLengthMismatch { key: usize, message: usize },
    #[error("The signature is the identity element.")]
    TrivialSignature,
}
