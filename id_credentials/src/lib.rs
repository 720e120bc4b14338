#![doc = include_str!("../README.md")]
pub mod common;
pub mod curve_arithmetic;
pub mod eddsa_ed25519;
pub mod elgamal;
pub mod id;
pub mod pedersen_commitment;
pub mod ps_sig;
pub mod random_oracle;
pub mod sigma_protocols;

/// We expose the `VerifyingKey`, `SigningKey` and `Signature` from the
/// third-party `ed25519_dalek` crate here because these types appear in the
/// API of account keys and initial accounts.
pub mod ed25519 {
    pub use ed25519_dalek::{Signature, SigningKey, VerifyingKey as PublicKey};
}
