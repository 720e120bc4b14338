//! Proofs of knowledge of ed25519 secret keys. A new account proves that its
//! owner holds the signing keys it is registered with.
mod dlog_ed25519;

pub use dlog_ed25519::*;
