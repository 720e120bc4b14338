//! This module and its submodules implement the identity layer, providing
//! the core functionality for all entities involved (users, identity
//! providers, anonymity revokers, and the chain).
pub mod account_holder;
pub mod anonymity_revoker;
pub mod chain;
pub mod constants;
pub mod genesis;
pub mod identity_provider;
pub mod secret_sharing;
pub mod types;
pub mod utils;

/// Re-export of Pedersen commitments functionality.
pub use crate::pedersen_commitment;

/// Re-export of curve arithmetic.
pub use crate::curve_arithmetic;

/// Re-export of Elgamal encryption.
pub use crate::elgamal;

/// Re-export the Pointcheval-Sanders signature scheme used by identity
/// providers.
pub use crate::ps_sig;

#[cfg(test)]
pub mod test;
