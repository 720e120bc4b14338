//! Sigma protocols made non-interactive with the Fiat-Shamir transform, and
//! the combinators used to compose them into a single credential proof.
pub mod com_enc_eq;
pub mod com_eq_sig;
pub mod com_mult;
pub mod common;
pub mod dlog;
pub mod vcom_eq;
