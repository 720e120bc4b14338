//! ElGamal encryption over a prime order group, including encryption "in the
//! exponent" which is how shares of the credential holder's secret are
//! handed to anonymity revokers.
mod cipher;
mod message;
mod public;
mod secret;

pub use self::{cipher::*, message::*, public::*, secret::*};
