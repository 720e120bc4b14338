//! Pedersen commitments: a single value under a key `(g, h)`, and a vector of
//! values under a key `(g_1, ..., g_n, h)`.
mod commitment;
mod equality;
mod errors;
mod key;
mod randomness;
mod vec_key;

pub use crate::curve_arithmetic::Value;
pub use commitment::*;
pub use equality::*;
pub use errors::*;
pub use key::*;
pub use randomness::*;
pub use vec_key::*;
