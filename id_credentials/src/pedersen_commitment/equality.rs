//! Proof that two commitments under the same key hide the same value, without
//! revealing it. The quotient of the two commitments is a power of the
//! blinding base `h`, so knowledge of that exponent is a dlog proof.
use super::{Commitment, CommitmentKey, Randomness};
use crate::{
    curve_arithmetic::{Curve, Field, Value},
    random_oracle::RandomOracle,
    sigma_protocols::{common::*, dlog::*},
};
use rand::Rng;

/// A proof that two commitments open to the same value.
pub type EqualityProof<C> = SigmaProof<Response<C>>;

fn equality_statement<C: Curve>(
    key: &CommitmentKey<C>,
    c_1: &Commitment<C>,
    c_2: &Commitment<C>,
) -> Dlog<C> {
    Dlog {
        point: c_1.minus_point(c_2),
        base:  key.h,
    }
}

/// Prove that `c_1` and `c_2` hide the same value, given both randomness
/// values used to create them.
pub fn prove_equality<C: Curve, R: Rng>(
    ro: &mut RandomOracle,
    key: &CommitmentKey<C>,
    c_1: &Commitment<C>,
    c_2: &Commitment<C>,
    r_1: &Randomness<C>,
    r_2: &Randomness<C>,
    csprng: &mut R,
) -> Option<EqualityProof<C>> {
    let mut diff = *r_1.as_ref();
    diff.sub_assign(r_2);
    let secret = DlogSecret {
        exponent: Value::new(diff),
    };
    ro.append_message(b"commitment_equality", &(c_1, c_2));
    prove(ro, &equality_statement(key, c_1, c_2), secret, csprng)
}

pub fn verify_equality<C: Curve>(
    ro: &mut RandomOracle,
    key: &CommitmentKey<C>,
    c_1: &Commitment<C>,
    c_2: &Commitment<C>,
    proof: &EqualityProof<C>,
) -> bool {
    ro.append_message(b"commitment_equality", &(c_1, c_2));
    verify(ro, &equality_statement(key, c_1, c_2), proof)
}
