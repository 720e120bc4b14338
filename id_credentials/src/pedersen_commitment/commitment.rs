use super::{CommitmentKey, Randomness};
use crate::{common::*, curve_arithmetic::*};
use rand::*;

/// A Pedersen commitment, a single group element.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[repr(transparent)]
pub struct Commitment<C: Curve>(pub C);

serde_base16!([C: Curve] Commitment<C>);

impl<C: Curve> Serial for Commitment<C> {
    fn serial<B: Buffer>(&self, out: &mut B) { self.0.serial(out) }
}

impl<C: Curve> Deserial for Commitment<C> {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        Ok(Commitment(source.get()?))
    }
}

impl<C: Curve> std::ops::Deref for Commitment<C> {
    type Target = C;

    fn deref(&self) -> &C { &self.0 }
}

impl<C: Curve> Commitment<C> {
    /// Combine two commitments. The result commits to the sum of the values
    /// with the sum of the randomness.
    pub fn combine(&self, other: &Commitment<C>) -> Commitment<C> {
        Commitment(self.0.plus_point(&other.0))
    }

    /// Produce a fresh commitment to the same value. The returned randomness is
    /// the difference, so the new commitment opens with `r + r'`.
    pub fn rerandomize<R: Rng>(
        &self,
        key: &CommitmentKey<C>,
        csprng: &mut R,
    ) -> (Commitment<C>, Randomness<C>) {
        let r_prime = Randomness::generate_non_zero(csprng);
        let c = self.0.plus_point(&key.h.mul_by_scalar(&r_prime));
        (Commitment(c), r_prime)
    }

    /// A commitment to a uniformly random point, useful as a stand-in in tests.
    pub fn generate<R: Rng>(csprng: &mut R) -> Commitment<C> { Commitment(C::generate(csprng)) }
}
