//! Commitment key for committing to a single value.

use super::{Commitment, Randomness};
use crate::{common::*, curve_arithmetic::*};
use rand::*;

/// A commitment key `(g, h)`. A value `v` with randomness `r` is committed as
/// `g^v h^r`.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct CommitmentKey<C: Curve> {
    pub g: C,
    pub h: C,
}

serde_base16!([C: Curve] CommitmentKey<C>);

impl<C: Curve> Serial for CommitmentKey<C> {
    fn serial<B: Buffer>(&self, out: &mut B) {
        out.put(&self.g);
        out.put(&self.h);
    }
}

impl<C: Curve> Deserial for CommitmentKey<C> {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let g = source.get()?;
        let h = source.get()?;
        Ok(CommitmentKey { g, h })
    }
}

impl<C: Curve> CommitmentKey<C> {
    pub fn new(g: C, h: C) -> Self { CommitmentKey { g, h } }

    /// Commit to the value with fresh randomness, returning the randomness so
    /// that the commitment can be opened later.
    pub fn commit<T: Rng, V: AsRef<C::Scalar>>(
        &self,
        s: &V,
        csprng: &mut T,
    ) -> (Commitment<C>, Randomness<C>) {
        let r = Randomness::<C>::generate(csprng);
        (self.hide(s, &r), r)
    }

    pub fn hide_worker(&self, value: &C::Scalar, randomness: &C::Scalar) -> Commitment<C> {
        Commitment(multiexp(&[self.g, self.h], &[*value, *randomness]))
    }

    #[inline(always)]
    pub fn hide<V: AsRef<C::Scalar>>(&self, s: &V, r: &Randomness<C>) -> Commitment<C> {
        self.hide_worker(s.as_ref(), r.as_ref())
    }

    pub fn open<V: AsRef<C::Scalar>>(&self, s: &V, r: &Randomness<C>, c: &Commitment<C>) -> bool {
        self.hide(s, r) == *c
    }

    pub fn generate<T: Rng>(csprng: &mut T) -> CommitmentKey<C> {
        let h = C::generate(csprng);
        let g = C::generate(csprng);
        CommitmentKey { g, h }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    pub fn test_key_serialization() {
        let mut csprng = thread_rng();
        for _i in 1..20 {
            let key = CommitmentKey::<G1>::generate(&mut csprng);
            let key2 = serialize_deserialize(&key).expect("Key should deserialize.");
            assert_eq!(key2, key);
        }
    }

    #[test]
    pub fn test_commit_open() {
        let mut csprng = thread_rng();
        for _i in 1..50 {
            let key = CommitmentKey::<G1>::generate(&mut csprng);
            let value = Value::<G1>::generate(&mut csprng);
            let (c, r) = key.commit(&value, &mut csprng);
            assert!(key.open(&value, &r, &c));
            assert!(!key.open(&value, &r, &Commitment::generate(&mut csprng)));
            assert!(!key.open(&value, &Randomness::generate(&mut csprng), &c));
            assert!(!key.open(&Value::<G1>::generate(&mut csprng), &r, &c));
        }
    }
}
