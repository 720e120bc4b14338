//! Commitment key for committing to a vector of values at once.

use super::{Commitment, CommitmentError, Randomness};
use crate::{common::*, curve_arithmetic::*};
use anyhow::ensure;
use rand::*;

/// A vector commitment key `(g_1, ..., g_n, h)`. Values `v_1, ..., v_n` with
/// randomness `r` are committed as `h^r Π g_i^{v_i}`. The number of values
/// committed to must match the number of bases exactly.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct VecCommitmentKey<C: Curve> {
    gs: Vec<C>,
    h:  C,
}

impl<C: Curve> Serial for VecCommitmentKey<C> {
    fn serial<B: Buffer>(&self, out: &mut B) {
        out.put(&(self.gs.len() as u32));
        serial_vector_no_length(&self.gs, out);
        out.put(&self.h);
    }
}

impl<C: Curve> Deserial for VecCommitmentKey<C> {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let len: u32 = source.get()?;
        ensure!(len > 0, "A vector commitment key needs at least one base.");
        let gs = deserial_vector_no_length(source, len as usize)?;
        let h = source.get()?;
        Ok(VecCommitmentKey { gs, h })
    }
}

impl<C: Curve> VecCommitmentKey<C> {
    pub fn new(gs: Vec<C>, h: C) -> Result<Self, CommitmentError> {
        if gs.is_empty() {
            return Err(CommitmentError::EmptyKey);
        }
        Ok(VecCommitmentKey { gs, h })
    }

    /// Number of values the key commits to.
    pub fn len(&self) -> usize { self.gs.len() }

    pub fn is_empty(&self) -> bool { self.gs.is_empty() }

    pub fn bases(&self) -> &[C] { &self.gs }

    pub fn blinding_base(&self) -> C { self.h }

    /// Commit to the values with fresh randomness.
    pub fn commit<T: Rng, V: AsRef<C::Scalar>>(
        &self,
        values: &[V],
        csprng: &mut T,
    ) -> Result<(Commitment<C>, Randomness<C>), CommitmentError> {
        let r = Randomness::<C>::generate(csprng);
        let c = self.hide(values, &r)?;
        Ok((c, r))
    }

    pub fn hide<V: AsRef<C::Scalar>>(
        &self,
        values: &[V],
        r: &Randomness<C>,
    ) -> Result<Commitment<C>, CommitmentError> {
        let values: Vec<C::Scalar> = values.iter().map(|v| *v.as_ref()).collect();
        self.hide_worker(&values, r.as_ref())
    }

    pub fn hide_worker(
        &self,
        values: &[C::Scalar],
        randomness: &C::Scalar,
    ) -> Result<Commitment<C>, CommitmentError> {
        if values.len() != self.gs.len() {
            return Err(CommitmentError::LengthMismatch {
                expected: self.gs.len(),
                actual:   values.len(),
            });
        }
        let mut bases = Vec::with_capacity(self.gs.len() + 1);
        let mut exps = Vec::with_capacity(self.gs.len() + 1);
        bases.extend_from_slice(&self.gs);
        bases.push(self.h);
        exps.extend_from_slice(values);
        exps.push(*randomness);
        Ok(Commitment(multiexp(&bases, &exps)))
    }

    /// Check an opening. Fails only on a length mismatch; a wrong opening
    /// gives `Ok(false)`.
    pub fn open<V: AsRef<C::Scalar>>(
        &self,
        values: &[V],
        r: &Randomness<C>,
        c: &Commitment<C>,
    ) -> Result<bool, CommitmentError> {
        Ok(self.hide(values, r)? == *c)
    }

    pub fn generate<T: Rng>(n: usize, csprng: &mut T) -> Result<Self, CommitmentError> {
        let gs = (0..n).map(|_| C::generate(csprng)).collect();
        Self::new(gs, C::generate(csprng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    pub fn test_vec_commit_open() {
        let mut csprng = thread_rng();
        for n in 1..10 {
            let key = VecCommitmentKey::<G1>::generate(n, &mut csprng).expect("Non-empty key.");
            let values: Vec<Value<G1>> = (0..n).map(|_| Value::generate(&mut csprng)).collect();
            let (c, r) = key.commit(&values, &mut csprng).expect("Lengths match.");
            assert_eq!(key.open(&values, &r, &c), Ok(true));
            let mut other = values.clone();
            other[n - 1] = Value::generate(&mut csprng);
            assert_eq!(key.open(&other, &r, &c), Ok(false));
            let key2 = serialize_deserialize(&key).expect("Key should deserialize.");
            assert_eq!(key, key2);
        }
    }

    #[test]
    pub fn test_length_mismatch_is_an_error() {
        let mut csprng = thread_rng();
        let key = VecCommitmentKey::<G1>::generate(3, &mut csprng).expect("Non-empty key.");
        let values: Vec<Value<G1>> = (0..2).map(|_| Value::generate(&mut csprng)).collect();
        assert_eq!(
            key.commit(&values, &mut csprng).map(|_| ()),
            Err(CommitmentError::LengthMismatch {
                expected: 3,
                actual:   2,
            })
        );
        assert_eq!(
            VecCommitmentKey::<G1>::generate(0, &mut csprng),
            Err(CommitmentError::EmptyKey)
        );
    }

    #[test]
    pub fn test_single_base_agrees_with_commitment_key() {
        let mut csprng = thread_rng();
        let single = super::super::CommitmentKey::<G1>::generate(&mut csprng);
        let key = VecCommitmentKey::new(vec![single.g], single.h).expect("Non-empty key.");
        let v = Value::<G1>::generate(&mut csprng);
        let r = Randomness::generate(&mut csprng);
        assert_eq!(key.hide(&[v.clone()], &r), Ok(single.hide(&v, &r)));
    }
}
