//! Randomness used in commitments. Secret by default.

use crate::{common::*, curve_arithmetic::*};
use rand::*;
use std::{ops::Deref, rc::Rc};

/// Randomness used in the commitment.
#[repr(transparent)]
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Randomness<C: Curve> {
    pub randomness: Rc<Secret<C::Scalar>>,
}

/// This trait allows automatic conversion of &Randomness<C> to &C::Scalar.
impl<C: Curve> Deref for Randomness<C> {
    type Target = C::Scalar;

    fn deref(&self) -> &C::Scalar { &self.randomness }
}

impl<C: Curve> AsRef<C::Scalar> for Randomness<C> {
    fn as_ref(&self) -> &C::Scalar { &self.randomness }
}

impl<C: Curve> Serial for Randomness<C> {
    fn serial<B: Buffer>(&self, out: &mut B) { out.put(&self.randomness) }
}

impl<C: Curve> Deserial for Randomness<C> {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        Ok(Randomness {
            randomness: source.get()?,
        })
    }
}

impl<C: Curve> Randomness<C> {
    pub fn new(x: C::Scalar) -> Self {
        Randomness {
            randomness: Rc::new(Secret::new(x)),
        }
    }

    /// Share the secret with a [Value], without copying it.
    pub fn as_value(&self) -> Value<C> {
        Value {
            value: self.randomness.clone(),
        }
    }

    pub fn from_value(x: &Value<C>) -> Self {
        Self {
            randomness: x.value.clone(),
        }
    }

    /// Zero randomness.
    #[inline]
    pub fn zero() -> Self { Randomness::new(C::Scalar::zero()) }

    /// Sum of two randomness values, as used when commitments are combined.
    pub fn add(&self, other: &Randomness<C>) -> Randomness<C> {
        let mut r = *self.as_ref();
        r.add_assign(other);
        Randomness::new(r)
    }

    /// Generate a scalar as randomness.
    pub fn generate<T: Rng>(csprng: &mut T) -> Randomness<C> {
        Randomness::new(C::generate_scalar(csprng))
    }

    /// Generate a non-zero scalar as randomness.
    pub fn generate_non_zero<T: Rng>(csprng: &mut T) -> Randomness<C> {
        Randomness::new(C::generate_non_zero_scalar(csprng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    pub fn test_randomness_serialization() {
        let mut csprng = thread_rng();
        for _ in 0..20 {
            let r = Randomness::<G1>::generate(&mut csprng);
            let r2 = serialize_deserialize(&r).expect("Randomness should deserialize.");
            assert_eq!(r, r2);
        }
    }
}
