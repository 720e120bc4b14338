use crate::{common::*, curve_arithmetic::*};
use rand::*;
use std::{ops::Deref, rc::Rc};

/// An ElGamal ciphertext `(g^R, h^v · pk^R)`. On chain these are the
/// encrypted shares of IdCredPub, one per anonymity revoker.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct Cipher<C: Curve>(pub C, pub C);

serde_base16!([C: Curve] Cipher<C>);

impl<C: Curve> Serial for Cipher<C> {
    fn serial<B: Buffer>(&self, out: &mut B) {
        out.put(&self.0);
        out.put(&self.1);
    }
}

impl<C: Curve> Deserial for Cipher<C> {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let ephemeral = source.get()?;
        let masked = source.get()?;
        Ok(Cipher(ephemeral, masked))
    }
}

#[cfg(test)]
impl<C: Curve> Cipher<C> {
    /// A pair of random points. Decrypts to garbage under any key.
    pub fn generate<T: Rng>(csprng: &mut T) -> Self {
        Cipher(C::generate(csprng), C::generate(csprng))
    }
}

/// The encryption exponent `R`. The prover needs it to show that a cipher
/// and a commitment hide the same share.
#[derive(Debug, PartialEq, Eq, Clone)]
#[repr(transparent)]
pub struct Randomness<C: Curve> {
    pub randomness: Rc<Secret<C::Scalar>>,
}

impl<C: Curve> AsRef<C::Scalar> for Randomness<C> {
    fn as_ref(&self) -> &C::Scalar { &self.randomness }
}

impl<C: Curve> Deref for Randomness<C> {
    type Target = C::Scalar;

    fn deref(&self) -> &C::Scalar { &self.randomness }
}

impl<C: Curve> Randomness<C> {
    pub fn new(v: C::Scalar) -> Self {
        Randomness {
            randomness: Rc::new(Secret::new(v)),
        }
    }

    /// Never zero, so that `g^R` is never the identity.
    pub fn generate<T: Rng>(csprng: &mut T) -> Self {
        Randomness::new(C::generate_non_zero_scalar(csprng))
    }
}
