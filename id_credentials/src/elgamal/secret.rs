use super::{Cipher, Message};
use crate::{common::*, curve_arithmetic::*};
use rand::*;

/// ElGamal secret key. The scalar is cleared on drop and the key cannot be
/// cloned.
#[derive(Debug, PartialEq, Eq)]
pub struct SecretKey<C: Curve> {
    /// Generator of the group, not secret but convenient to have here.
    pub generator: C,
    pub scalar:    Secret<C::Scalar>,
}

serde_base16!([C: Curve] SecretKey<C>);

impl<C: Curve> Serial for SecretKey<C> {
    fn serial<B: Buffer>(&self, out: &mut B) {
        out.put(&self.generator);
        out.put(&self.scalar);
    }
}

impl<C: Curve> Deserial for SecretKey<C> {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let generator = source.get()?;
        let scalar = source.get()?;
        Ok(SecretKey { generator, scalar })
    }
}

impl<C: Curve> SecretKey<C> {
    pub fn decrypt(&self, c: &Cipher<C>) -> Message<C> {
        let x = c.0.mul_by_scalar(&self.scalar);
        Message {
            value: c.1.minus_point(&x),
        }
    }

    /// Generate a secret key for the given generator.
    pub fn generate<T: Rng>(generator: &C, csprng: &mut T) -> Self {
        SecretKey {
            generator: *generator,
            scalar:    Secret::new(C::generate_non_zero_scalar(csprng)),
        }
    }

    /// Generate both the generator and the secret key.
    pub fn generate_all<T: Rng>(csprng: &mut T) -> Self {
        let generator = C::generate(csprng);
        SecretKey::generate(&generator, csprng)
    }
}
