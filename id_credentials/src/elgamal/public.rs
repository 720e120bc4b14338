use super::{Cipher, Message, Randomness, SecretKey};
use crate::{common::*, curve_arithmetic::*};
use rand::*;

/// ElGamal public key `(g, g^x)`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct PublicKey<C: Curve> {
    pub generator: C,
    pub key:       C,
}

serde_base16!([C: Curve] PublicKey<C>);

impl<C: Curve> Serial for PublicKey<C> {
    fn serial<B: Buffer>(&self, out: &mut B) {
        out.put(&self.generator);
        out.put(&self.key);
    }
}

impl<C: Curve> Deserial for PublicKey<C> {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let generator = source.get()?;
        let key = source.get()?;
        Ok(PublicKey { generator, key })
    }
}

impl<C: Curve> From<&SecretKey<C>> for PublicKey<C> {
    fn from(secret_key: &SecretKey<C>) -> PublicKey<C> {
        let generator = secret_key.generator;
        let key = generator.mul_by_scalar(&secret_key.scalar);
        PublicKey { generator, key }
    }
}

impl<C: Curve> PublicKey<C> {
    /// Encrypt and return the randomness used. The randomness must be kept
    /// private.
    pub fn encrypt_rand<T: Rng>(&self, csprng: &mut T, m: &Message<C>) -> (Cipher<C>, Randomness<C>) {
        let k = Randomness::generate(csprng);
        (self.hide(&k, m), k)
    }

    pub fn encrypt<T: Rng>(&self, csprng: &mut T, m: &Message<C>) -> Cipher<C> {
        self.encrypt_rand(csprng, m).0
    }

    pub fn hide(&self, k: &C::Scalar, message: &Message<C>) -> Cipher<C> {
        let t = self.generator.mul_by_scalar(k);
        let s = self.key.mul_by_scalar(k).plus_point(&message.value);
        Cipher(t, s)
    }

    /// Encrypt `h^e` for the supplied base `h`, returning the randomness.
    pub fn encrypt_exponent_rand_given_generator<T: Rng>(
        &self,
        e: &Value<C>,
        h: &C,
        csprng: &mut T,
    ) -> (Cipher<C>, Randomness<C>) {
        let randomness = Randomness::generate(csprng);
        let c_1 = self.generator.mul_by_scalar(&randomness);
        let c_2 = multiexp::<C, C>(&[self.key, *h], &[*randomness, **e]);
        (Cipher(c_1, c_2), randomness)
    }

    pub fn encrypt_exponent_given_generator<T: Rng>(
        &self,
        e: &Value<C>,
        h: &C,
        csprng: &mut T,
    ) -> Cipher<C> {
        self.encrypt_exponent_rand_given_generator(e, h, csprng).0
    }
}
