use super::{KnownMessage, SecretKey, Signature, SignatureError};
use crate::{common::*, curve_arithmetic::*};
use anyhow::ensure;
use rand::*;

/// PS public key. With secret key `(x, y_1, ..., y_n)` the bases are
/// `Y_i = g^{y_i}`, `Ỹ_i = g̃^{y_i}` and `X̃ = g̃^x`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey<P: Pairing> {
    pub g:        P::G1,
    pub g_tilda:  P::G2,
    pub ys:       Vec<P::G1>,
    pub y_tildas: Vec<P::G2>,
    pub x_tilda:  P::G2,
}

serde_base16!([P: Pairing] PublicKey<P>);

impl<P: Pairing> Serial for PublicKey<P> {
    fn serial<B: Buffer>(&self, out: &mut B) {
        out.put(&self.g);
        out.put(&self.g_tilda);
        out.put(&(self.ys.len() as u32));
        serial_vector_no_length(&self.ys, out);
        out.put(&(self.y_tildas.len() as u32));
        serial_vector_no_length(&self.y_tildas, out);
        out.put(&self.x_tilda);
    }
}

impl<P: Pairing> Deserial for PublicKey<P> {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let g = source.get()?;
        let g_tilda = source.get()?;
        let len: u32 = source.get()?;
        let ys = deserial_vector_no_length(source, len as usize)?;
        let len_tilda: u32 = source.get()?;
        ensure!(len == len_tilda, "Both halves of the key must have the same number of bases.");
        let y_tildas = deserial_vector_no_length(source, len_tilda as usize)?;
        let x_tilda = source.get()?;
        Ok(PublicKey {
            g,
            g_tilda,
            ys,
            y_tildas,
            x_tilda,
        })
    }
}

#[allow(clippy::len_without_is_empty)]
impl<P: Pairing> PublicKey<P> {
    /// Number of message components that can be signed with this key.
    pub fn len(&self) -> usize { self.ys.len() }

    /// Check the signature against the message. The identity signature is
    /// rejected without evaluating the pairing, since it satisfies the
    /// verification equation for every message.
    pub fn check(&self, sig: &Signature<P>, message: &KnownMessage<P>) -> Result<bool, SignatureError> {
        if sig.0.is_zero_point() {
            return Err(SignatureError::TrivialSignature);
        }
        if message.len() > self.y_tildas.len() {
            return Err(SignatureError::KeyMessageLengthMismatch {
                key:     self.y_tildas.len(),
                message: message.len(),
            });
        }
        let mut bases = Vec::with_capacity(message.len() + 1);
        let mut exps = Vec::with_capacity(message.len() + 1);
        bases.extend_from_slice(&self.y_tildas[..message.len()]);
        exps.extend_from_slice(&message.0);
        bases.push(self.x_tilda);
        exps.push(P::ScalarField::one());
        let hx = multiexp(&bases, &exps);
        Ok(P::check_pairing_eq(&sig.0, &hx, &sig.1, &self.g_tilda))
    }

    pub fn verify(&self, sig: &Signature<P>, message: &KnownMessage<P>) -> bool {
        matches!(self.check(sig, message), Ok(true))
    }

    /// Random public key with `n` bases, without a matching secret key.
    pub fn arbitrary<T: Rng>(n: usize, csprng: &mut T) -> PublicKey<P> {
        PublicKey {
            g:        P::G1::one_point(),
            g_tilda:  P::G2::one_point(),
            ys:       (0..n).map(|_| P::G1::generate(csprng)).collect(),
            y_tildas: (0..n).map(|_| P::G2::generate(csprng)).collect(),
            x_tilda:  P::G2::generate(csprng),
        }
    }
}

impl<P: Pairing> From<&SecretKey<P>> for PublicKey<P> {
    fn from(sk: &SecretKey<P>) -> PublicKey<P> {
        let ys = sk.ys.iter().map(|y| sk.g.mul_by_scalar(y)).collect();
        let y_tildas = sk.ys.iter().map(|y| sk.g_tilda.mul_by_scalar(y)).collect();
        let x_tilda = sk.g_tilda.mul_by_scalar(&sk.x);
        PublicKey {
            g: sk.g,
            g_tilda: sk.g_tilda,
            ys,
            y_tildas,
            x_tilda,
        }
    }
}
