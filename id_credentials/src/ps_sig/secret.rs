use super::{BlindedSignature, KnownMessage, Signature, SignatureError, UnknownMessage};
use crate::{common::*, curve_arithmetic::*};
use rand::*;

/// A PS secret key `(x, y_1, ..., y_n)` together with the generators it is
/// used with. The exponents are cleared when the key is dropped.
#[derive(Debug)]
pub struct SecretKey<P: Pairing> {
    /// Generator of the first group.
    pub g:       P::G1,
    /// Generator of the second group.
    pub g_tilda: P::G2,
    pub ys:      Vec<Secret<P::ScalarField>>,
    pub x:       Secret<P::ScalarField>,
}

serde_base16!([P: Pairing] SecretKey<P>);

impl<P: Pairing> Serial for SecretKey<P> {
    fn serial<B: Buffer>(&self, out: &mut B) {
        out.put(&self.g);
        out.put(&self.g_tilda);
        out.put(&(self.ys.len() as u32));
        serial_vector_no_length(&self.ys, out);
        out.put(&self.x);
    }
}

impl<P: Pairing> Deserial for SecretKey<P> {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let g = source.get()?;
        let g_tilda = source.get()?;
        let len: u32 = source.get()?;
        let ys = deserial_vector_no_length(source, len as usize)?;
        let x = source.get()?;
        Ok(SecretKey {
            g,
            g_tilda,
            ys,
            x,
        })
    }
}

impl<P: Pairing> SecretKey<P> {
    /// Number of message components this key can sign.
    pub fn len(&self) -> usize { self.ys.len() }

    pub fn is_empty(&self) -> bool { self.ys.is_empty() }

    pub fn sign_known_message<T: Rng>(
        &self,
        message: &KnownMessage<P>,
        csprng: &mut T,
    ) -> Result<Signature<P>, SignatureError> {
        if message.len() > self.ys.len() {
            return Err(SignatureError::KeyMessageLengthMismatch {
                key:     self.ys.len(),
                message: message.len(),
            });
        }
        // x + Σ y_i m_i
        let mut exponent = *self.x;
        for (y, m) in self.ys.iter().zip(message.0.iter()) {
            let mut ym = **y;
            ym.mul_assign(m);
            exponent.add_assign(&ym);
        }
        let u = P::generate_non_zero_scalar(csprng);
        let a = self.g.mul_by_scalar(&u);
        let b = a.mul_by_scalar(&exponent);
        Ok(Signature(a, b))
    }

    /// Sign a committed message. The result has to be unmasked by the owner
    /// of the commitment randomness.
    pub fn sign_unknown_message<T: Rng>(
        &self,
        message: &UnknownMessage<P>,
        csprng: &mut T,
    ) -> BlindedSignature<P> {
        let u = P::generate_non_zero_scalar(csprng);
        let a = self.g.mul_by_scalar(&u);
        let xmu = self.g.mul_by_scalar(&self.x).plus_point(&message.0);
        let b = xmu.mul_by_scalar(&u);
        BlindedSignature {
            sig: Signature(a, b),
        }
    }

    pub fn generate<T: Rng>(n: usize, csprng: &mut T) -> SecretKey<P> {
        let ys = (0..n)
            .map(|_| Secret::new(P::generate_non_zero_scalar(csprng)))
            .collect();
        SecretKey {
            g: P::G1::one_point(),
            g_tilda: P::G2::one_point(),
            ys,
            x: Secret::new(P::generate_non_zero_scalar(csprng)),
        }
    }
}
