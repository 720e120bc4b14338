use crate::{common::*, curve_arithmetic::*};
use rand::*;

/// A PS signature `(a, b)` with `b = a^{x + Σ y_i m_i}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature<P: Pairing>(pub P::G1, pub P::G1);

serde_base16!([P: Pairing] Signature<P>);

impl<P: Pairing> Serial for Signature<P> {
    fn serial<B: Buffer>(&self, out: &mut B) {
        out.put(&self.0);
        out.put(&self.1);
    }
}

impl<P: Pairing> Deserial for Signature<P> {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let a = source.get()?;
        let b = source.get()?;
        Ok(Signature(a, b))
    }
}

/// A signature on a committed message, as returned by the signer. It still
/// carries the commitment randomness `r` in `b = (g^x M)^u` and must be
/// unmasked with [BlindedSignature::retrieve] before it verifies.
pub type SigRetrievalRandomness<P> = Value<<P as Pairing>::G1>;

/// Randomness used to blind a signature: `r` rerandomizes both components,
/// and `r'` multiplies in `a^{r'}` so that `b` no longer satisfies the
/// verification equation on its own.
pub struct BlindingRandomness<P: Pairing>(
    pub Secret<P::ScalarField>,
    pub Secret<P::ScalarField>,
);

/// A signature that is only useful together with a proof of knowledge of the
/// blinding randomness and the signed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlindedSignature<P: Pairing> {
    pub sig: Signature<P>,
}

impl<P: Pairing> Serial for BlindedSignature<P> {
    fn serial<B: Buffer>(&self, out: &mut B) { out.put(&self.sig) }
}

impl<P: Pairing> Deserial for BlindedSignature<P> {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        Ok(BlindedSignature { sig: source.get()? })
    }
}

impl<P: Pairing> BlindedSignature<P> {
    /// Remove the commitment mask from a signature on an unknown message.
    pub fn retrieve(&self, r: &SigRetrievalRandomness<P>) -> Signature<P> {
        let Signature(a, b) = self.sig;
        Signature(a, b.minus_point(&a.mul_by_scalar(r)))
    }
}

impl<P: Pairing> Signature<P> {
    /// Blind the signature, returning the randomness so that knowledge of it
    /// can be proven. `a_hat = a^r`, `b_hat = (b a^{r'})^r`.
    pub fn blind<T: Rng>(&self, csprng: &mut T) -> (BlindedSignature<P>, BlindingRandomness<P>) {
        let r = P::generate_non_zero_scalar(csprng);
        let r_prime = P::generate_non_zero_scalar(csprng);
        let Signature(a, b) = *self;
        let a_hat = a.mul_by_scalar(&r);
        let b_hat = b.plus_point(&a.mul_by_scalar(&r_prime)).mul_by_scalar(&r);
        (
            BlindedSignature {
                sig: Signature(a_hat, b_hat),
            },
            BlindingRandomness(Secret::new(r), Secret::new(r_prime)),
        )
    }

    pub fn generate<T: Rng>(csprng: &mut T) -> Signature<P> {
        Signature(P::G1::generate(csprng), P::G1::generate(csprng))
    }
}
