use crate::{common::*, curve_arithmetic::*};
use rand::*;

/// A message the signer only sees committed: `g^r Π Y_i^{m_i}` where the
/// `Y_i` are the signer's public bases in the first group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownMessage<P: Pairing>(pub P::G1);

impl<P: Pairing> Serial for UnknownMessage<P> {
    fn serial<B: Buffer>(&self, out: &mut B) { out.put(&self.0) }
}

impl<P: Pairing> Deserial for UnknownMessage<P> {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        Ok(UnknownMessage(source.get()?))
    }
}

impl<P: Pairing> UnknownMessage<P> {
    /// Add signed values known to the signer to the hidden part. The values
    /// go under the bases starting at `offset`.
    pub fn extend_with_known(
        &self,
        ys: &[P::G1],
        offset: usize,
        known: &[P::ScalarField],
    ) -> Option<UnknownMessage<P>> {
        if offset.checked_add(known.len())? > ys.len() {
            return None;
        }
        let extra = multiexp(&ys[offset..offset + known.len()], known);
        Some(UnknownMessage(self.0.plus_point(&extra)))
    }

    pub fn generate<T: Rng>(csprng: &mut T) -> UnknownMessage<P> {
        UnknownMessage(P::G1::generate(csprng))
    }
}
