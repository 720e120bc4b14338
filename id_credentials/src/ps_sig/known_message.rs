use crate::{common::*, curve_arithmetic::*};
use rand::*;

/// A message in the clear: a vector of scalars.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownMessage<P: Pairing>(pub Vec<P::ScalarField>);

impl<P: Pairing> Serial for KnownMessage<P> {
    fn serial<B: Buffer>(&self, out: &mut B) {
        out.put(&(self.0.len() as u32));
        serial_vector_no_length(&self.0, out)
    }
}

impl<P: Pairing> Deserial for KnownMessage<P> {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let len: u32 = source.get()?;
        Ok(KnownMessage(deserial_vector_no_length(source, len as usize)?))
    }
}

impl<P: Pairing> KnownMessage<P> {
    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn generate<T: Rng>(n: usize, csprng: &mut T) -> KnownMessage<P> {
        KnownMessage((0..n).map(|_| P::generate_scalar(csprng)).collect())
    }
}
