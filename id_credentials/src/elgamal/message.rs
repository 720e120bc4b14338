use crate::{common::*, curve_arithmetic::Curve};
use rand::*;

/// Message to be encrypted, a group element.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[repr(transparent)]
pub struct Message<C: Curve> {
    pub value: C,
}

impl<C: Curve> Serial for Message<C> {
    fn serial<B: Buffer>(&self, out: &mut B) { out.put(&self.value) }
}

impl<C: Curve> Deserial for Message<C> {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        Ok(Message {
            value: source.get()?,
        })
    }
}

impl<C: Curve> Message<C> {
    pub fn new(value: C) -> Self { Message { value } }

    pub fn generate<T: Rng>(csprng: &mut T) -> Self {
        Message {
            value: C::generate(csprng),
        }
    }
}
