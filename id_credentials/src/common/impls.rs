//! Binary serialization of foreign types: the ed25519 keys and signatures in
//! account credentials, and the shared pointers that hold secret scalars.
use super::serialize::*;
use byteorder::ReadBytesExt;
use ed25519_dalek::{Signature, VerifyingKey, PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH};
use std::rc::Rc;

/// An account key is its 32 byte compressed point. Decoding fails for bytes
/// that do not decompress.
impl Serial for VerifyingKey {
    fn serial<B: Buffer>(&self, out: &mut B) { out.put(self.as_bytes()) }
}

impl Deserial for VerifyingKey {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let bytes: [u8; PUBLIC_KEY_LENGTH] = source.get()?;
        Ok(VerifyingKey::from_bytes(&bytes)?)
    }
}

/// Signatures are the 64 bytes `R ‖ s`. Whether `s` is canonical is checked
/// on verification, not here.
impl Serial for Signature {
    fn serial<B: Buffer>(&self, out: &mut B) { out.put(&self.to_bytes()) }
}

impl Deserial for Signature {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let bytes: [u8; SIGNATURE_LENGTH] = source.get()?;
        Ok(Signature::from_bytes(&bytes))
    }
}

/// Serialized as the pointee. Deserializing gives a fresh, unshared pointer.
impl<T: Serial> Serial for Rc<T> {
    fn serial<B: Buffer>(&self, out: &mut B) { out.put(self.as_ref()) }
}

impl<T: Deserial> Deserial for Rc<T> {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> { Ok(Rc::new(source.get()?)) }
}
