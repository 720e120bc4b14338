//! The transcript used to make the sigma protocols non-interactive via the
//! Fiat-Shamir transformation.
//!
//! A transcript is started with a domain separation string naming the proof
//! it is used for. Public input and every prover message is then appended
//! under a label, and the challenge is extracted from the state. Prover and
//! verifier must append exactly the same data in the same order, otherwise
//! the challenges differ and verification fails.
//!
//! Labels are fixed strings and are not length prefixed. Messages are written
//! with their [`Serial`] instance, so variable length data must carry its own
//! length in that encoding.

use crate::{common::*, curve_arithmetic::Curve};
use sha3::{Digest, Sha3_256};
use std::io::Write;

/// State of the transcript, a running SHA3-256 hash.
#[repr(transparent)]
#[derive(Debug)]
pub struct RandomOracle(Sha3_256);

/// Type of challenges computed from the random oracle.
/// We use 32 byte output of SHA3-256
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Challenge {
    challenge: [u8; 32],
}

impl AsRef<[u8]> for Challenge {
    fn as_ref(&self) -> &[u8] { &self.challenge }
}

impl Serial for Challenge {
    fn serial<B: Buffer>(&self, out: &mut B) { out.put(&self.challenge) }
}

impl Deserial for Challenge {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        Ok(Challenge {
            challenge: source.get()?,
        })
    }
}

/// This implementation allows the use of a random oracle without intermediate
/// allocations of byte buffers.
impl Write for RandomOracle {
    #[inline(always)]
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.update(buf);
        Ok(buf.len())
    }

    #[inline(always)]
    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        self.0.update(buf);
        Ok(())
    }

    #[inline(always)]
    fn flush(&mut self) -> std::io::Result<()> { Ok(()) }
}

impl Buffer for RandomOracle {
    type Result = sha3::digest::Output<Sha3_256>;

    #[inline(always)]
    fn start() -> Self { RandomOracle::empty() }

    fn result(self) -> Self::Result { self.0.finalize() }
}

impl Eq for RandomOracle {}

impl PartialEq for RandomOracle {
    fn eq(&self, other: &Self) -> bool { self.0.clone().finalize() == other.0.clone().finalize() }
}

impl RandomOracle {
    /// Start with the initial empty state of the oracle.
    pub fn empty() -> Self { RandomOracle(Sha3_256::new()) }

    /// Start with the initial domain string.
    pub fn domain<B: AsRef<[u8]>>(data: B) -> Self {
        RandomOracle(Sha3_256::new().chain_update(data))
    }

    /// Duplicate the random oracle, creating a fresh copy of it.
    /// Further updates are independent.
    pub fn split(&self) -> Self { RandomOracle(self.0.clone()) }

    pub fn add_bytes<B: AsRef<[u8]>>(&mut self, data: B) { self.0.update(data) }

    /// Append the label and then the serialization of the message.
    pub fn append_message<S: Serial, B: AsRef<[u8]>>(&mut self, label: B, message: &S) {
        self.add_bytes(label);
        self.put(message)
    }

    /// Append all items from an iterator to the random oracle, preceded by the
    /// label and the number of items.
    pub fn extend_from<'a, I, S, B: AsRef<[u8]>>(&mut self, label: B, iter: I)
    where
        S: Serial + 'a,
        I: IntoIterator<Item = &'a S>,
        I::IntoIter: ExactSizeIterator, {
        self.add_bytes(label);
        let iter = iter.into_iter();
        self.put(&(iter.len() as u64));
        for i in iter {
            self.put(i)
        }
    }

    /// Interpret the output of the random oracle as a big-endian integer and
    /// reduce it modulo the field order.
    pub fn result_to_scalar<C: Curve>(self) -> C::Scalar { C::scalar_from_bytes(self.result()) }

    /// Get a challenge from the current state, consuming the state.
    pub fn get_challenge(self) -> Challenge {
        Challenge {
            challenge: self.result().into(),
        }
    }

    /// Get a challenge in the form of a Scalar, using `label` as domain
    /// separation. The state itself is only extended with the label.
    pub fn challenge_scalar<C: Curve, B: AsRef<[u8]>>(&mut self, label: B) -> C::Scalar {
        self.add_bytes(label);
        self.split().result_to_scalar::<C>()
    }
}
