//! Common framework for sigma protocols. Each protocol is described by the
//! [SigmaProtocol] trait, and [prove] and [verify] turn it into a
//! non-interactive proof via the Fiat-Shamir transformation.
//!
//! The [AndAdapter] and [ReplicateAdapter] combinators compose protocols so
//! that a whole conjunction is proved with a single challenge.
use crate::{
    common::*,
    random_oracle::{Challenge, RandomOracle},
};
use anyhow::ensure;
use rand::*;

/// A generic non-interactive sigma proof: the challenge and the response.
/// The first message is not included since the verifier recomputes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SigmaProof<W> {
    pub challenge: Challenge,
    pub response:  W,
}

impl<W: Serial> Serial for SigmaProof<W> {
    fn serial<B: Buffer>(&self, out: &mut B) {
        out.put(&self.challenge);
        out.put(&self.response);
    }
}

impl<W: Deserial> Deserial for SigmaProof<W> {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let challenge = source.get()?;
        let response = source.get()?;
        Ok(SigmaProof {
            challenge,
            response,
        })
    }
}

/// An abstraction of a sigma protocol.
///
/// The prover computes a first message from some randomness (the prover
/// state), receives a challenge, and answers it using the secret and the
/// state. The verifier can reconstruct the first message from the challenge
/// and the response, and the proof is valid if hashing that message yields
/// the same challenge.
pub trait SigmaProtocol: Sized {
    /// Prover's first message.
    type CommitMessage: Serial;
    /// The challenge in the form the protocol uses it, usually a scalar.
    type ProtocolChallenge;
    /// Randomness used to compute the first message.
    type ProverState;
    /// Prover's response to the challenge.
    type Response: Serialize;
    /// Secret data the prover proves knowledge of.
    type SecretData;

    /// Add the public data of the statement to the transcript.
    fn public(&self, ro: &mut RandomOracle);

    /// Compute the protocol challenge from the transcript output.
    fn get_challenge(&self, challenge: &Challenge) -> Self::ProtocolChallenge;

    /// First message of the prover, together with the state needed to answer
    /// the challenge.
    fn compute_commit_message<R: Rng>(
        &self,
        csprng: &mut R,
    ) -> Option<(Self::CommitMessage, Self::ProverState)>;

    /// Answer the challenge. Consumes the secret and the state so that they
    /// are dropped, and hence cleared, as soon as the response exists.
    fn compute_response(
        &self,
        secret: Self::SecretData,
        state: Self::ProverState,
        challenge: &Self::ProtocolChallenge,
    ) -> Option<Self::Response>;

    /// Recompute the first message from the challenge and response. Returns
    /// `None` if the response is malformed for this statement.
    fn extract_commit_message(
        &self,
        challenge: &Self::ProtocolChallenge,
        response: &Self::Response,
    ) -> Option<Self::CommitMessage>;

    /// Generate a random valid statement with its secret and pass them to
    /// `f`. Used in tests to check completeness and soundness.
    #[cfg(test)]
    fn with_valid_data<R: Rng>(
        data_size: usize,
        csprng: &mut R,
        f: impl FnOnce(Self, Self::SecretData, &mut R),
    );
}

/// Produce a proof for the given statement. The transcript is extended with
/// the public data and the first message, so proofs composed after this one
/// are bound to it.
pub fn prove<R: Rng, D: SigmaProtocol>(
    ro: &mut RandomOracle,
    prover: &D,
    secret: D::SecretData,
    csprng: &mut R,
) -> Option<SigmaProof<D::Response>> {
    let (point, rand) = prover.compute_commit_message(csprng)?;
    prover.public(ro);
    ro.append_message(b"point", &point);
    let challenge_bytes = ro.split().get_challenge();
    let challenge = prover.get_challenge(&challenge_bytes);
    let response = prover.compute_response(secret, rand, &challenge)?;
    Some(SigmaProof {
        challenge: challenge_bytes,
        response,
    })
}

/// Verify a proof produced by [prove]. The transcript must be in the same
/// state as the prover's was, and is extended in the same way.
pub fn verify<D: SigmaProtocol>(
    ro: &mut RandomOracle,
    verifier: &D,
    proof: &SigmaProof<D::Response>,
) -> bool {
    let challenge = verifier.get_challenge(&proof.challenge);
    match verifier.extract_commit_message(&challenge, &proof.response) {
        None => false,
        Some(point) => {
            verifier.public(ro);
            ro.append_message(b"point", &point);
            let computed_challenge = ro.split().get_challenge();
            computed_challenge == proof.challenge
        }
    }
}

/// Conjunction of two protocols proven with the same challenge.
pub struct AndAdapter<P1, P2> {
    pub first:  P1,
    pub second: P2,
}

/// Response of the [AndAdapter]: the two responses in sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AndResponse<R1, R2> {
    pub r1: R1,
    pub r2: R2,
}

impl<R1: Serial, R2: Serial> Serial for AndResponse<R1, R2> {
    fn serial<B: Buffer>(&self, out: &mut B) {
        out.put(&self.r1);
        out.put(&self.r2);
    }
}

impl<R1: Deserial, R2: Deserial> Deserial for AndResponse<R1, R2> {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let r1 = source.get()?;
        let r2 = source.get()?;
        Ok(AndResponse { r1, r2 })
    }
}

impl<P1: SigmaProtocol, P2: SigmaProtocol<ProtocolChallenge = P1::ProtocolChallenge>> SigmaProtocol
    for AndAdapter<P1, P2>
{
    type CommitMessage = (P1::CommitMessage, P2::CommitMessage);
    type ProtocolChallenge = P1::ProtocolChallenge;
    type ProverState = (P1::ProverState, P2::ProverState);
    type Response = AndResponse<P1::Response, P2::Response>;
    type SecretData = (P1::SecretData, P2::SecretData);

    fn public(&self, ro: &mut RandomOracle) {
        self.first.public(ro);
        self.second.public(ro)
    }

    fn get_challenge(&self, challenge: &Challenge) -> Self::ProtocolChallenge {
        self.first.get_challenge(challenge)
    }

    fn compute_commit_message<R: Rng>(
        &self,
        csprng: &mut R,
    ) -> Option<(Self::CommitMessage, Self::ProverState)> {
        let (m1, s1) = self.first.compute_commit_message(csprng)?;
        let (m2, s2) = self.second.compute_commit_message(csprng)?;
        Some(((m1, m2), (s1, s2)))
    }

    fn compute_response(
        &self,
        secret: Self::SecretData,
        state: Self::ProverState,
        challenge: &Self::ProtocolChallenge,
    ) -> Option<Self::Response> {
        let r1 = self.first.compute_response(secret.0, state.0, challenge)?;
        let r2 = self.second.compute_response(secret.1, state.1, challenge)?;
        Some(AndResponse { r1, r2 })
    }

    fn extract_commit_message(
        &self,
        challenge: &Self::ProtocolChallenge,
        response: &Self::Response,
    ) -> Option<Self::CommitMessage> {
        let m1 = self.first.extract_commit_message(challenge, &response.r1)?;
        let m2 = self.second.extract_commit_message(challenge, &response.r2)?;
        Some((m1, m2))
    }

    #[cfg(test)]
    fn with_valid_data<R: Rng>(
        data_size: usize,
        csprng: &mut R,
        f: impl FnOnce(Self, Self::SecretData, &mut R),
    ) {
        P1::with_valid_data(data_size, csprng, |first, secret1, csprng| {
            P2::with_valid_data(data_size, csprng, |second, secret2, csprng| {
                f(AndAdapter { first, second }, (secret1, secret2), csprng)
            })
        })
    }
}

/// Conjunction of a non-empty list of statements of the same protocol, proven
/// with the same challenge.
pub struct ReplicateAdapter<P> {
    protocols: Vec<P>,
}

impl<P> ReplicateAdapter<P> {
    /// Returns `None` if the list is empty.
    pub fn new(protocols: Vec<P>) -> Option<Self> {
        if protocols.is_empty() {
            None
        } else {
            Some(ReplicateAdapter { protocols })
        }
    }

    pub fn protocols(&self) -> &[P] { &self.protocols }
}

/// Response of the [ReplicateAdapter], one response per statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicateResponse<R> {
    pub responses: Vec<R>,
}

impl<R: Serial> Serial for ReplicateResponse<R> {
    fn serial<B: Buffer>(&self, out: &mut B) {
        out.put(&(self.responses.len() as u32));
        serial_vector_no_length(&self.responses, out)
    }
}

impl<R: Deserial> Deserial for ReplicateResponse<R> {
    fn deserial<X: ReadBytesExt>(source: &mut X) -> ParseResult<Self> {
        let len: u32 = source.get()?;
        ensure!(len > 0, "A replicated response needs at least one entry.");
        let responses = deserial_vector_no_length(source, len as usize)?;
        Ok(ReplicateResponse { responses })
    }
}

impl<P: SigmaProtocol> SigmaProtocol for ReplicateAdapter<P> {
    type CommitMessage = Vec<P::CommitMessage>;
    type ProtocolChallenge = P::ProtocolChallenge;
    type ProverState = Vec<P::ProverState>;
    type Response = ReplicateResponse<P::Response>;
    type SecretData = Vec<P::SecretData>;

    fn public(&self, ro: &mut RandomOracle) {
        ro.append_message(b"replicate", &(self.protocols.len() as u64));
        self.protocols.iter().for_each(|p| p.public(ro))
    }

    fn get_challenge(&self, challenge: &Challenge) -> Self::ProtocolChallenge {
        // Non-empty by construction.
        self.protocols[0].get_challenge(challenge)
    }

    fn compute_commit_message<R: Rng>(
        &self,
        csprng: &mut R,
    ) -> Option<(Self::CommitMessage, Self::ProverState)> {
        let mut messages = Vec::with_capacity(self.protocols.len());
        let mut states = Vec::with_capacity(self.protocols.len());
        for p in self.protocols.iter() {
            let (m, s) = p.compute_commit_message(csprng)?;
            messages.push(m);
            states.push(s);
        }
        Some((messages, states))
    }

    fn compute_response(
        &self,
        secret: Self::SecretData,
        state: Self::ProverState,
        challenge: &Self::ProtocolChallenge,
    ) -> Option<Self::Response> {
        if secret.len() != self.protocols.len() || state.len() != self.protocols.len() {
            return None;
        }
        let mut responses = Vec::with_capacity(self.protocols.len());
        for ((p, sec), st) in self.protocols.iter().zip(secret).zip(state) {
            responses.push(p.compute_response(sec, st, challenge)?);
        }
        Some(ReplicateResponse { responses })
    }

    fn extract_commit_message(
        &self,
        challenge: &Self::ProtocolChallenge,
        response: &Self::Response,
    ) -> Option<Self::CommitMessage> {
        if response.responses.len() != self.protocols.len() {
            return None;
        }
        self.protocols
            .iter()
            .zip(response.responses.iter())
            .map(|(p, r)| p.extract_commit_message(challenge, r))
            .collect()
    }

    #[cfg(test)]
    fn with_valid_data<R: Rng>(
        data_size: usize,
        csprng: &mut R,
        f: impl FnOnce(Self, Self::SecretData, &mut R),
    ) {
        let n = std::cmp::max(1, data_size % 8);
        let mut protocols = Vec::with_capacity(n);
        let mut secrets = Vec::with_capacity(n);
        for _ in 0..n {
            P::with_valid_data(data_size, csprng, |p, s, _| {
                protocols.push(p);
                secrets.push(s);
            });
        }
        f(ReplicateAdapter { protocols }, secrets, csprng)
    }
}

/// Random prefix for the transcript, so that tests do not all start from the
/// same state.
#[cfg(test)]
pub fn generate_challenge_prefix<R: rand::Rng>(csprng: &mut R) -> Vec<u8> {
    let l = csprng.gen_range(0..1000);
    let mut challenge_prefix = vec![0; l];
    for v in challenge_prefix.iter_mut() {
        *v = csprng.gen();
    }
    challenge_prefix
}
