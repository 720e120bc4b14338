//! Proof of knowledge of a PS signature. The prover reveals a blinded version
//! of the signature and, for each signed message, either reveals it or proves
//! that it equals the value in a Pedersen commitment. This is how a
//! credential discloses the attributes in its policy and keeps the rest
//! hidden.
use super::common::*;
use crate::{
    common::*,
    curve_arithmetic::*,
    pedersen_commitment::{Commitment, CommitmentKey, Randomness},
    ps_sig::{BlindedSignature, BlindingRandomness, PublicKey as PsSigPublicKey},
    random_oracle::{Challenge, RandomOracle},
};
use anyhow::bail;
use itertools::izip;
use rand::*;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response<P: Pairing, C: Curve<Scalar = P::ScalarField>> {
    /// Response for the blinding randomness `r'`.
    r_prime: P::ScalarField,
    /// Responses `(m_i, R_i)` for the hidden messages and the randomness of
    /// their commitments, in message order.
    ms_rs:   Vec<(P::ScalarField, C::Scalar)>,
}

impl<P: Pairing, C: Curve<Scalar = P::ScalarField>> Serial for Response<P, C> {
    fn serial<B: Buffer>(&self, out: &mut B) {
        out.put(&self.r_prime);
        out.put(&(self.ms_rs.len() as u32));
        serial_vector_no_length(&self.ms_rs, out)
    }
}

impl<P: Pairing, C: Curve<Scalar = P::ScalarField>> Deserial for Response<P, C> {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let r_prime = source.get()?;
        let len: u32 = source.get()?;
        let ms_rs = deserial_vector_no_length(source, len as usize)?;
        Ok(Response { r_prime, ms_rs })
    }
}

/// How a signed message is treated by the proof.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MessageHandling<C: Curve> {
    /// The message is hidden and proven equal to the committed value.
    EqualToCommitment(Commitment<C>),
    /// The message is public.
    Revealed(C::Scalar),
}

impl<C: Curve> Serial for MessageHandling<C> {
    fn serial<B: Buffer>(&self, out: &mut B) {
        match self {
            MessageHandling::EqualToCommitment(cmm) => {
                out.put(&0u8);
                out.put(cmm);
            }
            MessageHandling::Revealed(value) => {
                out.put(&1u8);
                out.put(value);
            }
        }
    }
}

impl<C: Curve> Deserial for MessageHandling<C> {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        match source.get()? {
            0u8 => Ok(MessageHandling::EqualToCommitment(source.get()?)),
            1u8 => Ok(MessageHandling::Revealed(source.get()?)),
            tag => bail!("Unknown message handling tag {}.", tag),
        }
    }
}

/// The prover's knowledge for each message.
pub enum MessageSecret<C: Curve> {
    /// The message and the randomness of its commitment.
    EqualToCommitment(Value<C>, Randomness<C>),
    Revealed,
}

pub struct ComEqSig<P: Pairing, C: Curve<Scalar = P::ScalarField>> {
    pub blinded_sig:   BlindedSignature<P>,
    /// One entry per signed message, in order. May be shorter than the key,
    /// in which case the remaining messages must be zero.
    pub msgs_handling: Vec<MessageHandling<C>>,
    pub ps_pub_key:    PsSigPublicKey<P>,
    pub comm_key:      CommitmentKey<C>,
}

pub struct ComEqSigSecret<P: Pairing, C: Curve<Scalar = P::ScalarField>> {
    pub blind_rand:  BlindingRandomness<P>,
    pub msgs_secret: Vec<MessageSecret<C>>,
}

pub struct ComEqSigState<P: Pairing, C: Curve<Scalar = P::ScalarField>> {
    r_prime: P::ScalarField,
    ms_rs:   Vec<(Value<C>, Randomness<C>)>,
}

impl<P: Pairing, C: Curve<Scalar = P::ScalarField>> ComEqSig<P, C> {
    fn committed(&self) -> impl Iterator<Item = (usize, &Commitment<C>)> {
        self.msgs_handling
            .iter()
            .enumerate()
            .filter_map(|(i, msg)| match msg {
                MessageHandling::EqualToCommitment(c) => Some((i, c)),
                MessageHandling::Revealed(_) => None,
            })
    }
}

impl<P: Pairing, C: Curve<Scalar = P::ScalarField>> SigmaProtocol for ComEqSig<P, C> {
    type CommitMessage = (P::TargetField, Vec<Commitment<C>>);
    type ProtocolChallenge = C::Scalar;
    type ProverState = ComEqSigState<P, C>;
    type Response = Response<P, C>;
    type SecretData = ComEqSigSecret<P, C>;

    fn public(&self, ro: &mut RandomOracle) {
        ro.append_message(b"blinded_sig", &self.blinded_sig);
        ro.extend_from(b"messages", self.msgs_handling.iter());
        ro.append_message(b"ps_pub_key", &self.ps_pub_key);
        ro.append_message(b"comm_key", &self.comm_key)
    }

    fn get_challenge(&self, challenge: &Challenge) -> Self::ProtocolChallenge {
        C::scalar_from_bytes(challenge)
    }

    fn compute_commit_message<R: Rng>(
        &self,
        csprng: &mut R,
    ) -> Option<(Self::CommitMessage, Self::ProverState)> {
        if self.msgs_handling.len() > self.ps_pub_key.len() {
            return None;
        }
        let a_hat = self.blinded_sig.sig.0;
        let r_prime = P::generate_non_zero_scalar(csprng);
        // Pairing is bilinear, so the G2 points are summed first and paired
        // with a_hat once.
        let mut v_2_curve = self.ps_pub_key.g_tilda.mul_by_scalar(&r_prime);
        let mut cmms = Vec::new();
        let mut ms_rs = Vec::new();
        for (i, _) in self.committed() {
            let m_i = Value::generate_non_zero(csprng);
            let (c_i, r_i) = self.comm_key.commit(&m_i, csprng);
            v_2_curve = v_2_curve.plus_point(&self.ps_pub_key.y_tildas[i].mul_by_scalar(&m_i));
            cmms.push(c_i);
            ms_rs.push((m_i, r_i));
        }
        let v_2 = P::pair(&a_hat, &v_2_curve);
        Some(((v_2, cmms), ComEqSigState { r_prime, ms_rs }))
    }

    fn compute_response(
        &self,
        secret: Self::SecretData,
        state: Self::ProverState,
        challenge: &Self::ProtocolChallenge,
    ) -> Option<Self::Response> {
        if secret.msgs_secret.len() != self.msgs_handling.len() {
            return None;
        }
        let hidden = secret
            .msgs_secret
            .iter()
            .filter_map(|msg| match msg {
                MessageSecret::EqualToCommitment(m, r) => Some((m, r)),
                MessageSecret::Revealed => None,
            })
            .collect::<Vec<_>>();
        if hidden.len() != state.ms_rs.len() {
            return None;
        }
        let mut r_prime = *challenge;
        r_prime.mul_assign(&secret.blind_rand.1);
        r_prime.negate();
        r_prime.add_assign(&state.r_prime);

        let mut ms_rs = Vec::with_capacity(hidden.len());
        for ((m, r), (m_t, r_t)) in izip!(hidden, state.ms_rs.iter()) {
            let mut res_m = *challenge;
            res_m.mul_assign(m);
            res_m.negate();
            res_m.add_assign(m_t);

            let mut res_r = *challenge;
            res_r.mul_assign(r);
            res_r.negate();
            res_r.add_assign(r_t);
            ms_rs.push((res_m, res_r));
        }
        Some(Response { r_prime, ms_rs })
    }

    fn extract_commit_message(
        &self,
        challenge: &Self::ProtocolChallenge,
        response: &Self::Response,
    ) -> Option<Self::CommitMessage> {
        if self.msgs_handling.len() > self.ps_pub_key.len() {
            return None;
        }
        if response.ms_rs.len() != self.committed().count() {
            return None;
        }
        let g_tilda = self.ps_pub_key.g_tilda;
        let a_hat = self.blinded_sig.sig.0;
        let b_hat = self.blinded_sig.sig.1;
        let mut challenge_neg = *challenge;
        challenge_neg.negate();

        let mut gs = Vec::with_capacity(self.msgs_handling.len() + 2);
        let mut es = Vec::with_capacity(self.msgs_handling.len() + 2);
        gs.push(g_tilda);
        es.push(response.r_prime);

        let mut cmms = Vec::with_capacity(response.ms_rs.len());
        for ((i, c_i), (res_m, res_r)) in izip!(self.committed(), response.ms_rs.iter()) {
            // c_i^c g^{res_m} h^{res_r}
            let c = multiexp(&[c_i.0, self.comm_key.g, self.comm_key.h], &[
                *challenge, *res_m, *res_r,
            ]);
            cmms.push(Commitment(c));
            gs.push(self.ps_pub_key.y_tildas[i]);
            es.push(*res_m);
        }
        for (i, msg) in self.msgs_handling.iter().enumerate() {
            if let MessageHandling::Revealed(m_i) = msg {
                gs.push(self.ps_pub_key.y_tildas[i]);
                let mut exp = challenge_neg;
                exp.mul_assign(m_i);
                es.push(exp);
            }
        }
        gs.push(self.ps_pub_key.x_tilda);
        es.push(challenge_neg);
        let v_2_curve = multiexp(&gs, &es);

        let v_2 = P::pairing_product(&b_hat, &g_tilda.mul_by_scalar(challenge), &a_hat, &v_2_curve);
        Some((v_2, cmms))
    }

    #[cfg(test)]
    fn with_valid_data<R: Rng>(
        data_size: usize,
        csprng: &mut R,
        f: impl FnOnce(Self, Self::SecretData, &mut R),
    ) {
        use crate::ps_sig::{SecretKey as PsSigSecretKey, SigRetrievalRandomness, UnknownMessage};
        let n = std::cmp::max(1, data_size);
        let ps_sk: PsSigSecretKey<P> = PsSigSecretKey::generate(n, csprng);
        let ps_pk = PsSigPublicKey::from(&ps_sk);
        let comm_key = CommitmentKey::generate(csprng);

        let mask = SigRetrievalRandomness::<P>::generate_non_zero(csprng);
        let mut comm_to_signer = ps_pk.g.mul_by_scalar(&mask);
        let mut secrets = Vec::with_capacity(n);
        let mut messages = Vec::with_capacity(n);
        for y_j in ps_pk.ys.iter().take(csprng.gen_range(1..=n)) {
            let v_j = Value::<C>::generate(csprng);
            comm_to_signer = comm_to_signer.plus_point(&y_j.mul_by_scalar(&v_j));
            if csprng.gen_bool(0.5) {
                let (c_j, r_j) = comm_key.commit(&v_j, csprng);
                secrets.push(MessageSecret::EqualToCommitment(v_j, r_j));
                messages.push(MessageHandling::EqualToCommitment(c_j));
            } else {
                messages.push(MessageHandling::Revealed(*v_j));
                secrets.push(MessageSecret::Revealed);
            }
        }
        let sig = ps_sk
            .sign_unknown_message(&UnknownMessage(comm_to_signer), csprng)
            .retrieve(&mask);
        let (blinded_sig, blind_rand) = sig.blind(csprng);
        let ces = ComEqSig {
            blinded_sig,
            msgs_handling: messages,
            ps_pub_key: ps_pk,
            comm_key,
        };
        let secret = ComEqSigSecret {
            blind_rand,
            msgs_secret: secrets,
        };
        f(ces, secret, csprng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    pub fn test_com_eq_sig_correctness() {
        let mut csprng = thread_rng();
        for i in 1..20 {
            ComEqSig::<Bls12, G1>::with_valid_data(i, &mut csprng, |ces, secret, csprng| {
                let ro = RandomOracle::domain(generate_challenge_prefix(csprng));
                let proof =
                    prove(&mut ro.split(), &ces, secret, csprng).expect("Proving should succeed.");
                assert!(verify(&mut ro.split(), &ces, &proof));
            })
        }
    }

    #[test]
    pub fn test_com_eq_sig_soundness() {
        let mut csprng = thread_rng();
        for i in 1..10 {
            ComEqSig::<Bls12, G1>::with_valid_data(i, &mut csprng, |ces, secret, csprng| {
                let ro = RandomOracle::domain(generate_challenge_prefix(csprng));
                let proof =
                    prove(&mut ro.split(), &ces, secret, csprng).expect("Proving should succeed.");

                let mut ces = ces;
                // A different blinded signature.
                let original_sig = ces.blinded_sig.clone();
                ces.blinded_sig.sig.1 = ces.blinded_sig.sig.1.plus_point(&ces.ps_pub_key.g);
                assert!(!verify(&mut ro.split(), &ces, &proof));
                ces.blinded_sig = original_sig;

                // A different value for the first message.
                let original = ces.msgs_handling[0].clone();
                ces.msgs_handling[0] = match &original {
                    MessageHandling::EqualToCommitment(_) => {
                        MessageHandling::EqualToCommitment(Commitment::generate(csprng))
                    }
                    MessageHandling::Revealed(_) => {
                        MessageHandling::Revealed(G1::generate_scalar(csprng))
                    }
                };
                assert!(!verify(&mut ro.split(), &ces, &proof));
                ces.msgs_handling[0] = original;
                assert!(verify(&mut ro.split(), &ces, &proof));

                // Claiming more messages than the key supports.
                let too_many = ces.ps_pub_key.len() + 1;
                ces.msgs_handling
                    .resize(too_many, MessageHandling::Revealed(G1::generate_scalar(csprng)));
                assert!(!verify(&mut ro.split(), &ces, &proof));
            })
        }
    }
}
