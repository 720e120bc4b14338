//! Proof that three commitments `C_1, C_2, C_3` hide values `a`, `b` and
//! `a b`. The pseudonym of a credential is tied to the PRF key and the
//! credential counter with it.
use super::common::*;
use crate::{
    common::*,
    curve_arithmetic::{multiexp, Curve, Field, Value},
    pedersen_commitment::{Commitment, CommitmentKey, Randomness},
    random_oracle::{Challenge, RandomOracle},
};
use rand::*;

pub struct ComMult<C: Curve> {
    pub cmms:    [Commitment<C>; 3],
    pub cmm_key: CommitmentKey<C>,
}

pub struct ComMultSecret<C: Curve> {
    pub values: [Value<C>; 3],
    pub rands:  [Randomness<C>; 3],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response<C: Curve> {
    /// Responses for the openings of the three commitments.
    ss: [(C::Scalar, C::Scalar); 3],
    /// Response for the randomness relating `C_3` to `C_1^b`.
    t:  C::Scalar,
}

impl<C: Curve> Serial for Response<C> {
    fn serial<B: Buffer>(&self, out: &mut B) {
        for s in self.ss.iter() {
            out.put(s);
        }
        out.put(&self.t);
    }
}

impl<C: Curve> Deserial for Response<C> {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let ss = [source.get()?, source.get()?, source.get()?];
        let t = source.get()?;
        Ok(Response { ss, t })
    }
}

pub struct ComMultState<C: Curve> {
    alphas: [(C::Scalar, C::Scalar); 3],
    a_rand: C::Scalar,
}

/// `rand - c * secret`
fn respond<F: Field>(challenge: &F, rand: &F, secret: &F) -> F {
    let mut res = *challenge;
    res.mul_assign(secret);
    res.negate();
    res.add_assign(rand);
    res
}

impl<C: Curve> SigmaProtocol for ComMult<C> {
    type CommitMessage = ([Commitment<C>; 3], Commitment<C>);
    type ProtocolChallenge = C::Scalar;
    type ProverState = ComMultState<C>;
    type Response = Response<C>;
    type SecretData = ComMultSecret<C>;

    fn public(&self, ro: &mut RandomOracle) {
        ro.append_message(b"cmms", &self.cmms);
        ro.append_message(b"cmm_key", &self.cmm_key)
    }

    fn get_challenge(&self, challenge: &Challenge) -> Self::ProtocolChallenge {
        C::scalar_from_bytes(challenge)
    }

    fn compute_commit_message<R: Rng>(
        &self,
        csprng: &mut R,
    ) -> Option<(Self::CommitMessage, Self::ProverState)> {
        let mut alphas = [(C::Scalar::zero(), C::Scalar::zero()); 3];
        let mut vs = [Commitment(C::zero_point()); 3];
        for (alpha, v) in alphas.iter_mut().zip(vs.iter_mut()) {
            let a = C::generate_scalar(csprng);
            let r = C::generate_scalar(csprng);
            *v = self.cmm_key.hide_worker(&a, &r);
            *alpha = (a, r);
        }
        let a_rand = C::generate_scalar(csprng);
        // C_1^{alpha_2} h^{a_rand}
        let v = Commitment(multiexp(&[self.cmms[0].0, self.cmm_key.h], &[
            alphas[1].0,
            a_rand,
        ]));
        Some(((vs, v), ComMultState { alphas, a_rand }))
    }

    fn compute_response(
        &self,
        secret: Self::SecretData,
        state: Self::ProverState,
        challenge: &Self::ProtocolChallenge,
    ) -> Option<Self::Response> {
        let mut ss = [(C::Scalar::zero(), C::Scalar::zero()); 3];
        for (i, s) in ss.iter_mut().enumerate() {
            let (alpha, r_alpha) = &state.alphas[i];
            *s = (
                respond(challenge, alpha, secret.values[i].as_ref()),
                respond(challenge, r_alpha, secret.rands[i].as_ref()),
            );
        }
        // C_3 = C_1^b h^{r_3 - b r_1}
        let mut rel = *secret.values[1].as_ref();
        rel.mul_assign(&secret.rands[0]);
        rel.negate();
        rel.add_assign(&secret.rands[2]);
        let t = respond(challenge, &state.a_rand, &rel);
        Some(Response { ss, t })
    }

    fn extract_commit_message(
        &self,
        challenge: &Self::ProtocolChallenge,
        response: &Self::Response,
    ) -> Option<Self::CommitMessage> {
        let mut vs = [Commitment(C::zero_point()); 3];
        for ((v, cmm), (s, t)) in vs.iter_mut().zip(self.cmms.iter()).zip(response.ss.iter()) {
            *v = Commitment(multiexp(&[cmm.0, self.cmm_key.g, self.cmm_key.h], &[
                *challenge, *s, *t,
            ]));
        }
        let v = Commitment(multiexp(
            &[self.cmms[2].0, self.cmms[0].0, self.cmm_key.h],
            &[*challenge, response.ss[1].0, response.t],
        ));
        Some((vs, v))
    }

    #[cfg(test)]
    fn with_valid_data<R: Rng>(
        _data_size: usize,
        csprng: &mut R,
        f: impl FnOnce(Self, Self::SecretData, &mut R),
    ) {
        let cmm_key = CommitmentKey::generate(csprng);
        let a = Value::<C>::generate_non_zero(csprng);
        let b = Value::<C>::generate_non_zero(csprng);
        let mut ab = *a;
        ab.mul_assign(&b);
        let ab = Value::new(ab);
        let (c_1, r_1) = cmm_key.commit(&a, csprng);
        let (c_2, r_2) = cmm_key.commit(&b, csprng);
        let (c_3, r_3) = cmm_key.commit(&ab, csprng);
        let com_mult = ComMult {
            cmms: [c_1, c_2, c_3],
            cmm_key,
        };
        let secret = ComMultSecret {
            values: [a, b, ab],
            rands:  [r_1, r_2, r_3],
        };
        f(com_mult, secret, csprng)
    }
}
