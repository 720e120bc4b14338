//! Schnorr proof of knowledge of `x` with `point = base^x`. Used on its own
//! for commitment equality, where the base is the blinding generator `h`.
use super::common::*;
use crate::{
    common::*,
    curve_arithmetic::{multiexp, Curve, Field, Value},
    random_oracle::{Challenge, RandomOracle},
};

pub struct Dlog<C: Curve> {
    pub point: C,
    pub base:  C,
}

pub struct DlogSecret<C: Curve> {
    pub exponent: Value<C>,
}

/// `s = k + c·x` for the nonce `k`.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Response<C: Curve> {
    s: C::Scalar,
}

impl<C: Curve> Serial for Response<C> {
    fn serial<B: Buffer>(&self, out: &mut B) { out.put(&self.s) }
}

impl<C: Curve> Deserial for Response<C> {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let s = source.get()?;
        Ok(Response { s })
    }
}

impl<C: Curve> SigmaProtocol for Dlog<C> {
    type CommitMessage = C;
    type ProtocolChallenge = C::Scalar;
    type ProverState = Value<C>;
    type Response = Response<C>;
    type SecretData = DlogSecret<C>;

    fn public(&self, ro: &mut RandomOracle) {
        ro.append_message(b"dlog_point", &self.point);
        ro.append_message(b"dlog_base", &self.base)
    }

    fn compute_commit_message<R: rand::Rng>(
        &self,
        csprng: &mut R,
    ) -> Option<(Self::CommitMessage, Self::ProverState)> {
        let nonce = Value::generate_non_zero(csprng);
        Some((self.base.mul_by_scalar(&nonce), nonce))
    }

    fn get_challenge(&self, challenge: &Challenge) -> Self::ProtocolChallenge {
        C::scalar_from_bytes(challenge)
    }

    fn compute_response(
        &self,
        secret: Self::SecretData,
        nonce: Self::ProverState,
        challenge: &Self::ProtocolChallenge,
    ) -> Option<Self::Response> {
        let mut s = *secret.exponent;
        s.mul_assign(challenge);
        s.add_assign(&nonce);
        Some(Response { s })
    }

    fn extract_commit_message(
        &self,
        challenge: &Self::ProtocolChallenge,
        response: &Self::Response,
    ) -> Option<Self::CommitMessage> {
        // base^s · point^{-c}
        let mut neg_c = C::Scalar::zero();
        neg_c.sub_assign(challenge);
        Some(multiexp::<C, C>(&[self.base, self.point], &[response.s, neg_c]))
    }

    #[cfg(test)]
    fn with_valid_data<R: rand::Rng>(
        _data_size: usize,
        csprng: &mut R,
        f: impl FnOnce(Dlog<C>, Self::SecretData, &mut R),
    ) {
        let exponent = Value::generate(csprng);
        let base = C::generate(csprng);
        let dlog = Dlog {
            point: base.mul_by_scalar(&exponent),
            base,
        };
        f(dlog, DlogSecret { exponent }, csprng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve_arithmetic::G1;

    #[test]
    pub fn test_dlog_correctness() {
        let mut csprng = rand::thread_rng();
        for _ in 0..50 {
            Dlog::<G1>::with_valid_data(0, &mut csprng, |dlog, secret, csprng| {
                let ro = RandomOracle::domain(generate_challenge_prefix(csprng));
                let proof =
                    prove(&mut ro.split(), &dlog, secret, csprng).expect("Proving should succeed.");
                assert!(verify(&mut ro.split(), &dlog, &proof));
                let bytes = to_bytes(&proof);
                let des: SigmaProof<Response<G1>> =
                    from_bytes_complete(&bytes).expect("Proof should deserialize.");
                assert!(verify(&mut ro.split(), &dlog, &des));
            })
        }
    }

    #[test]
    pub fn test_dlog_soundness() {
        let mut csprng = rand::thread_rng();
        for _ in 0..20 {
            Dlog::<G1>::with_valid_data(0, &mut csprng, |dlog, secret, csprng| {
                let ro = RandomOracle::domain(generate_challenge_prefix(csprng));
                let proof =
                    prove(&mut ro.split(), &dlog, secret, csprng).expect("Proving should succeed.");

                // A different transcript gives a different challenge.
                let mut other_ro = RandomOracle::domain(b"some other context");
                assert!(!verify(&mut other_ro, &dlog, &proof));

                let swapped = Dlog {
                    point: dlog.base,
                    base:  dlog.point,
                };
                assert!(!verify(&mut ro.split(), &swapped, &proof));
                let other_point = Dlog {
                    point: G1::generate(csprng),
                    base:  dlog.base,
                };
                assert!(!verify(&mut ro.split(), &other_point, &proof));
                let mut bad_response = proof;
                bad_response.response.s.add_assign(&G1::scalar_from_u64(1));
                assert!(!verify(&mut ro.split(), &dlog, &bad_response));
            })
        }
    }
}
