//! Knowledge of an opening `x_1, ..., x_n, r` of a vector commitment
//! `C = h^r Π g_i^{x_i}` such that, for a chosen set of positions `i`, the
//! value `x_i` is also the discrete logarithm of a public point `y_i` with
//! respect to a base `b_i`. The points `y_i` may live in a different group of
//! the same order.
//!
//! The account holder uses it when requesting an identity: the first value in
//! the commitment sent to the identity provider is the dlog of `IdCredPub`.
use super::common::*;
use crate::{
    common::*,
    curve_arithmetic::{multiexp, Curve, Field, Value},
    pedersen_commitment::{Commitment, Randomness, VecCommitmentKey},
    random_oracle::{Challenge, RandomOracle},
};
use anyhow::ensure;
use std::collections::BTreeMap;

pub struct VecComDlogEq<C: Curve, D: Curve<Scalar = C::Scalar> = C> {
    /// The vector commitment.
    pub comm:  Commitment<C>,
    /// The key it was made with.
    pub key:   VecCommitmentKey<C>,
    /// Position in the vector, mapped to the base `b_i` and the public point
    /// `y_i = b_i^{x_i}`.
    pub dlogs: BTreeMap<usize, (D, D)>,
}

pub struct VecComDlogEqSecret<C: Curve> {
    pub xs: Vec<Value<C>>,
    pub r:  Randomness<C>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response<C: Curve> {
    sis: Vec<C::Scalar>,
    t:   C::Scalar,
}

impl<C: Curve> Serial for Response<C> {
    fn serial<B: Buffer>(&self, out: &mut B) {
        out.put(&(self.sis.len() as u32));
        serial_vector_no_length(&self.sis, out);
        out.put(&self.t);
    }
}

impl<C: Curve> Deserial for Response<C> {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let len: u32 = source.get()?;
        ensure!(len > 0, "Response must have at least one value.");
        let sis = deserial_vector_no_length(source, len as usize)?;
        let t = source.get()?;
        Ok(Response { sis, t })
    }
}

impl<C: Curve, D: Curve<Scalar = C::Scalar>> SigmaProtocol for VecComDlogEq<C, D> {
    type CommitMessage = (Commitment<C>, Vec<D>);
    type ProtocolChallenge = C::Scalar;
    // The randomness for each value, and for the commitment randomness.
    type ProverState = (Vec<C::Scalar>, C::Scalar);
    type Response = Response<C>;
    type SecretData = VecComDlogEqSecret<C>;

    fn public(&self, ro: &mut RandomOracle) {
        ro.append_message(b"comm", &self.comm);
        ro.append_message(b"key", &self.key);
        ro.append_message(b"dlogs", &(self.dlogs.len() as u32));
        for (i, (base, public)) in self.dlogs.iter() {
            ro.append_message(b"index", &(*i as u32));
            ro.append_message(b"base", base);
            ro.append_message(b"public", public);
        }
    }

    fn get_challenge(&self, challenge: &Challenge) -> Self::ProtocolChallenge {
        C::scalar_from_bytes(challenge)
    }

    fn compute_commit_message<R: rand::Rng>(
        &self,
        csprng: &mut R,
    ) -> Option<(Self::CommitMessage, Self::ProverState)> {
        let n = self.key.len();
        if self.dlogs.keys().any(|i| *i >= n) {
            return None;
        }
        let alphas: Vec<C::Scalar> = (0..n).map(|_| C::generate_scalar(csprng)).collect();
        let rtilde = C::generate_scalar(csprng);
        let a = self.key.hide_worker(&alphas, &rtilde).ok()?;
        let bs = self
            .dlogs
            .iter()
            .map(|(i, (base, _))| base.mul_by_scalar(&alphas[*i]))
            .collect();
        Some(((a, bs), (alphas, rtilde)))
    }

    fn compute_response(
        &self,
        secret: Self::SecretData,
        state: Self::ProverState,
        challenge: &Self::ProtocolChallenge,
    ) -> Option<Self::Response> {
        let (alphas, rtilde) = state;
        if secret.xs.len() != alphas.len() {
            return None;
        }
        // s_i = alpha_i - c x_i
        let sis = alphas
            .iter()
            .zip(secret.xs.iter())
            .map(|(alpha, x)| {
                let mut s = *challenge;
                s.mul_assign(x);
                s.negate();
                s.add_assign(alpha);
                s
            })
            .collect();
        // t = rtilde - c r
        let mut t = *challenge;
        t.mul_assign(&secret.r);
        t.negate();
        t.add_assign(&rtilde);
        Some(Response { sis, t })
    }

    fn extract_commit_message(
        &self,
        challenge: &Self::ProtocolChallenge,
        response: &Self::Response,
    ) -> Option<Self::CommitMessage> {
        let n = self.key.len();
        if response.sis.len() != n || self.dlogs.keys().any(|i| *i >= n) {
            return None;
        }
        // a = h^t C^c Π g_i^{s_i}
        let mut bases = Vec::with_capacity(n + 2);
        let mut exps = Vec::with_capacity(n + 2);
        bases.extend_from_slice(self.key.bases());
        exps.extend_from_slice(&response.sis);
        bases.push(self.key.blinding_base());
        exps.push(response.t);
        bases.push(self.comm.0);
        exps.push(*challenge);
        let a = Commitment(multiexp(&bases, &exps));
        // b_i^{s_i} y_i^c
        let bs = self
            .dlogs
            .iter()
            .map(|(i, (base, public))| {
                multiexp(&[*base, *public], &[response.sis[*i], *challenge])
            })
            .collect();
        Some((a, bs))
    }

    #[cfg(test)]
    fn with_valid_data<R: rand::Rng>(
        data_size: usize,
        csprng: &mut R,
        f: impl FnOnce(Self, Self::SecretData, &mut R),
    ) {
        let n = std::cmp::max(1, data_size);
        let key = VecCommitmentKey::generate(n, csprng).expect("n is non-zero");
        let xs: Vec<Value<C>> = (0..n).map(|_| Value::generate(csprng)).collect();
        let (comm, r) = key.commit(&xs, csprng).expect("Lengths match.");
        let mut dlogs = BTreeMap::new();
        for i in (0..n).step_by(2) {
            let base = D::generate(csprng);
            dlogs.insert(i, (base, base.mul_by_scalar(&xs[i])));
        }
        let vcom = VecComDlogEq { comm, key, dlogs };
        f(vcom, VecComDlogEqSecret { xs, r }, csprng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve_arithmetic::G1;

    #[test]
    pub fn test_vcom_dlog_eq_correctness() {
        let mut csprng = rand::thread_rng();
        for i in 1..10 {
            VecComDlogEq::<G1>::with_valid_data(i, &mut csprng, |vcom, secret, csprng| {
                let challenge_prefix = generate_challenge_prefix(csprng);
                let ro = RandomOracle::domain(challenge_prefix);
                let proof =
                    prove(&mut ro.split(), &vcom, secret, csprng).expect("Proving should succeed.");
                assert!(verify(&mut ro.split(), &vcom, &proof));
            })
        }
    }

    #[test]
    pub fn test_vcom_dlog_eq_soundness() {
        let mut csprng = rand::thread_rng();
        for i in 1..6 {
            VecComDlogEq::<G1>::with_valid_data(i, &mut csprng, |vcom, secret, csprng| {
                let ro = RandomOracle::domain(generate_challenge_prefix(csprng));
                let proof =
                    prove(&mut ro.split(), &vcom, secret, csprng).expect("Proving should succeed.");

                let wrong_comm = VecComDlogEq {
                    comm: Commitment::generate(csprng),
                    key: vcom.key.clone(),
                    dlogs: vcom.dlogs.clone(),
                };
                assert!(!verify(&mut ro.split(), &wrong_comm, &proof));

                let mut dlogs = vcom.dlogs.clone();
                if let Some((base, _)) = dlogs.get(&0).copied() {
                    dlogs.insert(0, (base, G1::generate(csprng)));
                }
                let wrong_public = VecComDlogEq {
                    comm: vcom.comm,
                    key: vcom.key.clone(),
                    dlogs,
                };
                assert!(!verify(&mut ro.split(), &wrong_public, &proof));

                let mut wrong_response = proof.clone();
                wrong_response.response.t = G1::generate_scalar(csprng);
                assert!(!verify(&mut ro.split(), &vcom, &wrong_response));
            })
        }
    }

    #[test]
    pub fn test_dlog_outside_key_is_rejected() {
        let mut csprng = rand::thread_rng();
        VecComDlogEq::<G1>::with_valid_data(2, &mut csprng, |mut vcom, _, csprng| {
            let base = G1::generate(csprng);
            vcom.dlogs.insert(5, (base, base));
            assert!(vcom.compute_commit_message(csprng).is_none());
        })
    }
}
