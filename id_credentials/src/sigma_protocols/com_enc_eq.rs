//! Proof that an ElGamal encryption in the exponent and a Pedersen commitment
//! hide the same value. Each anonymity revoker's share of the credential
//! holder's secret is linked to the public sharing polynomial this way.
use super::common::*;
use crate::{
    common::*,
    curve_arithmetic::{multiexp, Curve, Field, Value},
    elgamal::{Cipher, PublicKey as ElGamalPublicKey, Randomness as ElGamalRandomness},
    pedersen_commitment::{Commitment, CommitmentKey, Randomness as PedersenRandomness},
    random_oracle::{Challenge, RandomOracle},
};
use rand::*;

pub struct ComEncEqSecret<C: Curve> {
    pub value:         Value<C>,
    pub elgamal_rand:  ElGamalRandomness<C>,
    pub pedersen_rand: PedersenRandomness<C>,
}

/// The values `alpha - c R`, `beta - c x`, `gamma - c r` where `R` is the
/// encryption randomness, `x` the value and `r` the commitment randomness.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Response<C: Curve> {
    response: (C::Scalar, C::Scalar, C::Scalar),
}

impl<C: Curve> Serial for Response<C> {
    fn serial<B: Buffer>(&self, out: &mut B) { out.put(&self.response) }
}

impl<C: Curve> Deserial for Response<C> {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        Ok(Response {
            response: source.get()?,
        })
    }
}

pub struct ComEncEq<C: Curve> {
    /// Encryption of `h^x` for the in-exponent generator `h`.
    pub cipher: Cipher<C>,
    /// Commitment to `x`.
    pub commitment: Commitment<C>,
    pub pub_key: ElGamalPublicKey<C>,
    pub cmm_key: CommitmentKey<C>,
    pub encryption_in_exponent_generator: C,
}

impl<C: Curve> SigmaProtocol for ComEncEq<C> {
    type CommitMessage = (Cipher<C>, Commitment<C>);
    type ProtocolChallenge = C::Scalar;
    // (beta, alpha, gamma)
    type ProverState = (Value<C>, ElGamalRandomness<C>, PedersenRandomness<C>);
    type Response = Response<C>;
    type SecretData = ComEncEqSecret<C>;

    fn public(&self, ro: &mut RandomOracle) {
        ro.append_message(b"cipher", &self.cipher);
        ro.append_message(b"commitment", &self.commitment);
        ro.append_message(b"pub_key", &self.pub_key);
        ro.append_message(b"cmm_key", &self.cmm_key);
        ro.append_message(b"exponent_generator", &self.encryption_in_exponent_generator)
    }

    fn get_challenge(&self, challenge: &Challenge) -> Self::ProtocolChallenge {
        C::scalar_from_bytes(challenge)
    }

    fn compute_commit_message<R: Rng>(
        &self,
        csprng: &mut R,
    ) -> Option<(Self::CommitMessage, Self::ProverState)> {
        let beta = Value::generate_non_zero(csprng);
        let (rand_cipher, alpha) = self.pub_key.encrypt_exponent_rand_given_generator(
            &beta,
            &self.encryption_in_exponent_generator,
            csprng,
        );
        let (rand_cmm, gamma) = self.cmm_key.commit(&beta, csprng);
        Some(((rand_cipher, rand_cmm), (beta, alpha, gamma)))
    }

    fn compute_response(
        &self,
        secret: Self::SecretData,
        state: Self::ProverState,
        challenge: &Self::ProtocolChallenge,
    ) -> Option<Self::Response> {
        let (beta, alpha, gamma) = state;
        let respond = |rand: &C::Scalar, secret: &C::Scalar| {
            let mut z = *challenge;
            z.negate();
            z.mul_assign(secret);
            z.add_assign(rand);
            z
        };
        let z_1 = respond(&alpha, &secret.elgamal_rand);
        let z_2 = respond(&beta, &secret.value);
        let z_3 = respond(&gamma, &secret.pedersen_rand);
        Some(Response {
            response: (z_1, z_2, z_3),
        })
    }

    fn extract_commit_message(
        &self,
        challenge: &Self::ProtocolChallenge,
        response: &Self::Response,
    ) -> Option<Self::CommitMessage> {
        let (z_1, z_2, z_3) = response.response;
        let a_1 = multiexp(&[self.pub_key.generator, self.cipher.0], &[z_1, *challenge]);
        let a_2 = multiexp(
            &[
                self.encryption_in_exponent_generator,
                self.pub_key.key,
                self.cipher.1,
            ],
            &[z_2, z_1, *challenge],
        );
        let a_3 = multiexp(
            &[self.cmm_key.g, self.cmm_key.h, self.commitment.0],
            &[z_2, z_3, *challenge],
        );
        Some((Cipher(a_1, a_2), Commitment(a_3)))
    }

    #[cfg(test)]
    fn with_valid_data<R: Rng>(
        _data_size: usize,
        csprng: &mut R,
        f: impl FnOnce(Self, Self::SecretData, &mut R),
    ) {
        use crate::elgamal::SecretKey;
        let sk = SecretKey::generate_all(csprng);
        let pub_key = ElGamalPublicKey::from(&sk);
        let cmm_key = CommitmentKey::generate(csprng);
        let x = Value::generate_non_zero(csprng);
        let h_in_exponent = C::generate(csprng);
        let (cipher, elgamal_rand) =
            pub_key.encrypt_exponent_rand_given_generator(&x, &h_in_exponent, csprng);
        let (commitment, pedersen_rand) = cmm_key.commit(&x, csprng);
        let secret = ComEncEqSecret {
            value: x,
            elgamal_rand,
            pedersen_rand,
        };
        let com_enc_eq = ComEncEq {
            cipher,
            commitment,
            pub_key,
            cmm_key,
            encryption_in_exponent_generator: h_in_exponent,
        };
        f(com_enc_eq, secret, csprng)
    }
}
