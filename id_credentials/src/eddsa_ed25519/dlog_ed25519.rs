//! The `dlog` sigma protocol over curve25519. It proves knowledge of the
//! scalar `s` with `P = s B`, where `B` is the ed25519 base point and `s` is
//! the expanded secret of an ed25519 signing key.
use crate::{common::*, random_oracle::RandomOracle};
use anyhow::bail;
use curve25519_dalek::{
    constants,
    edwards::{CompressedEdwardsY, EdwardsPoint},
    scalar::{clamp_integer, Scalar},
};
use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::*;
use sha2::{Digest, Sha512};
use zeroize::Zeroizing;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Ed25519DlogProof {
    challenge: Scalar,
    response:  Scalar,
}

serde_base16!(Ed25519DlogProof);

impl Serial for Ed25519DlogProof {
    fn serial<B: Buffer>(&self, out: &mut B) {
        out.write_all(self.challenge.as_bytes())
            .expect("Writing to buffer should succeed.");
        out.write_all(self.response.as_bytes())
            .expect("Writing to buffer should succeed.");
    }
}

/// Both scalars must be canonical.
impl Deserial for Ed25519DlogProof {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let mut buf = [0; 32];
        source.read_exact(&mut buf)?;
        let Some(challenge) = Option::<Scalar>::from(Scalar::from_canonical_bytes(buf)) else {
            bail!("Not a valid challenge.")
        };
        source.read_exact(&mut buf)?;
        let Some(response) = Option::<Scalar>::from(Scalar::from_canonical_bytes(buf)) else {
            bail!("Not a valid response.")
        };
        Ok(Ed25519DlogProof {
            challenge,
            response,
        })
    }
}

pub const PROOF_LENGTH: usize = 2 * 32;

/// The signing scalar of an ed25519 key, derived as in RFC 8032.
fn scalar_from_secret_key(secret_key: &SigningKey) -> Scalar {
    let secret_bytes = Zeroizing::new(secret_key.to_bytes());
    let mut hash = Zeroizing::new([0u8; 64]);
    hash.copy_from_slice(Sha512::digest(secret_bytes.as_ref()).as_slice());
    let mut scalar_bytes = Zeroizing::new([0u8; 32]);
    scalar_bytes.copy_from_slice(&hash[..32]);
    Scalar::from_bytes_mod_order(clamp_integer(*scalar_bytes))
}

fn point_from_public_key(public_key: &VerifyingKey) -> Option<EdwardsPoint> {
    CompressedEdwardsY(public_key.to_bytes()).decompress()
}

fn challenge_from_oracle(ro: &RandomOracle) -> Scalar {
    let mut array = [0u8; 32];
    array.copy_from_slice(ro.split().result().as_ref());
    Scalar::from_bytes_mod_order(array)
}

/// Construct a proof of knowledge of the secret key. The transcript is
/// extended with the public key and the prover's first message.
pub fn prove_dlog_ed25519<R: Rng>(
    csprng: &mut R,
    ro: &mut RandomOracle,
    public_key: &VerifyingKey,
    secret_key: &SigningKey,
) -> Ed25519DlogProof {
    let secret = scalar_from_secret_key(secret_key);
    ro.append_message(b"dlog_ed25519", public_key);

    let mut rand_bytes = Zeroizing::new([0u8; 64]);
    csprng.fill_bytes(rand_bytes.as_mut());
    let rand_scalar = Scalar::from_bytes_mod_order_wide(&rand_bytes);

    let randomised_point = &rand_scalar * constants::ED25519_BASEPOINT_TABLE;
    ro.append_message(b"randomised_point", &randomised_point.compress().to_bytes());
    let challenge = challenge_from_oracle(ro);
    Ed25519DlogProof {
        challenge,
        response: rand_scalar - challenge * secret,
    }
}

pub fn verify_dlog_ed25519(
    ro: &mut RandomOracle,
    public_key: &VerifyingKey,
    proof: &Ed25519DlogProof,
) -> bool {
    let Some(public) = point_from_public_key(public_key) else {
        return false;
    };
    let randomised_point =
        public * proof.challenge + &proof.response * constants::ED25519_BASEPOINT_TABLE;
    ro.append_message(b"dlog_ed25519", public_key);
    ro.append_message(b"randomised_point", &randomised_point.compress().to_bytes());
    challenge_from_oracle(ro) == proof.challenge
}
