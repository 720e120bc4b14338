use crate::curve_arithmetic::{Bls12, G1};

/// Curve used by the anonymity revoker.
pub type ArCurve = G1;
/// Pairing used by the identity provider.
pub type IpPairing = Bls12;

/// Number of signed messages that precede the attributes: IdCredSec, the PRF
/// key, the public credential values and the anonymity revoker digest.
pub const NUM_PREFIX_MESSAGES: usize = 4;

/// Maximum length of an attribute value in bytes. With this bound the
/// attribute, together with its length, fits into a scalar.
pub const MAX_ATTRIBUTE_LENGTH: usize = 31;

/// Domain used in the transcript of credential deployment proofs.
pub const CREDENTIAL_DOMAIN: &str = "credential";

/// Domain used in the transcript of the proof in the pre-identity object.
pub const PRE_IDENTITY_DOMAIN: &str = "PreIdentityProof";
