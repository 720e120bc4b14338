//! Types of the identity layer: identifiers, attributes and policies, the
//! records a credential is made of, and the public parameters of identity
//! providers and anonymity revokers.
use super::{constants::*, secret_sharing::Threshold};
use crate::{
    common::{types::KeyIndex, *},
    curve_arithmetic::*,
    eddsa_ed25519::Ed25519DlogProof,
    elgamal::{self, Cipher},
    pedersen_commitment::{Commitment, CommitmentKey},
    ps_sig,
    random_oracle::Challenge,
    sigma_protocols::{com_enc_eq, com_eq_sig, com_mult, common::SigmaProof, vcom_eq},
};
use anyhow::{bail, ensure};
use chrono::{Datelike, TimeZone};
use derive_more::{Display, From, Into};
use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::*;
use sha2::{Digest, Sha256};
use std::{
    cmp::Ordering,
    collections::{BTreeMap, BTreeSet},
    convert::TryFrom,
    fmt,
    io::Read,
    str::FromStr,
};
use thiserror::Error;

pub const ACCOUNT_ADDRESS_SIZE: usize = 32;

/// Address of an account, the SHA-256 hash of the registration id of the
/// credential that created it.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Copy, Clone, Hash)]
pub struct AccountAddress(pub [u8; ACCOUNT_ADDRESS_SIZE]);

serde_base16!(AccountAddress);

impl Serial for AccountAddress {
    #[inline]
    fn serial<B: Buffer>(&self, x: &mut B) {
        x.write_all(&self.0)
            .expect("Writing to buffer should succeed.")
    }
}

impl Deserial for AccountAddress {
    #[inline]
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let mut buf = [0u8; ACCOUNT_ADDRESS_SIZE];
        source.read_exact(&mut buf)?;
        Ok(AccountAddress(buf))
    }
}

impl AccountAddress {
    /// Construct account address from the registration id.
    pub fn new<C: Curve>(reg_id: &C) -> Self {
        let mut out = [0; ACCOUNT_ADDRESS_SIZE];
        out.copy_from_slice(&Sha256::digest(to_bytes(reg_id)));
        AccountAddress(out)
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&hex::encode(self.0)) }
}

/// Threshold for the number of signatures required.
/// The values of this type must maintain the property that they are not 0.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash, SerdeSerialize, SerdeDeserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(transparent)]
pub struct SignatureThreshold(u8);

impl SignatureThreshold {
    pub const ONE: SignatureThreshold = SignatureThreshold(1);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Signature threshold must be at least 1.")]
pub struct ZeroSignatureThreshold;

impl TryFrom<u8> for SignatureThreshold {
    type Error = ZeroSignatureThreshold;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value == 0 {
            Err(ZeroSignatureThreshold)
        } else {
            Ok(SignatureThreshold(value))
        }
    }
}

impl From<SignatureThreshold> for u8 {
    fn from(x: SignatureThreshold) -> Self { x.0 }
}

impl From<SignatureThreshold> for usize {
    fn from(x: SignatureThreshold) -> Self { x.0.into() }
}

impl fmt::Display for SignatureThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

impl Serial for SignatureThreshold {
    fn serial<B: Buffer>(&self, out: &mut B) { out.put(&self.0) }
}

impl Deserial for SignatureThreshold {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let x: u8 = source.get()?;
        Ok(SignatureThreshold::try_from(x)?)
    }
}

#[derive(
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Clone,
    Copy,
    Hash,
    Display,
    From,
    Into,
    SerdeSerialize,
    SerdeDeserialize,
)]
#[repr(transparent)]
#[serde(transparent)]
pub struct IpIdentity(pub u32);

impl Serial for IpIdentity {
    fn serial<B: Buffer>(&self, out: &mut B) { out.put(&self.0) }
}

impl Deserial for IpIdentity {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> { Ok(IpIdentity(source.get()?)) }
}

/// Identity of an anonymity revoker. It is also the point at which the
/// revoker's share of the sharing polynomial is evaluated, so it is never 0.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash, SerdeSerialize, SerdeDeserialize)]
#[serde(try_from = "u32", into = "u32")]
#[repr(transparent)]
pub struct ArIdentity(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Anonymity revoker identity must be non-zero.")]
pub struct ZeroArIdentity;

impl TryFrom<u32> for ArIdentity {
    type Error = ZeroArIdentity;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if value == 0 {
            Err(ZeroArIdentity)
        } else {
            Ok(ArIdentity(value))
        }
    }
}

impl From<ArIdentity> for u32 {
    fn from(x: ArIdentity) -> Self { x.0 }
}

impl From<ArIdentity> for u64 {
    fn from(x: ArIdentity) -> Self { x.0.into() }
}

impl fmt::Display for ArIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

impl ArIdentity {
    pub fn to_scalar<C: Curve>(self) -> C::Scalar { C::scalar_from_u64(u64::from(self.0)) }
}

impl Serial for ArIdentity {
    fn serial<B: Buffer>(&self, out: &mut B) { out.put(&self.0) }
}

impl Deserial for ArIdentity {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let x: u32 = source.get()?;
        Ok(ArIdentity::try_from(x)?)
    }
}

/// Position of an attribute in the attribute list.
#[derive(
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Clone,
    Copy,
    Hash,
    Display,
    From,
    Into,
    SerdeSerialize,
    SerdeDeserialize,
)]
#[repr(transparent)]
#[serde(transparent)]
pub struct AttributeTag(pub u8);

impl AttributeTag {
    /// Index of the attribute in the message signed by the identity
    /// provider.
    pub fn message_index(self) -> usize { NUM_PREFIX_MESSAGES + usize::from(self.0) }
}

impl Serial for AttributeTag {
    fn serial<B: Buffer>(&self, out: &mut B) { out.put(&self.0) }
}

impl Deserial for AttributeTag {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> { Ok(AttributeTag(source.get()?)) }
}

/// Value of an attribute, a string of at most 31 bytes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, SerdeSerialize, SerdeDeserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AttributeKind(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Attribute values are at most 31 bytes, this one is {0}.")]
pub struct AttributeTooLong(pub usize);

impl TryFrom<String> for AttributeKind {
    type Error = AttributeTooLong;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.len() > MAX_ATTRIBUTE_LENGTH {
            Err(AttributeTooLong(value.len()))
        } else {
            Ok(AttributeKind(value))
        }
    }
}

impl FromStr for AttributeKind {
    type Err = AttributeTooLong;

    fn from_str(s: &str) -> Result<Self, Self::Err> { AttributeKind::try_from(s.to_owned()) }
}

impl From<AttributeKind> for String {
    fn from(x: AttributeKind) -> Self { x.0 }
}

/// Decimal digits of a 64-bit number always fit.
impl From<u64> for AttributeKind {
    fn from(x: u64) -> Self { AttributeKind(x.to_string()) }
}

impl AsRef<str> for AttributeKind {
    fn as_ref(&self) -> &str { &self.0 }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl AttributeKind {
    /// Encode the attribute as a scalar. The length goes into the first byte
    /// of a 32-byte big-endian buffer and the bytes are right-aligned, so
    /// distinct attributes map to distinct scalars, all below the modulus.
    pub fn to_field_element<C: Curve>(&self) -> C::Scalar {
        let bytes = self.0.as_bytes();
        let mut buf = [0u8; 32];
        buf[0] = bytes.len() as u8;
        buf[32 - bytes.len()..].copy_from_slice(bytes);
        C::scalar_from_bytes(buf)
    }
}

impl Serial for AttributeKind {
    fn serial<B: Buffer>(&self, out: &mut B) {
        out.put(&(self.0.len() as u8));
        serial_string(&self.0, out)
    }
}

impl Deserial for AttributeKind {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let len: u8 = source.get()?;
        ensure!(
            usize::from(len) <= MAX_ATTRIBUTE_LENGTH,
            "Attribute value of length {} is too long.",
            len
        );
        Ok(AttributeKind(deserial_string(source, len.into())?))
    }
}

/// A calendar month, used for the validity period of identities.
/// Serialized as a 2-byte year followed by a 1-byte month, and in JSON as
/// a `YYYYMM` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, SerdeSerialize, SerdeDeserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YearMonth {
    year:  u16,
    month: u8,
}

impl YearMonth {
    /// `None` unless the year is in `[1000, 9999]` and the month in
    /// `[1, 12]`.
    pub fn new(year: u16, month: u8) -> Option<Self> {
        if (1000..=9999).contains(&year) && (1..=12).contains(&month) {
            Some(YearMonth { year, month })
        } else {
            None
        }
    }

    pub fn year(self) -> u16 { self.year }

    pub fn month(self) -> u8 { self.month }

    /// The month containing the given time.
    pub fn from_date_time<Tz: TimeZone>(dt: &chrono::DateTime<Tz>) -> Option<Self> {
        let year = u16::try_from(dt.year()).ok()?;
        let month = u8::try_from(dt.month()).ok()?;
        YearMonth::new(year, month)
    }

    /// The month containing the given number of seconds since the unix epoch.
    pub fn from_timestamp(seconds: i64) -> Option<Self> {
        YearMonth::from_date_time(&chrono::DateTime::from_timestamp(seconds, 0)?)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ensure!(
            s.len() == 6 && s.bytes().all(|b| b.is_ascii_digit()),
            "Expected a date of the form YYYYMM, got {}.",
            s
        );
        let year = s[..4].parse()?;
        let month = s[4..].parse()?;
        match YearMonth::new(year, month) {
            Some(ym) => Ok(ym),
            None => bail!("{} is not a valid year and month.", s),
        }
    }
}

impl TryFrom<String> for YearMonth {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> { value.parse() }
}

impl From<YearMonth> for String {
    fn from(x: YearMonth) -> Self { x.to_string() }
}

impl Serial for YearMonth {
    fn serial<B: Buffer>(&self, out: &mut B) {
        out.put(&self.year);
        out.put(&self.month);
    }
}

impl Deserial for YearMonth {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let year: u16 = source.get()?;
        let month: u8 = source.get()?;
        match YearMonth::new(year, month) {
            Some(ym) => Ok(ym),
            None => bail!("Invalid year and month {} {}.", year, month),
        }
    }
}

/// The attributes an identity provider vouches for, with the validity
/// period of the identity.
#[derive(Debug, Clone, PartialEq, Eq, SerdeSerialize, SerdeDeserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeList {
    pub created_at: YearMonth,
    pub valid_to:   YearMonth,
    #[serde(rename = "chosenAttributes")]
    pub alist:      BTreeMap<AttributeTag, AttributeKind>,
}

impl Serial for AttributeList {
    fn serial<B: Buffer>(&self, out: &mut B) {
        out.put(&self.created_at);
        out.put(&self.valid_to);
        out.put(&(self.alist.len() as u16));
        serial_map_no_length(&self.alist, out)
    }
}

impl Deserial for AttributeList {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let created_at = source.get()?;
        let valid_to = source.get()?;
        let len: u16 = source.get()?;
        let alist = deserial_map_no_length(source, usize::from(len))?;
        Ok(AttributeList {
            created_at,
            valid_to,
            alist,
        })
    }
}

/// The part of an identity a credential discloses: the validity period and
/// the revealed attributes.
#[derive(Debug, Clone, PartialEq, Eq, SerdeSerialize, SerdeDeserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    pub created_at: YearMonth,
    pub valid_to:   YearMonth,
    /// Revealed attributes. The proof part of the credential shows that they
    /// are the values signed by the identity provider.
    #[serde(rename = "revealedAttributes")]
    pub policy_vec: BTreeMap<AttributeTag, AttributeKind>,
}

impl Serial for Policy {
    fn serial<B: Buffer>(&self, out: &mut B) {
        out.put(&self.created_at);
        out.put(&self.valid_to);
        out.put(&(self.policy_vec.len() as u16));
        serial_map_no_length(&self.policy_vec, out)
    }
}

impl Deserial for Policy {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let created_at = source.get()?;
        let valid_to = source.get()?;
        let len: u16 = source.get()?;
        let policy_vec = deserial_map_no_length(source, usize::from(len))?;
        Ok(Policy {
            created_at,
            valid_to,
            policy_vec,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemeId {
    Ed25519,
}

impl Serial for SchemeId {
    fn serial<B: Buffer>(&self, out: &mut B) {
        match self {
            SchemeId::Ed25519 => out.put(&0u8),
        }
    }
}

impl Deserial for SchemeId {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        match source.read_u8()? {
            0 => Ok(SchemeId::Ed25519),
            x => bail!("Unknown signature scheme {}.", x),
        }
    }
}

/// Verification key of an account.
#[derive(Debug, Clone, Copy, Eq)]
pub enum VerifyKey {
    Ed25519VerifyKey(VerifyingKey),
}

serde_base16!(VerifyKey);

impl From<VerifyingKey> for VerifyKey {
    fn from(pk: VerifyingKey) -> Self { VerifyKey::Ed25519VerifyKey(pk) }
}

impl From<&SigningKey> for VerifyKey {
    fn from(sk: &SigningKey) -> Self { VerifyKey::Ed25519VerifyKey(sk.verifying_key()) }
}

/// Compare byte representation.
impl Ord for VerifyKey {
    fn cmp(&self, other: &VerifyKey) -> Ordering {
        let VerifyKey::Ed25519VerifyKey(ref self_key) = self;
        let VerifyKey::Ed25519VerifyKey(ref other_key) = other;
        self_key.as_bytes().cmp(other_key.as_bytes())
    }
}

impl PartialOrd for VerifyKey {
    fn partial_cmp(&self, other: &VerifyKey) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl PartialEq for VerifyKey {
    fn eq(&self, other: &VerifyKey) -> bool { self.cmp(other) == Ordering::Equal }
}

impl Serial for VerifyKey {
    fn serial<B: Buffer>(&self, out: &mut B) {
        match self {
            VerifyKey::Ed25519VerifyKey(ref key) => {
                out.put(&SchemeId::Ed25519);
                out.put(key);
            }
        }
    }
}

impl Deserial for VerifyKey {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        match source.get()? {
            SchemeId::Ed25519 => Ok(VerifyKey::Ed25519VerifyKey(source.get()?)),
        }
    }
}

/// What account should this credential be deployed to, or the keys of the new
/// account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialAccount {
    ExistingAccount(AccountAddress),
    /// The list of keys must have between 1 and 255 entries so that its
    /// length fits into the count byte.
    NewAccount(Vec<VerifyKey>, SignatureThreshold),
}

impl Serial for CredentialAccount {
    fn serial<B: Buffer>(&self, out: &mut B) {
        match self {
            CredentialAccount::ExistingAccount(ref addr) => {
                out.put(&0u8);
                out.put(addr);
            }
            CredentialAccount::NewAccount(ref keys, threshold) => {
                out.put(&1u8);
                out.put(&(keys.len() as u8));
                serial_vector_no_length(keys, out);
                out.put(threshold);
            }
        }
    }
}

impl Deserial for CredentialAccount {
    fn deserial<R: ReadBytesExt>(cur: &mut R) -> ParseResult<Self> {
        match cur.read_u8()? {
            0 => Ok(CredentialAccount::ExistingAccount(cur.get()?)),
            1 => {
                let len = cur.read_u8()?;
                if len == 0 {
                    bail!("Need at least one key.")
                }
                let keys = deserial_vector_no_length(cur, usize::from(len))?;
                let threshold = cur.get()?;
                Ok(CredentialAccount::NewAccount(keys, threshold))
            }
            _ => bail!("Only two variants of this type exist."),
        }
    }
}

/// Data relating to a single anonymity revoker sent by the account holder to
/// the chain.
#[derive(Debug, PartialEq, Eq, Clone, Copy, SerdeSerialize, SerdeDeserialize)]
#[serde(bound(serialize = "C: Curve", deserialize = "C: Curve"))]
#[serde(rename_all = "camelCase")]
pub struct ChainArData<C: Curve> {
    /// Encryption of `g^{f(i)}` where `i` is the identity of the revoker and
    /// `f` the polynomial sharing IdCredSec.
    pub enc_id_cred_pub_share: Cipher<C>,
}

impl<C: Curve> Serial for ChainArData<C> {
    fn serial<B: Buffer>(&self, out: &mut B) { out.put(&self.enc_id_cred_pub_share) }
}

impl<C: Curve> Deserial for ChainArData<C> {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        Ok(ChainArData {
            enc_id_cred_pub_share: source.get()?,
        })
    }
}

/// Values (as opposed to proofs) in credential deployment.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct CredentialDeploymentValues<C: Curve> {
    /// Account this credential belongs to. Either an existing account, or keys
    /// of a new account.
    pub cred_account: CredentialAccount,
    /// Credential registration id of the credential.
    pub reg_id:       C,
    /// Identity of the identity provider who signed the identity object from
    /// which this credential is derived.
    pub ip_identity:  IpIdentity,
    /// Anonymity revocation threshold. Must be <= length of ar_data.
    pub threshold:    Threshold,
    /// Anonymity revocation data, one entry per chosen anonymity revoker.
    pub ar_data:      BTreeMap<ArIdentity, ChainArData<C>>,
    /// Policy of this credential object.
    pub policy:       Policy,
}

impl<C: Curve> Serial for CredentialDeploymentValues<C> {
    fn serial<B: Buffer>(&self, out: &mut B) {
        out.put(&self.cred_account);
        out.put(&self.reg_id);
        out.put(&self.ip_identity);
        out.put(&self.threshold);
        out.put(&(self.ar_data.len() as u16));
        serial_map_no_length(&self.ar_data, out);
        out.put(&self.policy);
    }
}

impl<C: Curve> Deserial for CredentialDeploymentValues<C> {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let cred_account = source.get()?;
        let reg_id = source.get()?;
        let ip_identity = source.get()?;
        let threshold = source.get()?;
        let len: u16 = source.get()?;
        let ar_data = deserial_map_no_length(source, usize::from(len))?;
        let policy = source.get()?;
        Ok(CredentialDeploymentValues {
            cred_account,
            reg_id,
            ip_identity,
            threshold,
            ar_data,
            policy,
        })
    }
}

/// The commitments sent by the account holder to the chain in order to
/// deploy credentials.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct CredentialDeploymentCommitments<C: Curve> {
    /// commitment to the prf key
    pub cmm_prf: Commitment<C>,
    /// commitment to credential counter
    pub cmm_cred_counter: Commitment<C>,
    /// Commitments to the attributes that are not revealed. Those that are
    /// revealed are checked against the policy directly.
    pub cmm_attributes: BTreeMap<AttributeTag, Commitment<C>>,
    /// commitments to the coefficients of the polynomial
    /// used to share id_cred_sec
    /// S + b1 X + b2 X^2...
    /// where S is id_cred_sec
    pub cmm_id_cred_sec_sharing_coeff: Vec<Commitment<C>>,
}

impl<C: Curve> Serial for CredentialDeploymentCommitments<C> {
    fn serial<B: Buffer>(&self, out: &mut B) {
        out.put(&self.cmm_prf);
        out.put(&self.cmm_cred_counter);
        out.put(&(self.cmm_attributes.len() as u16));
        serial_map_no_length(&self.cmm_attributes, out);
        out.put(&(self.cmm_id_cred_sec_sharing_coeff.len() as u32));
        serial_vector_no_length(&self.cmm_id_cred_sec_sharing_coeff, out);
    }
}

impl<C: Curve> Deserial for CredentialDeploymentCommitments<C> {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let cmm_prf = source.get()?;
        let cmm_cred_counter = source.get()?;
        let len: u16 = source.get()?;
        let cmm_attributes = deserial_map_no_length(source, usize::from(len))?;
        let num_coeffs: u32 = source.get()?;
        let cmm_id_cred_sec_sharing_coeff = deserial_vector_no_length(source, num_coeffs as usize)?;
        Ok(CredentialDeploymentCommitments {
            cmm_prf,
            cmm_cred_counter,
            cmm_attributes,
            cmm_id_cred_sec_sharing_coeff,
        })
    }
}

/// Proofs of knowledge of the secret keys of a new account, indexed by the
/// position of the key in the account's key list. Empty when the credential
/// is deployed onto an existing account.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct AccountOwnershipProof {
    pub proofs: BTreeMap<KeyIndex, Ed25519DlogProof>,
}

// The number of proofs is encoded in a single byte.
impl Serial for AccountOwnershipProof {
    fn serial<B: Buffer>(&self, out: &mut B) {
        out.put(&(self.proofs.len() as u8));
        serial_map_no_length(&self.proofs, out)
    }
}

impl Deserial for AccountOwnershipProof {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let len: u8 = source.get()?;
        let proofs = deserial_map_no_length(source, usize::from(len))?;
        Ok(AccountOwnershipProof { proofs })
    }
}

impl AccountOwnershipProof {
    pub fn num_proofs(&self) -> usize { self.proofs.len() }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct CredDeploymentProofs<P: Pairing, C: Curve<Scalar = P::ScalarField>> {
    /// (Blinded) Signature derived from the signature on the pre-identity
    /// object by the IP
    pub sig: ps_sig::BlindedSignature<P>,
    /// list of commitments to the attributes.
    pub commitments: CredentialDeploymentCommitments<C>,
    /// Challenge shared by all the sigma protocols below.
    pub challenge: Challenge,
    /// Responses of the proofs that the encrypted shares of IdCredPub and the
    /// commitments to the shares hide the same values, one per revoker.
    pub proof_id_cred_pub: BTreeMap<ArIdentity, com_enc_eq::Response<C>>,
    /// Response of the proof of knowledge of the signature of the identity
    /// provider on the message.
    pub proof_ip_sig: com_eq_sig::Response<P, C>,
    /// Response of the proof that `reg_id` is derived from the signed PRF
    /// key.
    pub proof_reg_id: com_mult::Response<C>,
    /// Proof of knowledge of the secret keys of a new account.
    pub proof_acc_sk: AccountOwnershipProof,
}

// The proofs are preceded by their total length so that a reader that does
// not understand them can skip them.
impl<P: Pairing, C: Curve<Scalar = P::ScalarField>> Serial for CredDeploymentProofs<P, C> {
    fn serial<B: Buffer>(&self, out: &mut B) {
        let mut tmp_out = Vec::new();
        tmp_out.put(&self.sig);
        tmp_out.put(&self.commitments);
        tmp_out.put(&self.challenge);
        tmp_out.put(&(self.proof_id_cred_pub.len() as u16));
        serial_map_no_length(&self.proof_id_cred_pub, &mut tmp_out);
        tmp_out.put(&self.proof_ip_sig);
        tmp_out.put(&self.proof_reg_id);
        tmp_out.put(&self.proof_acc_sk);
        let len: u32 = tmp_out.len() as u32;
        out.put(&len);
        out.write_all(&tmp_out)
            .expect("Writing to buffer should succeed.");
    }
}

impl<P: Pairing, C: Curve<Scalar = P::ScalarField>> Deserial for CredDeploymentProofs<P, C> {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let len: u32 = source.get()?;
        // Make sure to respect the length.
        let mut limited = source.take(u64::from(len));
        let sig = limited.get()?;
        let commitments = limited.get()?;
        let challenge = limited.get()?;
        let num_ar_proofs: u16 = limited.get()?;
        let proof_id_cred_pub = deserial_map_no_length(&mut limited, usize::from(num_ar_proofs))?;
        let proof_ip_sig = limited.get()?;
        let proof_reg_id = limited.get()?;
        let proof_acc_sk = limited.get()?;
        if limited.limit() == 0 {
            Ok(CredDeploymentProofs {
                sig,
                commitments,
                challenge,
                proof_id_cred_pub,
                proof_ip_sig,
                proof_reg_id,
                proof_acc_sk,
            })
        } else {
            bail!("Length information is inaccurate. Credential proofs not valid.")
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct CredentialDeploymentInfo<P: Pairing, C: Curve<Scalar = P::ScalarField>> {
    pub values: CredentialDeploymentValues<C>,
    pub proofs: CredDeploymentProofs<P, C>,
}

serde_base16!([P: Pairing, C: Curve<Scalar = P::ScalarField>] CredentialDeploymentInfo<P, C>);

impl<P: Pairing, C: Curve<Scalar = P::ScalarField>> Serial for CredentialDeploymentInfo<P, C> {
    fn serial<B: Buffer>(&self, out: &mut B) {
        out.put(&self.values);
        out.put(&self.proofs);
    }
}

impl<P: Pairing, C: Curve<Scalar = P::ScalarField>> Deserial for CredentialDeploymentInfo<P, C> {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let values = source.get()?;
        let proofs = source.get()?;
        Ok(CredentialDeploymentInfo { values, proofs })
    }
}

/// Keys of an account together with the number of signatures needed to act
/// on it.
#[derive(Debug, PartialEq, Eq, Clone, SerdeSerialize, SerdeDeserialize)]
pub struct CredentialPublicKeys {
    pub keys:      BTreeMap<KeyIndex, VerifyKey>,
    pub threshold: SignatureThreshold,
}

impl Serial for CredentialPublicKeys {
    fn serial<B: Buffer>(&self, out: &mut B) {
        out.put(&(self.keys.len() as u8));
        serial_map_no_length(&self.keys, out);
        out.put(&self.threshold);
    }
}

impl Deserial for CredentialPublicKeys {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let len: u8 = source.get()?;
        ensure!(len > 0, "Need at least one key.");
        let keys = deserial_map_no_length(source, usize::from(len))?;
        let threshold = source.get()?;
        Ok(CredentialPublicKeys { keys, threshold })
    }
}

/// Values of an initial account. The identity provider creates these on
/// behalf of the user and signs them, so there are no proofs.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct InitialCredentialDeploymentValues<C: Curve> {
    /// Keys and threshold of the new account.
    pub cred_account: CredentialPublicKeys,
    /// Registration id of the account, which is the IdCredPub of the user.
    pub reg_id:       C,
    pub ip_identity:  IpIdentity,
    pub policy:       Policy,
}

impl<C: Curve> Serial for InitialCredentialDeploymentValues<C> {
    fn serial<B: Buffer>(&self, out: &mut B) {
        out.put(&self.cred_account);
        out.put(&self.reg_id);
        out.put(&self.ip_identity);
        out.put(&self.policy);
    }
}

impl<C: Curve> Deserial for InitialCredentialDeploymentValues<C> {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let cred_account = source.get()?;
        let reg_id = source.get()?;
        let ip_identity = source.get()?;
        let policy = source.get()?;
        Ok(InitialCredentialDeploymentValues {
            cred_account,
            reg_id,
            ip_identity,
            policy,
        })
    }
}

/// Signature of the identity provider on an initial account, 64 bytes of an
/// ed25519 signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpCdiSignature(pub [u8; ed25519_dalek::SIGNATURE_LENGTH]);

serde_base16!(IpCdiSignature);

impl From<ed25519_dalek::Signature> for IpCdiSignature {
    fn from(sig: ed25519_dalek::Signature) -> Self { IpCdiSignature(sig.to_bytes()) }
}

impl IpCdiSignature {
    pub fn to_signature(&self) -> ed25519_dalek::Signature {
        ed25519_dalek::Signature::from_bytes(&self.0)
    }
}

impl Serial for IpCdiSignature {
    fn serial<B: Buffer>(&self, out: &mut B) {
        out.write_all(&self.0)
            .expect("Writing to buffer should succeed.")
    }
}

impl Deserial for IpCdiSignature {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let mut buf = [0u8; ed25519_dalek::SIGNATURE_LENGTH];
        source.read_exact(&mut buf)?;
        Ok(IpCdiSignature(buf))
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct InitialCredentialDeploymentInfo<C: Curve> {
    pub values: InitialCredentialDeploymentValues<C>,
    pub sig:    IpCdiSignature,
}

serde_base16!([C: Curve] InitialCredentialDeploymentInfo<C>);

impl<C: Curve> Serial for InitialCredentialDeploymentInfo<C> {
    fn serial<B: Buffer>(&self, out: &mut B) {
        out.put(&self.values);
        out.put(&self.sig);
    }
}

impl<C: Curve> Deserial for InitialCredentialDeploymentInfo<C> {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let values = source.get()?;
        let sig = source.get()?;
        Ok(InitialCredentialDeploymentInfo { values, sig })
    }
}

/// Any credential that can be deployed on chain.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum AccountCredential<P: Pairing, C: Curve<Scalar = P::ScalarField>> {
    Initial(InitialCredentialDeploymentInfo<C>),
    Normal(CredentialDeploymentInfo<P, C>),
}

serde_base16!([P: Pairing, C: Curve<Scalar = P::ScalarField>] AccountCredential<P, C>);

impl<P: Pairing, C: Curve<Scalar = P::ScalarField>> Serial for AccountCredential<P, C> {
    fn serial<B: Buffer>(&self, out: &mut B) {
        match self {
            AccountCredential::Initial(icdi) => {
                out.put(&0u8);
                out.put(icdi);
            }
            AccountCredential::Normal(cdi) => {
                out.put(&1u8);
                out.put(cdi);
            }
        }
    }
}

impl<P: Pairing, C: Curve<Scalar = P::ScalarField>> Deserial for AccountCredential<P, C> {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        match source.read_u8()? {
            0 => Ok(AccountCredential::Initial(source.get()?)),
            1 => Ok(AccountCredential::Normal(source.get()?)),
            x => bail!("Unknown credential type {}.", x),
        }
    }
}

/// Parameters shared by all participants.
#[derive(Debug, Clone, PartialEq, Eq, SerdeSerialize, SerdeDeserialize)]
#[serde(bound(serialize = "C: Curve", deserialize = "C: Curve"))]
#[serde(rename_all = "camelCase")]
pub struct GlobalContext<C: Curve> {
    /// A shared commitment key known to the chain and the account holder.
    /// Its first base `g` is also the base of IdCredPub, of registration ids
    /// and of encryption in the exponent.
    pub on_chain_commitment_key: CommitmentKey<C>,
    /// The string the bases were derived from.
    pub genesis_string:          String,
}

impl<C: Curve> GlobalContext<C> {
    /// Derive the commitment key by hashing the genesis string to the group,
    /// so that no one knows the discrete log of `h` with respect to `g`.
    pub fn generate(genesis_string: String) -> Result<Self, CurveDecodingError> {
        let g = C::hash_to_group(format!("{}.g", genesis_string).as_bytes())?;
        let h = C::hash_to_group(format!("{}.h", genesis_string).as_bytes())?;
        Ok(GlobalContext {
            on_chain_commitment_key: CommitmentKey::new(g, h),
            genesis_string,
        })
    }

    /// The generator shared by the identity layer.
    pub fn generator(&self) -> C { self.on_chain_commitment_key.g }
}

impl<C: Curve> Serial for GlobalContext<C> {
    fn serial<B: Buffer>(&self, out: &mut B) {
        out.put(&self.on_chain_commitment_key);
        out.put(&(self.genesis_string.len() as u32));
        serial_string(&self.genesis_string, out)
    }
}

impl<C: Curve> Deserial for GlobalContext<C> {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let on_chain_commitment_key = source.get()?;
        let len: u32 = source.get()?;
        let genesis_string = deserial_string(source, len as usize)?;
        Ok(GlobalContext {
            on_chain_commitment_key,
            genesis_string,
        })
    }
}

/// Free-form description of an identity provider or anonymity revoker.
#[derive(Debug, Clone, PartialEq, Eq, SerdeSerialize, SerdeDeserialize)]
pub struct Description {
    pub name:        String,
    pub url:         String,
    pub description: String,
}

impl Serial for Description {
    fn serial<B: Buffer>(&self, out: &mut B) {
        for s in [&self.name, &self.url, &self.description] {
            out.put(&(s.len() as u32));
            serial_string(s, out);
        }
    }
}

impl Deserial for Description {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let mut read = || -> ParseResult<String> {
            let len: u32 = source.get()?;
            deserial_string(source, len as usize)
        };
        let name = read()?;
        let url = read()?;
        let description = read()?;
        Ok(Description {
            name,
            url,
            description,
        })
    }
}

/// Public information about an identity provider.
#[derive(Debug, Clone, PartialEq, Eq, SerdeSerialize, SerdeDeserialize)]
#[serde(bound(serialize = "P: Pairing", deserialize = "P: Pairing"))]
#[serde(rename_all = "camelCase")]
pub struct IpInfo<P: Pairing> {
    /// Unique identifier of the identity provider.
    pub ip_identity:       IpIdentity,
    /// Free form description, e.g., how to contact them off-chain
    pub ip_description:    Description,
    /// PS public key of the IP
    pub ip_verify_key:     ps_sig::PublicKey<P>,
    /// Key the IP signs initial accounts with.
    #[serde(serialize_with = "base16_encode", deserialize_with = "base16_decode")]
    pub ip_cdi_verify_key: VerifyingKey,
}

impl<P: Pairing> Serial for IpInfo<P> {
    fn serial<B: Buffer>(&self, out: &mut B) {
        out.put(&self.ip_identity);
        out.put(&self.ip_description);
        out.put(&self.ip_verify_key);
        out.put(&self.ip_cdi_verify_key);
    }
}

impl<P: Pairing> Deserial for IpInfo<P> {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let ip_identity = source.get()?;
        let ip_description = source.get()?;
        let ip_verify_key = source.get()?;
        let ip_cdi_verify_key = source.get()?;
        Ok(IpInfo {
            ip_identity,
            ip_description,
            ip_verify_key,
            ip_cdi_verify_key,
        })
    }
}

/// Public and private keys of an identity provider.
pub struct IpData<P: Pairing> {
    pub public_ip_info:    IpInfo<P>,
    pub ip_secret_key:     ps_sig::SecretKey<P>,
    pub ip_cdi_secret_key: SigningKey,
}

/// Public information about an anonymity revoker.
#[derive(Debug, Clone, PartialEq, Eq, SerdeSerialize, SerdeDeserialize)]
#[serde(bound(serialize = "C: Curve", deserialize = "C: Curve"))]
#[serde(rename_all = "camelCase")]
pub struct ArInfo<C: Curve> {
    /// unique identifier of the anonymity revoker
    pub ar_identity:    ArIdentity,
    /// description of the anonymity revoker (e.g. name, contact number)
    pub ar_description: Description,
    /// elgamal encryption key of the anonymity revoker
    pub ar_public_key:  elgamal::PublicKey<C>,
}

impl<C: Curve> Serial for ArInfo<C> {
    fn serial<B: Buffer>(&self, out: &mut B) {
        out.put(&self.ar_identity);
        out.put(&self.ar_description);
        out.put(&self.ar_public_key);
    }
}

impl<C: Curve> Deserial for ArInfo<C> {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let ar_identity = source.get()?;
        let ar_description = source.get()?;
        let ar_public_key = source.get()?;
        Ok(ArInfo {
            ar_identity,
            ar_description,
            ar_public_key,
        })
    }
}

/// The secret credential of a user. Raising the shared generator to it gives
/// IdCredPub.
#[derive(Debug, Clone)]
pub struct IdCredentials<C: Curve> {
    pub id_cred_sec: Value<C>,
}

impl<C: Curve> IdCredentials<C> {
    pub fn generate<R: Rng>(csprng: &mut R) -> Self {
        IdCredentials {
            id_cred_sec: Value::generate_non_zero(csprng),
        }
    }

    pub fn id_cred_pub(&self, global_context: &GlobalContext<C>) -> C {
        global_context.generator().mul_by_scalar(&self.id_cred_sec)
    }
}

/// Private credential holder information. A user maintains these
/// through many different interactions with the identity provider and
/// the chain.
#[derive(Debug, Clone)]
pub struct CredentialHolderInfo<C: Curve> {
    pub id_cred: IdCredentials<C>,
}

/// Private data chosen by the credential holder before the interaction with
/// the identity provider.
#[derive(Debug, Clone)]
pub struct AccCredentialInfo<C: Curve> {
    pub cred_holder_info: CredentialHolderInfo<C>,
    /// Chosen prf key of the credential holder.
    pub prf_key:          Value<C>,
}

/// The anonymity revokers chosen by the user and the number of them needed
/// to revoke anonymity.
#[derive(Debug, Clone, PartialEq, Eq, SerdeSerialize, SerdeDeserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceArParameters {
    pub ar_identities: BTreeSet<ArIdentity>,
    pub threshold:     Threshold,
}

impl Serial for ChoiceArParameters {
    fn serial<B: Buffer>(&self, out: &mut B) {
        out.put(&(self.ar_identities.len() as u32));
        serial_iter(self.ar_identities.iter(), out);
        out.put(&self.threshold);
    }
}

impl Deserial for ChoiceArParameters {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let len: u32 = source.get()?;
        let ids: Vec<ArIdentity> = deserial_vector_no_length(source, len as usize)?;
        ensure!(
            ids.windows(2).all(|w| w[0] < w[1]),
            "Anonymity revoker identities not in increasing order."
        );
        let threshold = source.get()?;
        Ok(ChoiceArParameters {
            ar_identities: ids.into_iter().collect(),
            threshold,
        })
    }
}

/// Information sent from the account holder to the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreIdentityObject<P: Pairing, C: Curve<Scalar = P::ScalarField>> {
    /// Public credential of the account holder.
    pub id_cred_pub:          C,
    pub choice_ar_parameters: ChoiceArParameters,
    /// Commitment to IdCredSec and the PRF key under the bases of the
    /// identity provider's key. The provider extends it with the messages it
    /// knows and signs the result.
    pub cmm_msg:              ps_sig::UnknownMessage<P>,
    /// Proof that the first value in `cmm_msg` is the discrete log of
    /// `id_cred_pub`.
    pub proof:                SigmaProof<vcom_eq::Response<P::G1>>,
}

serde_base16!([P: Pairing, C: Curve<Scalar = P::ScalarField>] PreIdentityObject<P, C>);

impl<P: Pairing, C: Curve<Scalar = P::ScalarField>> Serial for PreIdentityObject<P, C> {
    fn serial<B: Buffer>(&self, out: &mut B) {
        out.put(&self.id_cred_pub);
        out.put(&self.choice_ar_parameters);
        out.put(&self.cmm_msg);
        out.put(&self.proof);
    }
}

impl<P: Pairing, C: Curve<Scalar = P::ScalarField>> Deserial for PreIdentityObject<P, C> {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let id_cred_pub = source.get()?;
        let choice_ar_parameters = source.get()?;
        let cmm_msg = source.get()?;
        let proof = source.get()?;
        Ok(PreIdentityObject {
            id_cred_pub,
            choice_ar_parameters,
            cmm_msg,
            proof,
        })
    }
}

/// What the account holder keeps after a successful request: the request,
/// the attributes the identity provider signed, and the signature, which
/// still has to be unblinded with the randomness of `cmm_msg`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityObject<P: Pairing, C: Curve<Scalar = P::ScalarField>> {
    pub pre_identity_object: PreIdentityObject<P, C>,
    pub alist:               AttributeList,
    pub signature:           ps_sig::BlindedSignature<P>,
}

impl<P: Pairing, C: Curve<Scalar = P::ScalarField>> Serial for IdentityObject<P, C> {
    fn serial<B: Buffer>(&self, out: &mut B) {
        out.put(&self.pre_identity_object);
        out.put(&self.alist);
        out.put(&self.signature);
    }
}

impl<P: Pairing, C: Curve<Scalar = P::ScalarField>> Deserial for IdentityObject<P, C> {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let pre_identity_object = source.get()?;
        let alist = source.get()?;
        let signature = source.get()?;
        Ok(IdentityObject {
            pre_identity_object,
            alist,
            signature,
        })
    }
}

/// Private data the account holder needs to create credentials from an
/// identity object.
pub struct IdObjectUseData<P: Pairing, C: Curve<Scalar = P::ScalarField>> {
    pub aci:        AccCredentialInfo<C>,
    /// Randomness of the commitment in the pre-identity object, needed to
    /// unblind the signature.
    pub randomness: ps_sig::SigRetrievalRandomness<P>,
}

/// Context of an interaction with an identity provider: its public
/// information, the anonymity revokers it supports, and the global
/// parameters.
pub struct IpContext<'a, P: Pairing, C: Curve<Scalar = P::ScalarField>> {
    pub ip_info:        &'a IpInfo<P>,
    pub ars_infos:      &'a BTreeMap<ArIdentity, ArInfo<C>>,
    pub global_context: &'a GlobalContext<C>,
}

impl<'a, P: Pairing, C: Curve<Scalar = P::ScalarField>> Clone for IpContext<'a, P, C> {
    fn clone(&self) -> Self { *self }
}

impl<'a, P: Pairing, C: Curve<Scalar = P::ScalarField>> Copy for IpContext<'a, P, C> {}

impl<'a, P: Pairing, C: Curve<Scalar = P::ScalarField>> IpContext<'a, P, C> {
    pub fn new(
        ip_info: &'a IpInfo<P>,
        ars_infos: &'a BTreeMap<ArIdentity, ArInfo<C>>,
        global_context: &'a GlobalContext<C>,
    ) -> Self {
        IpContext {
            ip_info,
            ars_infos,
            global_context,
        }
    }
}

/// Secret keys of an account and its signature threshold.
pub struct CredentialData {
    pub keys:      BTreeMap<KeyIndex, SigningKey>,
    pub threshold: SignatureThreshold,
}

impl CredentialData {
    /// The public keys and threshold of the account.
    pub fn get_cred_key_info(&self) -> CredentialPublicKeys {
        let keys = self
            .keys
            .iter()
            .map(|(idx, kp)| (*idx, VerifyKey::from(kp)))
            .collect();
        CredentialPublicKeys {
            keys,
            threshold: self.threshold,
        }
    }

    /// The keys as the key list of a new account, in index order.
    pub fn new_account(&self) -> CredentialAccount {
        let keys = self.keys.values().map(VerifyKey::from).collect();
        CredentialAccount::NewAccount(keys, self.threshold)
    }
}
