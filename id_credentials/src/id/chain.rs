//! Verification of credentials as done by the chain.
use super::{constants::*, secret_sharing::Threshold, types::*, utils};
use crate::{
    common::{to_bytes, types::{KeyIndex, TransactionTime}},
    curve_arithmetic::{Curve, Field, Pairing},
    eddsa_ed25519::verify_dlog_ed25519,
    pedersen_commitment::{Commitment, CommitmentKey},
    ps_sig,
    random_oracle::RandomOracle,
    sigma_protocols::{
        com_enc_eq::ComEncEq,
        com_eq_sig::{ComEqSig, MessageHandling},
        com_mult::ComMult,
        common::*,
    },
};
use ed25519_dalek::Verifier;
use either::Either;
use log::{debug, warn};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Broad classes of reasons for rejecting a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CDIErrorKind {
    /// The credential is inconsistent with itself or with the context it is
    /// verified in. No cryptography was needed to find out.
    Malformed,
    /// A proof or signature does not verify.
    Cryptographic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CDIVerificationError {
    #[error("The credential expired at {expiry} but the time is {now}.")]
    Expired { expiry: u64, now: u64 },
    #[error("The credential is not for the given account.")]
    AccountMismatch,
    #[error("Invalid account keys: {0}.")]
    AccountKeys(&'static str),
    #[error("Invalid anonymity revocation data: {0}.")]
    AR(&'static str),
    #[error("Anonymity revoker {0} is not known.")]
    UnknownAr(ArIdentity),
    #[error("The credential is from identity provider {got}, not {expected}.")]
    IpIdentity {
        expected: IpIdentity,
        got:      IpIdentity,
    },
    #[error("The {0} is the identity element.")]
    IdentityElement(&'static str),
    #[error("Invalid policy: {0}.")]
    Policy(&'static str),
    #[error("The proof of the credential does not verify.")]
    Proof,
    #[error("The proof of ownership of key {0} does not verify.")]
    AccountOwnership(KeyIndex),
    #[error("The signature of the identity provider does not verify.")]
    Signature,
}

impl CDIVerificationError {
    pub fn kind(&self) -> CDIErrorKind {
        use CDIVerificationError::*;
        match self {
            Proof | AccountOwnership(_) | Signature => CDIErrorKind::Cryptographic,
            Expired { .. }
            | AccountMismatch
            | AccountKeys(_)
            | AR(_)
            | UnknownAr(_)
            | IpIdentity { .. }
            | IdentityElement(_)
            | Policy(_) => CDIErrorKind::Malformed,
        }
    }
}

fn log_rejection(e: &CDIVerificationError) {
    match e.kind() {
        CDIErrorKind::Malformed => debug!("Rejecting malformed credential: {}", e),
        CDIErrorKind::Cryptographic => warn!("Rejecting credential: {}", e),
    }
}

/// The combined statement proven by a credential: the registration id is
/// derived from the signed PRF key, the identity provider signed the
/// committed and revealed values, and the encrypted shares are shares of
/// IdCredSec.
pub(crate) type CredentialStatement<P, C> = AndAdapter<
    AndAdapter<ComMult<C>, ComEqSig<P, C>>,
    ReplicateAdapter<ComEncEq<C>>,
>;

/// Verify a credential deployment.
///
/// With `Left(expiry)` the credential creates a new account and is rejected
/// if `now` is past `expiry`. With `Right(address)` it is added to an
/// existing account, and there is no expiry. Either is bound into the proof,
/// so the credential cannot be used for anything else.
///
/// `known_ars` only needs to be a superset of the revokers in the
/// credential.
pub fn verify_cdi<P: Pairing, C: Curve<Scalar = P::ScalarField>>(
    global_context: &GlobalContext<C>,
    ip_info: &IpInfo<P>,
    known_ars: &BTreeMap<ArIdentity, ArInfo<C>>,
    cdi: &CredentialDeploymentInfo<P, C>,
    new_or_existing: &Either<TransactionTime, AccountAddress>,
    now: TransactionTime,
) -> Result<(), CDIVerificationError> {
    let res = verify_cdi_worker(global_context, ip_info, known_ars, cdi, new_or_existing, now);
    if let Err(ref e) = res {
        log_rejection(e);
    }
    res
}

/// Like [verify_cdi], but only reports whether the credential is valid.
pub fn verify_credential<P: Pairing, C: Curve<Scalar = P::ScalarField>>(
    global_context: &GlobalContext<C>,
    ip_info: &IpInfo<P>,
    known_ars: &BTreeMap<ArIdentity, ArInfo<C>>,
    cdi: &CredentialDeploymentInfo<P, C>,
    new_or_existing: &Either<TransactionTime, AccountAddress>,
    now: TransactionTime,
) -> bool {
    verify_cdi(global_context, ip_info, known_ars, cdi, new_or_existing, now).is_ok()
}

fn verify_cdi_worker<P: Pairing, C: Curve<Scalar = P::ScalarField>>(
    global_context: &GlobalContext<C>,
    ip_info: &IpInfo<P>,
    known_ars: &BTreeMap<ArIdentity, ArInfo<C>>,
    cdi: &CredentialDeploymentInfo<P, C>,
    new_or_existing: &Either<TransactionTime, AccountAddress>,
    now: TransactionTime,
) -> Result<(), CDIVerificationError> {
    let values = &cdi.values;
    let proofs = &cdi.proofs;
    let keys = check_account(&values.cred_account, &proofs.proof_acc_sk, new_or_existing, now)?;
    check_ar_data(known_ars, values, &proofs.commitments, &proofs.proof_id_cred_pub)?;
    if values.ip_identity != ip_info.ip_identity {
        return Err(CDIVerificationError::IpIdentity {
            expected: ip_info.ip_identity,
            got:      values.ip_identity,
        });
    }
    if values.reg_id.is_zero_point() {
        return Err(CDIVerificationError::IdentityElement("registration id"));
    }
    if proofs.sig.sig.0.is_zero_point() {
        return Err(CDIVerificationError::IdentityElement("signature"));
    }
    check_policy(&values.policy, &proofs.commitments, &ip_info.ip_verify_key)?;

    let statement = credential_statement(
        global_context,
        known_ars,
        &ip_info.ip_verify_key,
        values,
        &proofs.commitments,
        &proofs.sig,
    )?;
    let proof = SigmaProof {
        challenge: proofs.challenge,
        response:  AndResponse {
            r1: AndResponse {
                r1: proofs.proof_reg_id.clone(),
                r2: proofs.proof_ip_sig.clone(),
            },
            r2: ReplicateResponse {
                responses: proofs.proof_id_cred_pub.values().cloned().collect(),
            },
        },
    };
    let mut ro = credential_transcript(
        global_context,
        ip_info,
        known_ars,
        values,
        &proofs.commitments,
        new_or_existing,
    );
    if !verify(&mut ro, &statement, &proof) {
        return Err(CDIVerificationError::Proof);
    }

    // Each key proof is made on its own split of the transcript, after the
    // main proof.
    for (idx, (key, key_proof)) in keys.iter().zip(proofs.proof_acc_sk.proofs.values()).enumerate() {
        let idx = KeyIndex(idx as u8);
        let VerifyKey::Ed25519VerifyKey(key) = key;
        let mut key_ro = ro.split();
        key_ro.append_message(b"key_index", &idx);
        if !verify_dlog_ed25519(&mut key_ro, key, key_proof) {
            return Err(CDIVerificationError::AccountOwnership(idx));
        }
    }
    Ok(())
}

/// Check that the credential's account matches `new_or_existing`, and that a
/// new account has a usable key list with one ownership proof per key.
/// Returns the keys whose ownership must be proven.
fn check_account<'a>(
    cred_account: &'a CredentialAccount,
    proof_acc_sk: &AccountOwnershipProof,
    new_or_existing: &Either<TransactionTime, AccountAddress>,
    now: TransactionTime,
) -> Result<&'a [VerifyKey], CDIVerificationError> {
    match (new_or_existing, cred_account) {
        (Either::Left(expiry), CredentialAccount::NewAccount(keys, threshold)) => {
            if now > *expiry {
                return Err(CDIVerificationError::Expired {
                    expiry: expiry.seconds,
                    now:    now.seconds,
                });
            }
            check_keys(keys.iter(), *threshold)?;
            let expected_indices = (0..keys.len()).map(|i| KeyIndex(i as u8));
            if !proof_acc_sk.proofs.keys().copied().eq(expected_indices) {
                return Err(CDIVerificationError::AccountKeys(
                    "need exactly one ownership proof per key",
                ));
            }
            Ok(keys)
        }
        (Either::Right(addr), CredentialAccount::ExistingAccount(cred_addr)) if addr == cred_addr => {
            if proof_acc_sk.num_proofs() != 0 {
                return Err(CDIVerificationError::AccountKeys(
                    "no ownership proofs are expected for an existing account",
                ));
            }
            Ok(&[])
        }
        _ => Err(CDIVerificationError::AccountMismatch),
    }
}

/// A key list must be non-empty, fit into a count byte, have no repeated
/// keys, and have at least as many keys as the threshold.
fn check_keys<'a>(
    keys: impl ExactSizeIterator<Item = &'a VerifyKey>,
    threshold: SignatureThreshold,
) -> Result<(), CDIVerificationError> {
    let num_keys = keys.len();
    if num_keys == 0 {
        return Err(CDIVerificationError::AccountKeys("an account needs at least one key"));
    }
    if num_keys > usize::from(u8::MAX) {
        return Err(CDIVerificationError::AccountKeys("an account has at most 255 keys"));
    }
    if usize::from(threshold) > num_keys {
        return Err(CDIVerificationError::AccountKeys(
            "the threshold is larger than the number of keys",
        ));
    }
    let distinct = keys.collect::<BTreeSet<_>>();
    if distinct.len() != num_keys {
        return Err(CDIVerificationError::AccountKeys("repeated key"));
    }
    Ok(())
}

fn check_ar_data<C: Curve, R>(
    known_ars: &BTreeMap<ArIdentity, ArInfo<C>>,
    values: &CredentialDeploymentValues<C>,
    commitments: &CredentialDeploymentCommitments<C>,
    proof_id_cred_pub: &BTreeMap<ArIdentity, R>,
) -> Result<(), CDIVerificationError> {
    let threshold = usize::from(values.threshold);
    if values.ar_data.len() < threshold {
        return Err(CDIVerificationError::AR(
            "fewer anonymity revokers than the threshold",
        ));
    }
    // The sharing polynomial has degree threshold - 1.
    if commitments.cmm_id_cred_sec_sharing_coeff.len() != threshold {
        return Err(CDIVerificationError::AR(
            "the threshold does not match the sharing polynomial",
        ));
    }
    if let Some(ar) = values.ar_data.keys().find(|ar| !known_ars.contains_key(ar)) {
        return Err(CDIVerificationError::UnknownAr(*ar));
    }
    if !values.ar_data.keys().eq(proof_id_cred_pub.keys()) {
        return Err(CDIVerificationError::AR(
            "need exactly one share proof per anonymity revoker",
        ));
    }
    Ok(())
}

/// Policy dates must be ordered, the revealed and the committed attributes
/// must be disjoint, and all attributes must fit into the key of the
/// identity provider.
fn check_policy<P: Pairing, C: Curve>(
    policy: &Policy,
    commitments: &CredentialDeploymentCommitments<C>,
    ip_verify_key: &ps_sig::PublicKey<P>,
) -> Result<(), CDIVerificationError> {
    if policy.created_at > policy.valid_to {
        return Err(CDIVerificationError::Policy("validity ends before it starts"));
    }
    if policy
        .policy_vec
        .keys()
        .any(|tag| commitments.cmm_attributes.contains_key(tag))
    {
        return Err(CDIVerificationError::Policy(
            "an attribute is both revealed and committed",
        ));
    }
    let max_tag = policy
        .policy_vec
        .keys()
        .chain(commitments.cmm_attributes.keys())
        .max();
    if let Some(tag) = max_tag {
        if tag.message_index() >= ip_verify_key.len() {
            return Err(CDIVerificationError::Policy(
                "attribute tag not supported by the identity provider",
            ));
        }
    }
    Ok(())
}

/// The transcript the credential proofs are made on. It starts with
/// everything the proofs are about that is not part of the statements
/// themselves.
pub(crate) fn credential_transcript<P: Pairing, C: Curve<Scalar = P::ScalarField>>(
    global_context: &GlobalContext<C>,
    ip_info: &IpInfo<P>,
    known_ars: &BTreeMap<ArIdentity, ArInfo<C>>,
    values: &CredentialDeploymentValues<C>,
    commitments: &CredentialDeploymentCommitments<C>,
    new_or_existing: &Either<TransactionTime, AccountAddress>,
) -> RandomOracle {
    let mut ro = RandomOracle::domain(CREDENTIAL_DOMAIN);
    ro.append_message(b"cred_values", values);
    match new_or_existing {
        Either::Left(expiry) => ro.append_message(b"expiry", expiry),
        Either::Right(addr) => ro.append_message(b"account_address", addr),
    }
    ro.append_message(b"global_context", global_context);
    ro.append_message(b"ip_info", ip_info);
    let ar_infos = values
        .ar_data
        .keys()
        .filter_map(|ar| known_ars.get(ar))
        .collect::<Vec<_>>();
    ro.extend_from(b"ar_infos", ar_infos.iter());
    ro.append_message(b"commitments", commitments);
    ro
}

/// Build the statement of a credential from its public parts. This assumes
/// the structural checks on the credential passed.
pub(crate) fn credential_statement<P: Pairing, C: Curve<Scalar = P::ScalarField>>(
    global_context: &GlobalContext<C>,
    known_ars: &BTreeMap<ArIdentity, ArInfo<C>>,
    ip_verify_key: &ps_sig::PublicKey<P>,
    values: &CredentialDeploymentValues<C>,
    commitments: &CredentialDeploymentCommitments<C>,
    blinded_sig: &ps_sig::BlindedSignature<P>,
) -> Result<CredentialStatement<P, C>, CDIVerificationError> {
    let cmm_key = global_context.on_chain_commitment_key;
    let reg_id_statement = ComMult {
        cmms: [
            commitments.cmm_prf.combine(&commitments.cmm_cred_counter),
            Commitment(values.reg_id),
            Commitment(cmm_key.g),
        ],
        cmm_key,
    };
    let ar_ids = values.ar_data.keys().copied().collect::<BTreeSet<_>>();
    let sig_statement = pok_sig_statement(
        &cmm_key,
        values.threshold,
        &ar_ids,
        &values.policy,
        commitments,
        ip_verify_key,
        blinded_sig,
    )?;
    let share_statements = id_cred_pub_statements(
        &cmm_key,
        known_ars,
        &values.ar_data,
        &commitments.cmm_id_cred_sec_sharing_coeff,
    )?;
    Ok(AndAdapter {
        first:  AndAdapter {
            first:  reg_id_statement,
            second: sig_statement,
        },
        second: share_statements,
    })
}

/// One statement per anonymity revoker: the encrypted share hides the same
/// value as the commitment to the share, which is computed from the
/// commitments to the coefficients of the sharing polynomial.
fn id_cred_pub_statements<C: Curve>(
    cmm_key: &CommitmentKey<C>,
    known_ars: &BTreeMap<ArIdentity, ArInfo<C>>,
    ar_data: &BTreeMap<ArIdentity, ChainArData<C>>,
    cmm_sharing_coeff: &[Commitment<C>],
) -> Result<ReplicateAdapter<ComEncEq<C>>, CDIVerificationError> {
    let mut statements = Vec::with_capacity(ar_data.len());
    for (ar_id, data) in ar_data.iter() {
        let ar_info = known_ars
            .get(ar_id)
            .ok_or(CDIVerificationError::UnknownAr(*ar_id))?;
        let cmm_share = utils::commitment_to_share(&ar_id.to_scalar::<C>(), cmm_sharing_coeff);
        statements.push(ComEncEq {
            cipher: data.enc_id_cred_pub_share,
            commitment: cmm_share,
            pub_key: ar_info.ar_public_key,
            cmm_key: *cmm_key,
            encryption_in_exponent_generator: cmm_key.g,
        });
    }
    ReplicateAdapter::new(statements).ok_or(CDIVerificationError::AR("no anonymity revokers"))
}

/// The statement about the signature of the identity provider. The signed
/// messages are, in order, IdCredSec (the constant coefficient of the
/// sharing polynomial), the PRF key, the public credential values, the
/// anonymity revokers, and then the attributes by tag. Attributes in the
/// policy are revealed, the others are committed, and tags with neither are
/// zero.
fn pok_sig_statement<P: Pairing, C: Curve<Scalar = P::ScalarField>>(
    cmm_key: &CommitmentKey<C>,
    threshold: Threshold,
    ar_ids: &BTreeSet<ArIdentity>,
    policy: &Policy,
    commitments: &CredentialDeploymentCommitments<C>,
    ip_verify_key: &ps_sig::PublicKey<P>,
    blinded_sig: &ps_sig::BlindedSignature<P>,
) -> Result<ComEqSig<P, C>, CDIVerificationError> {
    let cmm_id_cred_sec = commitments
        .cmm_id_cred_sec_sharing_coeff
        .first()
        .ok_or(CDIVerificationError::AR("no sharing coefficients"))?;
    let max_tag = policy
        .policy_vec
        .keys()
        .chain(commitments.cmm_attributes.keys())
        .max()
        .copied();
    let num_attributes = max_tag.map_or(0, |t| usize::from(t.0) + 1);
    let mut msgs_handling = Vec::with_capacity(NUM_PREFIX_MESSAGES + num_attributes);
    msgs_handling.push(MessageHandling::EqualToCommitment(*cmm_id_cred_sec));
    msgs_handling.push(MessageHandling::EqualToCommitment(commitments.cmm_prf));
    msgs_handling.push(MessageHandling::Revealed(
        utils::encode_public_credential_values::<C>(policy.created_at, policy.valid_to, threshold),
    ));
    msgs_handling.push(MessageHandling::Revealed(utils::encode_ars::<C>(ar_ids)));
    for tag in (0..num_attributes).map(|t| AttributeTag(t as u8)) {
        let handling = match (
            policy.policy_vec.get(&tag),
            commitments.cmm_attributes.get(&tag),
        ) {
            (Some(value), _) => MessageHandling::Revealed(value.to_field_element::<C>()),
            (None, Some(cmm)) => MessageHandling::EqualToCommitment(*cmm),
            (None, None) => MessageHandling::Revealed(C::Scalar::zero()),
        };
        msgs_handling.push(handling);
    }
    Ok(ComEqSig {
        blinded_sig: blinded_sig.clone(),
        msgs_handling,
        ps_pub_key: ip_verify_key.clone(),
        comm_key: *cmm_key,
    })
}

/// Verify an initial credential, signed by the identity provider on behalf
/// of the user. The signature is on the SHA-256 hash of the expiry followed
/// by the values.
pub fn verify_initial_cdi<P: Pairing, C: Curve<Scalar = P::ScalarField>>(
    ip_info: &IpInfo<P>,
    icdi: &InitialCredentialDeploymentInfo<C>,
    expiry: TransactionTime,
    now: TransactionTime,
) -> Result<(), CDIVerificationError> {
    let res = verify_initial_cdi_worker(ip_info, icdi, expiry, now);
    if let Err(ref e) = res {
        log_rejection(e);
    }
    res
}

fn verify_initial_cdi_worker<P: Pairing, C: Curve<Scalar = P::ScalarField>>(
    ip_info: &IpInfo<P>,
    icdi: &InitialCredentialDeploymentInfo<C>,
    expiry: TransactionTime,
    now: TransactionTime,
) -> Result<(), CDIVerificationError> {
    let values = &icdi.values;
    if values.ip_identity != ip_info.ip_identity {
        return Err(CDIVerificationError::IpIdentity {
            expected: ip_info.ip_identity,
            got:      values.ip_identity,
        });
    }
    if now > expiry {
        return Err(CDIVerificationError::Expired {
            expiry: expiry.seconds,
            now:    now.seconds,
        });
    }
    check_keys(
        values.cred_account.keys.values(),
        values.cred_account.threshold,
    )?;
    if values.policy.created_at > values.policy.valid_to {
        return Err(CDIVerificationError::Policy("validity ends before it starts"));
    }
    let signed = utils::initial_credential_message(expiry, values);
    ip_info
        .ip_cdi_verify_key
        .verify(&signed, &icdi.sig.to_signature())
        .map_err(|_| CDIVerificationError::Signature)
}

/// Verify any credential. Initial credentials always create a new account,
/// so they are rejected with `Right(address)`.
pub fn verify_account_credential<P: Pairing, C: Curve<Scalar = P::ScalarField>>(
    global_context: &GlobalContext<C>,
    ip_info: &IpInfo<P>,
    known_ars: &BTreeMap<ArIdentity, ArInfo<C>>,
    credential: &AccountCredential<P, C>,
    new_or_existing: &Either<TransactionTime, AccountAddress>,
    now: TransactionTime,
) -> Result<(), CDIVerificationError> {
    match credential {
        AccountCredential::Initial(icdi) => match new_or_existing {
            Either::Left(expiry) => verify_initial_cdi(ip_info, icdi, *expiry, now),
            Either::Right(_) => {
                let e = CDIVerificationError::AccountMismatch;
                log_rejection(&e);
                Err(e)
            }
        },
        AccountCredential::Normal(cdi) => {
            verify_cdi(global_context, ip_info, known_ars, cdi, new_or_existing, now)
        }
    }
}

/// Verify many credentials in parallel. The identity provider of each
/// credential is looked up by its identity, and a credential from an unknown
/// provider is invalid. The result has one entry per credential, in order.
pub fn verify_cdi_batch<P: Pairing, C: Curve<Scalar = P::ScalarField>>(
    global_context: &GlobalContext<C>,
    ip_infos: &BTreeMap<IpIdentity, IpInfo<P>>,
    known_ars: &BTreeMap<ArIdentity, ArInfo<C>>,
    cdis: &[(CredentialDeploymentInfo<P, C>, Either<TransactionTime, AccountAddress>)],
    now: TransactionTime,
) -> Vec<bool> {
    cdis.par_iter()
        .map(|(cdi, new_or_existing)| match ip_infos.get(&cdi.values.ip_identity) {
            Some(ip_info) => {
                verify_credential(global_context, ip_info, known_ars, cdi, new_or_existing, now)
            }
            None => {
                debug!(
                    "Rejecting credential from unknown identity provider {}.",
                    cdi.values.ip_identity
                );
                false
            }
        })
        .collect()
}

/// Hash of a credential, as used to identify it in logs.
pub fn credential_hash<P: Pairing, C: Curve<Scalar = P::ScalarField>>(
    cdi: &CredentialDeploymentInfo<P, C>,
) -> String {
    use sha2::{Digest, Sha256};
    hex::encode(Sha256::digest(to_bytes(cdi)))
}
