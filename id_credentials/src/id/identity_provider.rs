//! Functionality of the identity provider: checking requests for identity
//! objects, signing them, and signing initial accounts.
use super::{account_holder::pio_transcript, constants::*, types::*, utils};
use crate::{
    common::types::TransactionTime,
    curve_arithmetic::{Curve, Field, Pairing},
    pedersen_commitment::{Commitment, VecCommitmentKey},
    ps_sig,
    sigma_protocols::{common::verify, vcom_eq::VecComDlogEq},
};
use ed25519_dalek::{Signer, SigningKey};
use log::{debug, info};
use rand::*;
use std::collections::BTreeMap;
use thiserror::Error;

/// Reasons for rejecting a request for an identity object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Reason {
    #[error("The proof of knowledge of IdCredSec does not verify.")]
    IncorrectProof,
    #[error("Anonymity revoker {0} is not supported by the identity provider.")]
    UnknownAr(ArIdentity),
    #[error("The revocation threshold is larger than the number of anonymity revokers.")]
    WrongArParameters,
    #[error("The attribute list does not fit into the signature key.")]
    TooManyAttributes,
    #[error("The validity period of the attribute list is empty.")]
    InvalidValidity,
}

/// Check a request and, if it is valid, sign the user's values together
/// with the attributes. The user unmasks the result with the randomness
/// returned by [generate_pio](super::account_holder::generate_pio).
pub fn verify_credentials<P: Pairing, C: Curve<Scalar = P::ScalarField>, R: Rng>(
    pre_id_obj: &PreIdentityObject<P, C>,
    context: IpContext<P, C>,
    alist: &AttributeList,
    ip_secret_key: &ps_sig::SecretKey<P>,
    csprng: &mut R,
) -> Result<ps_sig::BlindedSignature<P>, Reason> {
    let res = validate_request(pre_id_obj, context, alist)
        .map(|()| sign_identity_object(pre_id_obj, context.ip_info, alist, ip_secret_key, csprng));
    match res {
        Ok(Some(sig)) => {
            info!(
                "Signed identity object with {} attributes.",
                alist.alist.len()
            );
            Ok(sig)
        }
        Ok(None) => {
            debug!("Rejecting identity object request: {}", Reason::TooManyAttributes);
            Err(Reason::TooManyAttributes)
        }
        Err(e) => {
            debug!("Rejecting identity object request: {}", e);
            Err(e)
        }
    }
}

/// Check the request without signing it.
pub fn validate_request<P: Pairing, C: Curve<Scalar = P::ScalarField>>(
    pre_id_obj: &PreIdentityObject<P, C>,
    context: IpContext<P, C>,
    alist: &AttributeList,
) -> Result<(), Reason> {
    let ar_params = &pre_id_obj.choice_ar_parameters;
    if let Some(ar) = ar_params
        .ar_identities
        .iter()
        .find(|ar| !context.ars_infos.contains_key(ar))
    {
        return Err(Reason::UnknownAr(*ar));
    }
    if !utils::check_ar_parameters(&ar_params.ar_identities, ar_params.threshold) {
        return Err(Reason::WrongArParameters);
    }
    if alist.created_at > alist.valid_to {
        return Err(Reason::InvalidValidity);
    }
    let ip_pub_key = &context.ip_info.ip_verify_key;
    if let Some(tag) = alist.alist.keys().max() {
        if tag.message_index() >= ip_pub_key.len() {
            return Err(Reason::TooManyAttributes);
        }
    }
    if ip_pub_key.len() < NUM_PREFIX_MESSAGES {
        return Err(Reason::TooManyAttributes);
    }

    let key = VecCommitmentKey::new(vec![ip_pub_key.ys[0], ip_pub_key.ys[1]], ip_pub_key.g)
        .map_err(|_| Reason::IncorrectProof)?;
    let mut dlogs = BTreeMap::new();
    dlogs.insert(0, (context.global_context.generator(), pre_id_obj.id_cred_pub));
    let statement: VecComDlogEq<P::G1, C> = VecComDlogEq {
        comm: Commitment(pre_id_obj.cmm_msg.0),
        key,
        dlogs,
    };
    let mut ro = pio_transcript(&context, ar_params);
    if !verify(&mut ro, &statement, &pre_id_obj.proof) {
        return Err(Reason::IncorrectProof);
    }
    Ok(())
}

/// The messages the identity provider adds to the user's commitment: the
/// public credential values, the anonymity revokers, and the attributes,
/// with zero for tags that are not in the list.
fn known_messages<C: Curve>(
    choice_ar_parameters: &ChoiceArParameters,
    alist: &AttributeList,
) -> Vec<C::Scalar> {
    let num_attributes = alist.alist.keys().max().map_or(0, |t| usize::from(t.0) + 1);
    let mut known = Vec::with_capacity(2 + num_attributes);
    known.push(utils::encode_public_credential_values::<C>(
        alist.created_at,
        alist.valid_to,
        choice_ar_parameters.threshold,
    ));
    known.push(utils::encode_ars::<C>(&choice_ar_parameters.ar_identities));
    for tag in (0..num_attributes).map(|t| AttributeTag(t as u8)) {
        known.push(
            alist
                .alist
                .get(&tag)
                .map_or_else(C::Scalar::zero, |v| v.to_field_element::<C>()),
        );
    }
    known
}

fn sign_identity_object<P: Pairing, C: Curve<Scalar = P::ScalarField>, R: Rng>(
    pre_id_obj: &PreIdentityObject<P, C>,
    ip_info: &IpInfo<P>,
    alist: &AttributeList,
    ip_secret_key: &ps_sig::SecretKey<P>,
    csprng: &mut R,
) -> Option<ps_sig::BlindedSignature<P>> {
    let known = known_messages::<C>(&pre_id_obj.choice_ar_parameters, alist);
    // IdCredSec and the PRF key are under the first two bases.
    let message = pre_id_obj
        .cmm_msg
        .extend_with_known(&ip_info.ip_verify_key.ys, 2, &known)?;
    Some(ip_secret_key.sign_unknown_message(&message, csprng))
}

/// Sign the values of an initial account. The account expires, and cannot be
/// created, after `expiry`.
pub fn sign_initial_credential<C: Curve>(
    ip_cdi_secret_key: &SigningKey,
    values: &InitialCredentialDeploymentValues<C>,
    expiry: TransactionTime,
) -> IpCdiSignature {
    let message = utils::initial_credential_message(expiry, values);
    ip_cdi_secret_key.sign(&message).into()
}

/// Create an initial account for the given registration id and keys. Only
/// the validity period of the attribute list is disclosed.
pub fn create_initial_cdi<P: Pairing, C: Curve<Scalar = P::ScalarField>>(
    ip_info: &IpInfo<P>,
    reg_id: C,
    cred_account: CredentialPublicKeys,
    alist: &AttributeList,
    expiry: TransactionTime,
    ip_cdi_secret_key: &SigningKey,
) -> InitialCredentialDeploymentInfo<C> {
    let values = InitialCredentialDeploymentValues {
        cred_account,
        reg_id,
        ip_identity: ip_info.ip_identity,
        policy: Policy {
            created_at: alist.created_at,
            valid_to:   alist.valid_to,
            policy_vec: BTreeMap::new(),
        },
    };
    let sig = sign_initial_credential(ip_cdi_secret_key, &values, expiry);
    InitialCredentialDeploymentInfo { values, sig }
}
