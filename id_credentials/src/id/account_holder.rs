//! Functionality used by the account holder: requesting an identity from an
//! identity provider, and deploying credentials derived from it.
use super::{chain, constants::*, secret_sharing::*, types::*, utils};
use crate::{
    common::types::{KeyIndex, TransactionTime},
    curve_arithmetic::{Curve, Field, Pairing, Value},
    eddsa_ed25519::prove_dlog_ed25519,
    pedersen_commitment::{Randomness as PedersenRandomness, VecCommitmentKey},
    ps_sig::SigRetrievalRandomness,
    random_oracle::RandomOracle,
    sigma_protocols::{
        com_enc_eq::ComEncEqSecret,
        com_eq_sig::{ComEqSigSecret, MessageSecret},
        com_mult::ComMultSecret,
        common::*,
        vcom_eq::{VecComDlogEq, VecComDlogEqSecret},
    },
};
use anyhow::{anyhow, bail, ensure};
use either::Either;
use rand::*;
use std::collections::BTreeMap;

/// Build the request for an identity object. All anonymity revokers of the
/// context are chosen, with the given revocation threshold.
///
/// The user commits to IdCredSec and the PRF key under the first two bases
/// of the identity provider's signature key, and proves that the first
/// committed value is the discrete logarithm of IdCredPub. The returned
/// randomness unmasks the signature the identity provider produces on the
/// commitment.
///
/// Returns `None` if the threshold is larger than the number of anonymity
/// revokers, or if the identity provider's key cannot sign the messages.
pub fn generate_pio<P: Pairing, C: Curve<Scalar = P::ScalarField>, R: Rng>(
    context: &IpContext<P, C>,
    threshold: Threshold,
    aci: &AccCredentialInfo<C>,
    csprng: &mut R,
) -> Option<(PreIdentityObject<P, C>, SigRetrievalRandomness<P>)> {
    let ar_identities = context.ars_infos.keys().copied().collect();
    if !utils::check_ar_parameters(&ar_identities, threshold) {
        return None;
    }
    let ip_pub_key = &context.ip_info.ip_verify_key;
    if ip_pub_key.len() < NUM_PREFIX_MESSAGES {
        return None;
    }
    let id_cred_sec = &aci.cred_holder_info.id_cred.id_cred_sec;
    let id_cred_pub = aci.cred_holder_info.id_cred.id_cred_pub(context.global_context);

    let key = VecCommitmentKey::new(vec![ip_pub_key.ys[0], ip_pub_key.ys[1]], ip_pub_key.g).ok()?;
    let xs: Vec<Value<P::G1>> = vec![id_cred_sec.view(), aci.prf_key.view()];
    let (cmm_msg, mask) = key.commit(&xs, csprng).ok()?;

    let mut dlogs = BTreeMap::new();
    dlogs.insert(0, (context.global_context.generator(), id_cred_pub));
    let statement: VecComDlogEq<P::G1, C> = VecComDlogEq {
        comm: cmm_msg,
        key,
        dlogs,
    };
    let secret = VecComDlogEqSecret {
        xs,
        r: PedersenRandomness::new(*mask),
    };
    let choice_ar_parameters = ChoiceArParameters {
        ar_identities,
        threshold,
    };
    let mut ro = pio_transcript(context, &choice_ar_parameters);
    let proof = prove(&mut ro, &statement, secret, csprng)?;
    let pio = PreIdentityObject {
        id_cred_pub,
        choice_ar_parameters,
        cmm_msg: crate::ps_sig::UnknownMessage(cmm_msg.0),
        proof,
    };
    Some((pio, mask.as_value()))
}

/// Transcript of the proof in the pre-identity object. It binds the proof to
/// the identity provider and the revocation parameters.
pub(crate) fn pio_transcript<P: Pairing, C: Curve<Scalar = P::ScalarField>>(
    context: &IpContext<P, C>,
    choice_ar_parameters: &ChoiceArParameters,
) -> RandomOracle {
    let mut ro = RandomOracle::domain(PRE_IDENTITY_DOMAIN);
    ro.append_message(b"global_context", context.global_context);
    ro.append_message(b"ip_info", context.ip_info);
    ro.append_message(b"choice_ar_parameters", choice_ar_parameters);
    ro
}

/// Where a credential is deployed: a new account with the given expiry of
/// the deployment and keys, or an existing account.
pub enum CredentialTarget<'a> {
    NewAccount {
        expiry:    TransactionTime,
        cred_data: &'a CredentialData,
    },
    ExistingAccount(AccountAddress),
}

impl<'a> CredentialTarget<'a> {
    /// The value the chain verifies the credential against.
    pub fn new_or_existing(&self) -> Either<TransactionTime, AccountAddress> {
        match self {
            CredentialTarget::NewAccount { expiry, .. } => Either::Left(*expiry),
            CredentialTarget::ExistingAccount(addr) => Either::Right(*addr),
        }
    }
}

/// Create a credential from an identity object.
///
/// The attributes in `policy` are revealed, and must be exactly as in the
/// identity object. All other attributes are committed to. The credential
/// counter determines the registration id, so using the same counter twice
/// produces credentials the chain can link.
#[allow(clippy::too_many_arguments)]
pub fn create_credential<P: Pairing, C: Curve<Scalar = P::ScalarField>, R: Rng>(
    context: IpContext<P, C>,
    id_object: &IdentityObject<P, C>,
    id_object_use_data: &IdObjectUseData<P, C>,
    cred_counter: u8,
    policy: Policy,
    target: &CredentialTarget,
    csprng: &mut R,
) -> anyhow::Result<CredentialDeploymentInfo<P, C>> {
    let global_context = context.global_context;
    let ip_info = context.ip_info;
    let cmm_key = global_context.on_chain_commitment_key;
    let alist = &id_object.alist;
    let ar_params = &id_object.pre_identity_object.choice_ar_parameters;
    let aci = &id_object_use_data.aci;
    let id_cred_sec = &aci.cred_holder_info.id_cred.id_cred_sec;
    let prf_key = &aci.prf_key;

    // The key count and the number of ownership proofs are encoded in one
    // byte each.
    if let CredentialTarget::NewAccount { cred_data, .. } = target {
        let num_keys = cred_data.keys.len();
        ensure!(
            (1..=usize::from(u8::MAX)).contains(&num_keys),
            "A new account needs between 1 and 255 keys, not {}.",
            num_keys
        );
        ensure!(
            usize::from(cred_data.threshold) <= num_keys,
            "The signature threshold is larger than the number of keys."
        );
    }
    ensure!(
        policy.created_at == alist.created_at && policy.valid_to == alist.valid_to,
        "The policy must have the validity period of the identity object."
    );
    for (tag, value) in policy.policy_vec.iter() {
        match alist.alist.get(tag) {
            Some(v) if v == value => (),
            _ => bail!("Attribute {} is not in the identity object.", tag.0),
        }
    }
    ensure!(
        utils::check_ar_parameters(&ar_params.ar_identities, ar_params.threshold),
        "Invalid anonymity revocation parameters."
    );

    // Unblind the signature of the identity provider, and blind it again for
    // this credential.
    let sig = id_object.signature.retrieve(&id_object_use_data.randomness);
    let (blinded_sig, blind_rand) = sig.blind(csprng);

    // Share IdCredSec among the anonymity revokers, and commit to the
    // coefficients of the sharing polynomial. The zeroth coefficient is
    // IdCredSec itself.
    let threshold = ar_params.threshold;
    let sharing = share::<C, _, _, _>(
        id_cred_sec,
        ar_params.ar_identities.iter().copied(),
        threshold,
        csprng,
    );
    let mut coeffs = Vec::with_capacity(usize::from(threshold));
    coeffs.push(id_cred_sec.clone());
    coeffs.extend(sharing.coefficients.iter().cloned());
    let (cmm_id_cred_sec_sharing_coeff, cmm_coeff_rands): (Vec<_>, Vec<_>) =
        coeffs.iter().map(|c| cmm_key.commit(c, csprng)).unzip();

    let mut ar_data = BTreeMap::new();
    let mut share_secrets = Vec::with_capacity(sharing.shares.len());
    for (ar_id, share) in ar_params.ar_identities.iter().zip(sharing.shares.iter()) {
        let ar_info = context
            .ars_infos
            .get(ar_id)
            .ok_or_else(|| anyhow!("Anonymity revoker {} is not known.", ar_id))?;
        let (enc_id_cred_pub_share, elgamal_rand) = ar_info
            .ar_public_key
            .encrypt_exponent_rand_given_generator(share, &global_context.generator(), csprng);
        ar_data.insert(*ar_id, ChainArData {
            enc_id_cred_pub_share,
        });
        let pedersen_rand = PedersenRandomness::new(utils::evaluate_poly(
            &cmm_coeff_rands,
            &ar_id.to_scalar::<C>(),
        ));
        share_secrets.push(ComEncEqSecret {
            value: share.clone(),
            elgamal_rand,
            pedersen_rand,
        });
    }

    // reg_id = g^{1/(k + x)} for the PRF key k and the counter x.
    let cred_counter = Value::<C>::from(u64::from(cred_counter));
    let k_x = prf_key.add(&cred_counter);
    let k_x_inv = match k_x.inverse() {
        Some(inv) => inv,
        None => bail!("The PRF key cannot be used with this credential counter."),
    };
    let reg_id = cmm_key.g.mul_by_scalar(&k_x_inv);
    let (cmm_prf, prf_rand) = cmm_key.commit(prf_key, csprng);
    let (cmm_cred_counter, cred_counter_rand) = cmm_key.commit(&cred_counter, csprng);
    let reg_id_secret = ComMultSecret {
        values: [k_x, k_x_inv, Value::new(C::Scalar::one())],
        rands:  [
            prf_rand.add(&cred_counter_rand),
            PedersenRandomness::zero(),
            PedersenRandomness::zero(),
        ],
    };

    // Commit to every attribute that is not revealed.
    let mut cmm_attributes = BTreeMap::new();
    let mut attribute_rands = BTreeMap::new();
    for (tag, value) in alist.alist.iter() {
        if !policy.policy_vec.contains_key(tag) {
            let value = Value::<C>::new(value.to_field_element::<C>());
            let (cmm, rand) = cmm_key.commit(&value, csprng);
            cmm_attributes.insert(*tag, cmm);
            attribute_rands.insert(*tag, (value, rand));
        }
    }

    let cred_account = match target {
        CredentialTarget::NewAccount { cred_data, .. } => cred_data.new_account(),
        CredentialTarget::ExistingAccount(addr) => CredentialAccount::ExistingAccount(*addr),
    };
    let values = CredentialDeploymentValues {
        cred_account,
        reg_id,
        ip_identity: ip_info.ip_identity,
        threshold,
        ar_data,
        policy,
    };
    let commitments = CredentialDeploymentCommitments {
        cmm_prf,
        cmm_cred_counter,
        cmm_attributes,
        cmm_id_cred_sec_sharing_coeff,
    };

    // Secrets for the signature proof, in the order of the signed messages.
    let max_tag = values
        .policy
        .policy_vec
        .keys()
        .chain(commitments.cmm_attributes.keys())
        .max()
        .copied();
    let num_attributes = max_tag.map_or(0, |t| usize::from(t.0) + 1);
    let mut msgs_secret = Vec::with_capacity(NUM_PREFIX_MESSAGES + num_attributes);
    msgs_secret.push(MessageSecret::EqualToCommitment(
        id_cred_sec.clone(),
        cmm_coeff_rands[0].clone(),
    ));
    msgs_secret.push(MessageSecret::EqualToCommitment(prf_key.clone(), prf_rand));
    msgs_secret.push(MessageSecret::Revealed);
    msgs_secret.push(MessageSecret::Revealed);
    for tag in (0..num_attributes).map(|t| AttributeTag(t as u8)) {
        match attribute_rands.remove(&tag) {
            Some((value, rand)) => msgs_secret.push(MessageSecret::EqualToCommitment(value, rand)),
            None => msgs_secret.push(MessageSecret::Revealed),
        }
    }
    let sig_secret = ComEqSigSecret {
        blind_rand,
        msgs_secret,
    };

    let statement = chain::credential_statement(
        global_context,
        context.ars_infos,
        &ip_info.ip_verify_key,
        &values,
        &commitments,
        &blinded_sig,
    )?;
    let new_or_existing = target.new_or_existing();
    let mut ro = chain::credential_transcript(
        global_context,
        ip_info,
        context.ars_infos,
        &values,
        &commitments,
        &new_or_existing,
    );
    let secret = ((reg_id_secret, sig_secret), share_secrets);
    let proof = prove(&mut ro, &statement, secret, csprng)
        .ok_or_else(|| anyhow!("Cannot produce the credential proof."))?;

    let mut proof_acc_sk = AccountOwnershipProof::default();
    if let CredentialTarget::NewAccount { cred_data, .. } = target {
        for (idx, signing_key) in cred_data.keys.values().enumerate() {
            let idx = KeyIndex(idx as u8);
            let mut key_ro = ro.split();
            key_ro.append_message(b"key_index", &idx);
            let key_proof = prove_dlog_ed25519(
                csprng,
                &mut key_ro,
                &signing_key.verifying_key(),
                signing_key,
            );
            proof_acc_sk.proofs.insert(idx, key_proof);
        }
    }

    let AndResponse {
        r1: AndResponse {
            r1: proof_reg_id,
            r2: proof_ip_sig,
        },
        r2: ReplicateResponse { responses },
    } = proof.response;
    let proof_id_cred_pub = values.ar_data.keys().copied().zip(responses).collect();
    let proofs = CredDeploymentProofs {
        sig: blinded_sig,
        commitments,
        challenge: proof.challenge,
        proof_id_cred_pub,
        proof_ip_sig,
        proof_reg_id,
        proof_acc_sk,
    };
    Ok(CredentialDeploymentInfo { values, proofs })
}
