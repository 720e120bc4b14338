use super::{
    account_holder::*,
    anonymity_revoker::*,
    chain::*,
    constants::{ArCurve, IpPairing, *},
    identity_provider::*,
    secret_sharing::Threshold,
    types::*,
};
use crate::{
    common::{
        serialize_deserialize, to_bytes,
        types::{KeyIndex, TransactionTime},
        from_bytes_complete,
    },
    curve_arithmetic::{Curve, Value},
    elgamal::{PublicKey, SecretKey},
    ps_sig,
};
use ed25519_dalek::SigningKey;
use either::Either::{self, Left, Right};
use rand::*;
use std::{collections::BTreeMap, convert::TryFrom};

pub const EXPIRY: TransactionTime = TransactionTime {
    seconds: 111111111111111111,
};

/// A time before [EXPIRY].
pub const NOW: TransactionTime = TransactionTime {
    seconds: 1_700_000_000,
};

/// Create #num_ars anonymity revokers to be used by test
pub fn test_create_ars<T: Rng>(
    ar_base: &ArCurve,
    num_ars: u8,
    csprng: &mut T,
) -> (
    BTreeMap<ArIdentity, ArInfo<ArCurve>>,
    BTreeMap<ArIdentity, SecretKey<ArCurve>>,
) {
    let mut ar_infos = BTreeMap::new();
    let mut ar_keys = BTreeMap::new();
    for i in 1..=num_ars {
        let ar_id = ArIdentity::try_from(u32::from(i)).expect("Identities start at 1.");
        let ar_secret_key = SecretKey::generate(ar_base, csprng);
        let ar_public_key = PublicKey::from(&ar_secret_key);
        let ar_info = ArInfo::<ArCurve> {
            ar_identity: ar_id,
            ar_description: Description {
                name:        format!("AnonymityRevoker{}", i),
                url:         format!("AnonymityRevoker{}.com", i),
                description: format!("AnonymityRevoker{}", i),
            },
            ar_public_key,
        };
        let _ = ar_infos.insert(ar_id, ar_info);
        let _ = ar_keys.insert(ar_id, ar_secret_key);
    }
    (ar_infos, ar_keys)
}

/// Create an identity provider whose key can sign attributes with tags below
/// `max_attrs`.
pub fn test_create_ip_info<T: Rng>(csprng: &mut T, ip_identity: u32, max_attrs: u8) -> IpData<IpPairing> {
    let ps_len = NUM_PREFIX_MESSAGES + usize::from(max_attrs);
    let ip_secret_key = ps_sig::SecretKey::<IpPairing>::generate(ps_len, csprng);
    let ip_verify_key = ps_sig::PublicKey::from(&ip_secret_key);
    let ip_cdi_secret_key = SigningKey::from_bytes(&csprng.gen());
    let ip_cdi_verify_key = ip_cdi_secret_key.verifying_key();

    IpData {
        public_ip_info: IpInfo {
            ip_identity: IpIdentity(ip_identity),
            ip_description: Description {
                name:        format!("IP{}", ip_identity),
                url:         format!("IP{}.com", ip_identity),
                description: format!("IP{}", ip_identity),
            },
            ip_verify_key,
            ip_cdi_verify_key,
        },
        ip_secret_key,
        ip_cdi_secret_key,
    }
}

/// Create random AccCredentialInfo (ACI) to be used by tests
pub fn test_create_aci<T: Rng>(csprng: &mut T) -> AccCredentialInfo<ArCurve> {
    let ah_info = CredentialHolderInfo::<ArCurve> {
        id_cred: IdCredentials::generate(csprng),
    };
    AccCredentialInfo {
        cred_holder_info: ah_info,
        prf_key:          Value::generate_non_zero(csprng),
    }
}

/// Create example attributes to be used by tests. Tags 0, 3 and 5 are set.
pub fn test_create_attributes() -> AttributeList {
    let mut alist = BTreeMap::new();
    alist.insert(AttributeTag(0), AttributeKind::from(55));
    alist.insert(AttributeTag(3), "DK".parse().expect("Short attribute."));
    alist.insert(AttributeTag(5), AttributeKind::from(31));
    AttributeList {
        created_at: YearMonth::new(2020, 5).expect("Valid date."),
        valid_to: YearMonth::new(2030, 5).expect("Valid date."),
        alist,
    }
}

/// Policy revealing the given tags of the test attributes.
pub fn test_create_policy(alist: &AttributeList, revealed: &[u8]) -> Policy {
    let policy_vec = revealed
        .iter()
        .filter_map(|t| {
            let tag = AttributeTag(*t);
            alist.alist.get(&tag).map(|v| (tag, v.clone()))
        })
        .collect();
    Policy {
        created_at: alist.created_at,
        valid_to: alist.valid_to,
        policy_vec,
    }
}

/// Keys for a new account.
pub fn test_create_cred_data<T: Rng>(csprng: &mut T, num_keys: u8, threshold: u8) -> CredentialData {
    let keys = (0..num_keys)
        .map(|i| (KeyIndex(i), SigningKey::from_bytes(&csprng.gen())))
        .collect();
    CredentialData {
        keys,
        threshold: SignatureThreshold::try_from(threshold).expect("Non-zero threshold."),
    }
}

/// Everything needed to issue and verify credentials: an identity provider,
/// `num_ars` anonymity revokers, and an identity object with revocation
/// threshold `threshold`.
pub struct TestSetup {
    pub global_ctx:  GlobalContext<ArCurve>,
    pub ip_data:     IpData<IpPairing>,
    pub ars_infos:   BTreeMap<ArIdentity, ArInfo<ArCurve>>,
    pub ars_secret:  BTreeMap<ArIdentity, SecretKey<ArCurve>>,
    pub id_object:   IdentityObject<IpPairing, ArCurve>,
    pub id_use_data: IdObjectUseData<IpPairing, ArCurve>,
}

impl TestSetup {
    pub fn new<T: Rng>(csprng: &mut T, num_ars: u8, threshold: u8) -> Self {
        let global_ctx = GlobalContext::generate(String::from("genesis_string"))
            .expect("Hashing to the group should succeed.");
        let ip_data = test_create_ip_info(csprng, 0, 10);
        let (ars_infos, ars_secret) = test_create_ars(&global_ctx.generator(), num_ars, csprng);
        let aci = test_create_aci(csprng);
        let context = IpContext::new(&ip_data.public_ip_info, &ars_infos, &global_ctx);
        let threshold = Threshold::try_from(threshold).expect("Non-zero threshold.");
        let (pio, randomness) = generate_pio(&context, threshold, &aci, csprng)
            .expect("Generating the pre-identity object should succeed.");
        let alist = test_create_attributes();
        let signature = verify_credentials(&pio, context, &alist, &ip_data.ip_secret_key, csprng)
            .expect("The identity provider should accept the request.");
        let id_object = IdentityObject {
            pre_identity_object: pio,
            alist,
            signature,
        };
        let id_use_data = IdObjectUseData { aci, randomness };
        TestSetup {
            global_ctx,
            ip_data,
            ars_infos,
            ars_secret,
            id_object,
            id_use_data,
        }
    }

    pub fn context(&self) -> IpContext<IpPairing, ArCurve> {
        IpContext::new(&self.ip_data.public_ip_info, &self.ars_infos, &self.global_ctx)
    }

    pub fn ip_info(&self) -> &IpInfo<IpPairing> { &self.ip_data.public_ip_info }

    pub fn create<T: Rng>(
        &self,
        cred_counter: u8,
        revealed: &[u8],
        target: &CredentialTarget,
        csprng: &mut T,
    ) -> CredentialDeploymentInfo<IpPairing, ArCurve> {
        let policy = test_create_policy(&self.id_object.alist, revealed);
        create_credential(
            self.context(),
            &self.id_object,
            &self.id_use_data,
            cred_counter,
            policy,
            target,
            csprng,
        )
        .expect("Should generate the credential successfully.")
    }

    pub fn verify(
        &self,
        cdi: &CredentialDeploymentInfo<IpPairing, ArCurve>,
        new_or_existing: &Either<TransactionTime, AccountAddress>,
        now: TransactionTime,
    ) -> Result<(), CDIVerificationError> {
        verify_cdi(
            &self.global_ctx,
            self.ip_info(),
            &self.ars_infos,
            cdi,
            new_or_existing,
            now,
        )
    }

    pub fn id_cred_pub(&self) -> ArCurve {
        self.id_use_data
            .aci
            .cred_holder_info
            .id_cred
            .id_cred_pub(&self.global_ctx)
    }
}

#[test]
pub fn test_pipeline() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut csprng = thread_rng();
    let setup = TestSetup::new(&mut csprng, 5, 3);
    let acc_data = test_create_cred_data(&mut csprng, 3, 2);
    let target = CredentialTarget::NewAccount {
        expiry:    EXPIRY,
        cred_data: &acc_data,
    };
    let cdi = setup.create(0, &[3], &target, &mut csprng);
    assert_eq!(setup.verify(&cdi, &Left(EXPIRY), NOW), Ok(()));
    assert!(verify_credential(
        &setup.global_ctx,
        setup.ip_info(),
        &setup.ars_infos,
        &cdi,
        &Left(EXPIRY),
        NOW
    ));

    // Verify serialization
    let des = serialize_deserialize(&cdi).expect("Deserialization must be successful.");
    assert_eq!(des, cdi, "It should deserialize back to what we started with.");
    let json = serde_json::to_string(&cdi).expect("JSON serialization must succeed.");
    let from_json: CredentialDeploymentInfo<IpPairing, ArCurve> =
        serde_json::from_str(&json).expect("JSON deserialization must succeed.");
    assert_eq!(from_json, cdi);
    assert_eq!(setup.verify(&from_json, &Left(EXPIRY), NOW), Ok(()));
    // The proofs follow the values as a single blob behind its 4 byte length,
    // starting with the blinded signature.
    let bytes = to_bytes(&cdi);
    let values_len = to_bytes(&cdi.values).len();
    let mut len_bytes = [0u8; 4];
    len_bytes.copy_from_slice(&bytes[values_len..values_len + 4]);
    assert_eq!(
        u32::from_be_bytes(len_bytes) as usize,
        bytes.len() - values_len - 4
    );
    let sig_bytes = to_bytes(&cdi.proofs.sig);
    assert_eq!(&bytes[values_len + 4..values_len + 4 + sig_bytes.len()], &sig_bytes[..]);
    let hash = credential_hash(&cdi);
    assert_eq!(hash.len(), 64);
    assert_eq!(hash, credential_hash(&from_json));

    // Revoking anonymity using all but two ARs
    let shares = setup
        .ars_secret
        .iter()
        .skip(2)
        .map(|(ar_id, key)| {
            let ar = cdi.values.ar_data.get(ar_id).unwrap_or_else(|| {
                panic!("Anonymity revoker {} is not present.", ar_id)
            });
            (*ar_id, decrypt_share(key, ar))
        })
        .collect::<Vec<_>>();
    let revealed_id_cred_pub =
        reveal_id_cred_pub(cdi.values.threshold, &shares).expect("Enough shares.");
    assert_eq!(revealed_id_cred_pub, setup.id_cred_pub());
    assert_eq!(setup.id_object.pre_identity_object.id_cred_pub, setup.id_cred_pub());

    // Generate a new cdi and swap the encrypted shares of two anonymity
    // revokers. Verification of this credential should fail.
    let mut cdi = setup.create(0, &[3], &target, &mut csprng);
    let ar_2 = ArIdentity::try_from(2u32).expect("Non-zero.");
    let ar_3 = ArIdentity::try_from(3u32).expect("Non-zero.");
    let x_2 = cdi.values.ar_data[&ar_2];
    let x_3 = cdi.values.ar_data[&ar_3];
    cdi.values.ar_data.insert(ar_2, x_3);
    cdi.values.ar_data.insert(ar_3, x_2);
    assert_eq!(
        setup.verify(&cdi, &Left(EXPIRY), NOW),
        Err(CDIVerificationError::Proof)
    );
}

#[test]
pub fn test_threshold_boundary() {
    let mut csprng = thread_rng();
    let setup = TestSetup::new(&mut csprng, 4, 3);
    let cdi = setup.create(
        1,
        &[],
        &CredentialTarget::ExistingAccount(AccountAddress([7u8; 32])),
        &mut csprng,
    );
    let shares = setup
        .ars_secret
        .iter()
        .map(|(ar_id, key)| (*ar_id, decrypt_share(key, &cdi.values.ar_data[ar_id])))
        .collect::<Vec<_>>();
    let t = cdi.values.threshold;
    for subset in [[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]] {
        let chosen = subset.iter().map(|i| shares[*i]).collect::<Vec<_>>();
        assert_eq!(reveal_id_cred_pub(t, &chosen), Ok(setup.id_cred_pub()));
    }
    assert_eq!(
        reveal_id_cred_pub(t, &shares[..2]),
        Err(RevocationError::InsufficientShares { needed: 3, got: 2 })
    );
}

#[test]
pub fn test_selective_disclosure() {
    let mut csprng = thread_rng();
    let setup = TestSetup::new(&mut csprng, 2, 1);
    let addr = AccountAddress([1u8; 32]);
    let cdi = setup.create(2, &[0, 5], &CredentialTarget::ExistingAccount(addr), &mut csprng);
    let alist = &setup.id_object.alist.alist;

    let revealed = &cdi.values.policy.policy_vec;
    assert_eq!(revealed.len(), 2);
    assert_eq!(revealed.get(&AttributeTag(0)), alist.get(&AttributeTag(0)));
    assert_eq!(revealed.get(&AttributeTag(5)), alist.get(&AttributeTag(5)));
    let committed = &cdi.proofs.commitments.cmm_attributes;
    assert_eq!(committed.keys().copied().collect::<Vec<_>>(), vec![AttributeTag(3)]);
    assert_eq!(setup.verify(&cdi, &Right(addr), NOW), Ok(()));

    // Claiming a different value for a revealed attribute breaks the proof.
    let mut forged = cdi.clone();
    forged
        .values
        .policy
        .policy_vec
        .insert(AttributeTag(0), AttributeKind::from(56));
    assert_eq!(
        setup.verify(&forged, &Right(addr), NOW),
        Err(CDIVerificationError::Proof)
    );

    // So does revealing an attribute that was not signed.
    let mut forged = cdi;
    forged
        .values
        .policy
        .policy_vec
        .insert(AttributeTag(1), AttributeKind::from(1));
    assert_eq!(
        setup.verify(&forged, &Right(addr), NOW),
        Err(CDIVerificationError::Proof)
    );

    // The account holder cannot reveal a value that is not in the identity.
    let mut policy = test_create_policy(&setup.id_object.alist, &[0]);
    policy.policy_vec.insert(AttributeTag(0), AttributeKind::from(99));
    let res = create_credential(
        setup.context(),
        &setup.id_object,
        &setup.id_use_data,
        0,
        policy,
        &CredentialTarget::ExistingAccount(addr),
        &mut csprng,
    );
    assert!(res.is_err());
}

#[test]
pub fn test_tamper_sensitivity() {
    let mut csprng = thread_rng();
    let setup = TestSetup::new(&mut csprng, 3, 2);
    let acc_data = test_create_cred_data(&mut csprng, 2, 1);
    let target = CredentialTarget::NewAccount {
        expiry:    EXPIRY,
        cred_data: &acc_data,
    };
    let cdi = setup.create(0, &[3], &target, &mut csprng);
    assert_eq!(setup.verify(&cdi, &Left(EXPIRY), NOW), Ok(()));

    // Pseudonym.
    let mut tampered = cdi.clone();
    tampered.values.reg_id = tampered.values.reg_id.plus_point(&setup.global_ctx.generator());
    assert_eq!(
        setup.verify(&tampered, &Left(EXPIRY), NOW),
        Err(CDIVerificationError::Proof)
    );

    // Encrypted share.
    let mut tampered = cdi.clone();
    let ar_1 = ArIdentity::try_from(1u32).expect("Non-zero.");
    if let Some(data) = tampered.values.ar_data.get_mut(&ar_1) {
        data.enc_id_cred_pub_share.1 = data
            .enc_id_cred_pub_share
            .1
            .plus_point(&setup.global_ctx.generator());
    }
    assert_eq!(
        setup.verify(&tampered, &Left(EXPIRY), NOW),
        Err(CDIVerificationError::Proof)
    );

    // Policy.
    let mut tampered = cdi.clone();
    tampered.values.policy.valid_to = YearMonth::new(2040, 1).expect("Valid date.");
    assert_eq!(
        setup.verify(&tampered, &Left(EXPIRY), NOW),
        Err(CDIVerificationError::Proof)
    );

    // Challenge.
    let mut tampered = cdi.clone();
    let mut challenge = to_bytes(&tampered.proofs.challenge);
    challenge[0] ^= 1;
    tampered.proofs.challenge =
        from_bytes_complete(&challenge).expect("Any 32 bytes are a challenge.");
    assert_eq!(
        setup.verify(&tampered, &Left(EXPIRY), NOW),
        Err(CDIVerificationError::Proof)
    );

    // Every byte of the proofs blob is covered: a flipped byte either does not
    // decode or does not verify.
    let bytes = to_bytes(&cdi);
    let values_len = to_bytes(&cdi.values).len();
    for _ in 0..10 {
        let mut bytes = bytes.clone();
        // Skip the length of the proofs.
        let i = csprng.gen_range(values_len + 4..bytes.len());
        bytes[i] ^= 1 << csprng.gen_range(0..8);
        if let Ok(tampered) = from_bytes_complete::<CredentialDeploymentInfo<IpPairing, ArCurve>>(&bytes) {
            assert!(setup.verify(&tampered, &Left(EXPIRY), NOW).is_err());
        }
    }

    // Key ownership proofs are checked last.
    let mut tampered = cdi;
    let proofs = &mut tampered.proofs.proof_acc_sk.proofs;
    let p0 = proofs[&KeyIndex(0)];
    let p1 = proofs[&KeyIndex(1)];
    proofs.insert(KeyIndex(0), p1);
    proofs.insert(KeyIndex(1), p0);
    assert_eq!(
        setup.verify(&tampered, &Left(EXPIRY), NOW),
        Err(CDIVerificationError::AccountOwnership(KeyIndex(0)))
    );
}

#[test]
pub fn test_expiry_and_account_binding() {
    let mut csprng = thread_rng();
    let setup = TestSetup::new(&mut csprng, 2, 2);
    let acc_data = test_create_cred_data(&mut csprng, 1, 1);
    let new_target = CredentialTarget::NewAccount {
        expiry:    EXPIRY,
        cred_data: &acc_data,
    };
    let new_cdi = setup.create(0, &[], &new_target, &mut csprng);
    let addr = AccountAddress::new(&new_cdi.values.reg_id);
    let existing_cdi = setup.create(1, &[], &CredentialTarget::ExistingAccount(addr), &mut csprng);

    assert_eq!(setup.verify(&new_cdi, &Left(EXPIRY), EXPIRY), Ok(()));
    let late = TransactionTime::from_seconds(EXPIRY.seconds + 1);
    let err = setup
        .verify(&new_cdi, &Left(EXPIRY), late)
        .expect_err("Expired credential.");
    assert_eq!(err, CDIVerificationError::Expired {
        expiry: EXPIRY.seconds,
        now:    late.seconds,
    });
    assert_eq!(err.kind(), CDIErrorKind::Malformed);

    // The expiry is bound into the proof.
    let other_expiry = TransactionTime::from_seconds(EXPIRY.seconds - 1);
    assert_eq!(
        setup.verify(&new_cdi, &Left(other_expiry), NOW),
        Err(CDIVerificationError::Proof)
    );
    assert_eq!(
        setup.verify(&new_cdi, &Right(addr), NOW),
        Err(CDIVerificationError::AccountMismatch)
    );

    // An existing account has no expiry, and the address is bound.
    assert_eq!(setup.verify(&existing_cdi, &Right(addr), late), Ok(()));
    assert_eq!(
        setup.verify(&existing_cdi, &Left(EXPIRY), NOW),
        Err(CDIVerificationError::AccountMismatch)
    );
    assert_eq!(
        setup.verify(&existing_cdi, &Right(AccountAddress([0u8; 32])), NOW),
        Err(CDIVerificationError::AccountMismatch)
    );

    // The same counter gives the same pseudonym.
    let again = setup.create(1, &[], &CredentialTarget::ExistingAccount(addr), &mut csprng);
    assert_eq!(again.values.reg_id, existing_cdi.values.reg_id);
    assert_ne!(new_cdi.values.reg_id, existing_cdi.values.reg_id);
}

#[test]
pub fn test_structural_checks() {
    let mut csprng = thread_rng();
    let setup = TestSetup::new(&mut csprng, 3, 2);
    let acc_data = test_create_cred_data(&mut csprng, 2, 2);
    let target = CredentialTarget::NewAccount {
        expiry:    EXPIRY,
        cred_data: &acc_data,
    };
    let cdi = setup.create(0, &[0], &target, &mut csprng);

    let with_keys = |keys: Vec<VerifyKey>, threshold: u8| {
        let mut c = cdi.clone();
        c.values.cred_account = CredentialAccount::NewAccount(
            keys,
            SignatureThreshold::try_from(threshold).expect("Non-zero threshold."),
        );
        c
    };
    let random_key = |csprng: &mut rngs::ThreadRng| VerifyKey::from(&SigningKey::from_bytes(&csprng.gen()));

    let err = setup
        .verify(&with_keys(Vec::new(), 1), &Left(EXPIRY), NOW)
        .expect_err("No keys.");
    assert!(matches!(err, CDIVerificationError::AccountKeys(_)));
    assert_eq!(err.kind(), CDIErrorKind::Malformed);

    let too_many = (0..256).map(|_| random_key(&mut csprng)).collect::<Vec<_>>();
    assert!(matches!(
        setup.verify(&with_keys(too_many, 1), &Left(EXPIRY), NOW),
        Err(CDIVerificationError::AccountKeys(_))
    ));

    let key = random_key(&mut csprng);
    assert!(matches!(
        setup.verify(&with_keys(vec![key, key], 1), &Left(EXPIRY), NOW),
        Err(CDIVerificationError::AccountKeys(_))
    ));

    let keys = match &cdi.values.cred_account {
        CredentialAccount::NewAccount(keys, _) => keys.clone(),
        CredentialAccount::ExistingAccount(_) => unreachable!("New account."),
    };
    assert!(matches!(
        setup.verify(&with_keys(keys, 3), &Left(EXPIRY), NOW),
        Err(CDIVerificationError::AccountKeys(_))
    ));

    // Registries.
    let mut known_ars = setup.ars_infos.clone();
    let ar_1 = ArIdentity::try_from(1u32).expect("Non-zero.");
    known_ars.remove(&ar_1);
    assert_eq!(
        verify_cdi(&setup.global_ctx, setup.ip_info(), &known_ars, &cdi, &Left(EXPIRY), NOW),
        Err(CDIVerificationError::UnknownAr(ar_1))
    );
    let other_ip = test_create_ip_info(&mut csprng, 1, 10);
    assert_eq!(
        verify_cdi(
            &setup.global_ctx,
            &other_ip.public_ip_info,
            &setup.ars_infos,
            &cdi,
            &Left(EXPIRY),
            NOW
        ),
        Err(CDIVerificationError::IpIdentity {
            expected: IpIdentity(1),
            got:      IpIdentity(0),
        })
    );

    // Identity elements.
    let mut c = cdi.clone();
    c.values.reg_id = ArCurve::zero_point();
    assert!(matches!(
        setup.verify(&c, &Left(EXPIRY), NOW),
        Err(CDIVerificationError::IdentityElement(_))
    ));

    // Threshold above the number of anonymity revokers.
    let mut c = cdi.clone();
    c.values.threshold = Threshold::try_from(4u8).expect("Non-zero threshold.");
    assert!(matches!(
        setup.verify(&c, &Left(EXPIRY), NOW),
        Err(CDIVerificationError::AR(_))
    ));

    // Threshold not matching the sharing polynomial.
    let mut c = cdi.clone();
    c.values.threshold = Threshold::try_from(3u8).expect("Non-zero threshold.");
    assert!(matches!(
        setup.verify(&c, &Left(EXPIRY), NOW),
        Err(CDIVerificationError::AR(_))
    ));

    // An attribute both revealed and committed.
    let mut c = cdi.clone();
    let tag = AttributeTag(3);
    let value = setup.id_object.alist.alist[&tag].clone();
    c.values.policy.policy_vec.insert(tag, value);
    assert!(matches!(
        setup.verify(&c, &Left(EXPIRY), NOW),
        Err(CDIVerificationError::Policy(_))
    ));

    // A missing key proof.
    let mut c = cdi;
    c.proofs.proof_acc_sk.proofs.remove(&KeyIndex(1));
    assert!(matches!(
        setup.verify(&c, &Left(EXPIRY), NOW),
        Err(CDIVerificationError::AccountKeys(_))
    ));
}

#[test]
pub fn test_create_rejects_bad_key_lists() {
    let mut csprng = thread_rng();
    let setup = TestSetup::new(&mut csprng, 1, 1);
    let try_create = |cred_data: &CredentialData, csprng: &mut rngs::ThreadRng| {
        let target = CredentialTarget::NewAccount {
            expiry: EXPIRY,
            cred_data,
        };
        create_credential(
            setup.context(),
            &setup.id_object,
            &setup.id_use_data,
            0,
            test_create_policy(&setup.id_object.alist, &[]),
            &target,
            csprng,
        )
    };

    // 256 keys do not fit the one byte count.
    let keys = (0..=u8::MAX)
        .map(|i| (KeyIndex(i), SigningKey::from_bytes(&csprng.gen())))
        .collect::<BTreeMap<_, _>>();
    assert_eq!(keys.len(), 256);
    let too_many = CredentialData {
        keys,
        threshold: SignatureThreshold::ONE,
    };
    assert!(try_create(&too_many, &mut csprng).is_err());

    let no_keys = CredentialData {
        keys:      BTreeMap::new(),
        threshold: SignatureThreshold::ONE,
    };
    assert!(try_create(&no_keys, &mut csprng).is_err());

    let mut high_threshold = test_create_cred_data(&mut csprng, 2, 2);
    high_threshold.threshold = SignatureThreshold::try_from(3u8).expect("Non-zero threshold.");
    assert!(try_create(&high_threshold, &mut csprng).is_err());

    // The largest key list still round trips through verification.
    let max_keys = test_create_cred_data(&mut csprng, u8::MAX, 1);
    let cdi = try_create(&max_keys, &mut csprng).expect("255 keys are allowed.");
    let cdi = serialize_deserialize(&cdi).expect("Deserialization should succeed.");
    assert_eq!(setup.verify(&cdi, &Left(EXPIRY), NOW), Ok(()));
}

#[test]
pub fn test_initial_account() {
    let mut csprng = thread_rng();
    let setup = TestSetup::new(&mut csprng, 1, 1);
    let acc_data = test_create_cred_data(&mut csprng, 2, 1);
    let reg_id = ArCurve::generate(&mut csprng);
    let icdi = create_initial_cdi(
        setup.ip_info(),
        reg_id,
        acc_data.get_cred_key_info(),
        &setup.id_object.alist,
        EXPIRY,
        &setup.ip_data.ip_cdi_secret_key,
    );
    assert_eq!(verify_initial_cdi(setup.ip_info(), &icdi, EXPIRY, NOW), Ok(()));
    assert_eq!(verify_initial_cdi(setup.ip_info(), &icdi, EXPIRY, EXPIRY), Ok(()));
    let des = serialize_deserialize(&icdi).expect("Deserialization must be successful.");
    assert_eq!(des, icdi);

    let late = TransactionTime::from_seconds(EXPIRY.seconds + 1);
    assert!(matches!(
        verify_initial_cdi(setup.ip_info(), &icdi, EXPIRY, late),
        Err(CDIVerificationError::Expired { .. })
    ));

    // The expiry is signed.
    let other_expiry = TransactionTime::from_seconds(EXPIRY.seconds + 10);
    assert_eq!(
        verify_initial_cdi(setup.ip_info(), &icdi, other_expiry, NOW),
        Err(CDIVerificationError::Signature)
    );

    for i in [0, 31, 63] {
        let mut flipped = icdi.clone();
        flipped.sig.0[i] ^= 0x01;
        let err = verify_initial_cdi(setup.ip_info(), &flipped, EXPIRY, NOW)
            .expect_err("Flipped signature.");
        assert_eq!(err, CDIVerificationError::Signature);
        assert_eq!(err.kind(), CDIErrorKind::Cryptographic);
    }

    let credential = AccountCredential::Initial(icdi);
    assert_eq!(
        verify_account_credential(
            &setup.global_ctx,
            setup.ip_info(),
            &setup.ars_infos,
            &credential,
            &Left(EXPIRY),
            NOW
        ),
        Ok(())
    );
    assert_eq!(
        verify_account_credential(
            &setup.global_ctx,
            setup.ip_info(),
            &setup.ars_infos,
            &credential,
            &Right(AccountAddress([3u8; 32])),
            NOW
        ),
        Err(CDIVerificationError::AccountMismatch)
    );
}

#[test]
pub fn test_batch_verification() {
    let mut csprng = thread_rng();
    let setup = TestSetup::new(&mut csprng, 2, 1);
    let addr = AccountAddress([9u8; 32]);
    let good = setup.create(0, &[5], &CredentialTarget::ExistingAccount(addr), &mut csprng);
    let mut bad = setup.create(1, &[5], &CredentialTarget::ExistingAccount(addr), &mut csprng);
    bad.values.reg_id = good.values.reg_id;
    let mut unknown_ip = good.clone();
    unknown_ip.values.ip_identity = IpIdentity(17);

    let mut ip_infos = BTreeMap::new();
    ip_infos.insert(IpIdentity(0), setup.ip_info().clone());
    let batch = vec![
        (good.clone(), Right(addr)),
        (bad, Right(addr)),
        (good.clone(), Left(EXPIRY)),
        (unknown_ip, Right(addr)),
        (good, Right(addr)),
    ];
    assert_eq!(
        verify_cdi_batch(&setup.global_ctx, &ip_infos, &setup.ars_infos, &batch, NOW),
        vec![true, false, false, false, true]
    );
}

#[test]
pub fn test_identity_provider_rejects_bad_requests() {
    let mut csprng = thread_rng();
    let setup = TestSetup::new(&mut csprng, 3, 2);
    let context = setup.context();
    let alist = test_create_attributes();

    // IdCredPub that does not match the commitment.
    let mut pio = setup.id_object.pre_identity_object.clone();
    pio.id_cred_pub = pio.id_cred_pub.plus_point(&setup.global_ctx.generator());
    assert_eq!(
        verify_credentials(&pio, context, &alist, &setup.ip_data.ip_secret_key, &mut csprng),
        Err(Reason::IncorrectProof)
    );

    // Anonymity revokers the provider does not know.
    let mut pio = setup.id_object.pre_identity_object.clone();
    let unknown = ArIdentity::try_from(100u32).expect("Non-zero.");
    pio.choice_ar_parameters.ar_identities.insert(unknown);
    assert_eq!(
        verify_credentials(&pio, context, &alist, &setup.ip_data.ip_secret_key, &mut csprng),
        Err(Reason::UnknownAr(unknown))
    );

    // Attributes beyond the key.
    let mut long_alist = alist.clone();
    long_alist.alist.insert(AttributeTag(10), AttributeKind::from(1));
    assert_eq!(
        verify_credentials(
            &setup.id_object.pre_identity_object,
            context,
            &long_alist,
            &setup.ip_data.ip_secret_key,
            &mut csprng
        ),
        Err(Reason::TooManyAttributes)
    );

    // The threshold cannot exceed the number of revokers.
    assert!(generate_pio(
        &context,
        Threshold::try_from(4u8).expect("Non-zero threshold."),
        &setup.id_use_data.aci,
        &mut csprng
    )
    .is_none());
}
