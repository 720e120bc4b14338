//! Benchmark verification of credentials, one at a time and in batches.
use criterion::*;
use either::Either::Right;
use id_credentials::{
    common::types::{KeyIndex, TransactionTime},
    curve_arithmetic::Value,
    elgamal,
    id::{
        account_holder::*,
        chain::*,
        constants::*,
        identity_provider::verify_credentials,
        secret_sharing::Threshold,
        types::*,
    },
    ps_sig,
};
use rand::*;
use std::{collections::BTreeMap, convert::TryFrom};

fn description(name: String) -> Description {
    Description {
        url: format!("{}.com", name),
        description: name.clone(),
        name,
    }
}

fn bench_verify_cdi(c: &mut Criterion) {
    let mut csprng = thread_rng();
    let num_ars = 5u32;
    let global_ctx = GlobalContext::<ArCurve>::generate(String::from("genesis_string"))
        .expect("Hashing to the group succeeds.");

    let ip_secret_key = ps_sig::SecretKey::<IpPairing>::generate(NUM_PREFIX_MESSAGES + 10, &mut csprng);
    let ip_cdi_secret_key = ed25519_dalek::SigningKey::from_bytes(&csprng.gen());
    let ip_info = IpInfo {
        ip_identity:       IpIdentity(0),
        ip_description:    description("IP0".into()),
        ip_verify_key:     ps_sig::PublicKey::from(&ip_secret_key),
        ip_cdi_verify_key: ip_cdi_secret_key.verifying_key(),
    };

    let ars_infos = (1..=num_ars)
        .map(|i| {
            let ar_identity = ArIdentity::try_from(i).expect("Identities start at 1.");
            let sk = elgamal::SecretKey::generate(&global_ctx.generator(), &mut csprng);
            (ar_identity, ArInfo {
                ar_identity,
                ar_description: description(format!("AR{}", i)),
                ar_public_key: elgamal::PublicKey::from(&sk),
            })
        })
        .collect::<BTreeMap<_, _>>();

    let aci = AccCredentialInfo::<ArCurve> {
        cred_holder_info: CredentialHolderInfo {
            id_cred: IdCredentials::generate(&mut csprng),
        },
        prf_key:          Value::generate_non_zero(&mut csprng),
    };
    let context = IpContext::new(&ip_info, &ars_infos, &global_ctx);
    let threshold = Threshold::try_from(3u8).expect("Non-zero threshold.");
    let (pio, randomness) =
        generate_pio(&context, threshold, &aci, &mut csprng).expect("Valid request.");
    let mut alist = BTreeMap::new();
    alist.insert(AttributeTag(0), AttributeKind::from(55));
    alist.insert(AttributeTag(4), AttributeKind::from(1990));
    let alist = AttributeList {
        created_at: YearMonth::new(2020, 5).expect("Valid date."),
        valid_to: YearMonth::new(2030, 5).expect("Valid date."),
        alist,
    };
    let signature = verify_credentials(&pio, context, &alist, &ip_secret_key, &mut csprng)
        .expect("Valid request.");
    let policy = Policy {
        created_at: alist.created_at,
        valid_to:   alist.valid_to,
        policy_vec: alist.alist.iter().take(1).map(|(k, v)| (*k, v.clone())).collect(),
    };
    let id_object = IdentityObject {
        pre_identity_object: pio,
        alist,
        signature,
    };
    let id_use_data = IdObjectUseData { aci, randomness };

    let addr = AccountAddress([0u8; 32]);
    let target = CredentialTarget::ExistingAccount(addr);
    let cdis = (0..8u8)
        .map(|counter| {
            let cdi = create_credential(
                context,
                &id_object,
                &id_use_data,
                counter,
                policy.clone(),
                &target,
                &mut csprng,
            )
            .expect("Valid credential.");
            (cdi, Right(addr))
        })
        .collect::<Vec<_>>();
    let now = TransactionTime::from_seconds(0);

    let (cdi, new_or_existing) = &cdis[0];
    c.bench_function("verify_cdi", |b| {
        b.iter(|| {
            verify_cdi(&global_ctx, &ip_info, &ars_infos, cdi, new_or_existing, now)
                .expect("Valid credential.")
        })
    });

    let mut ip_infos = BTreeMap::new();
    ip_infos.insert(ip_info.ip_identity, ip_info.clone());
    c.bench_function("verify_cdi_batch 8", |b| {
        b.iter(|| verify_cdi_batch(&global_ctx, &ip_infos, &ars_infos, &cdis, now))
    });

    // Ownership proofs for the keys of a new account add to the cost.
    let mut keys = BTreeMap::new();
    for i in 0..3u8 {
        keys.insert(KeyIndex(i), ed25519_dalek::SigningKey::from_bytes(&csprng.gen()));
    }
    let cred_data = CredentialData {
        keys,
        threshold: SignatureThreshold::try_from(2u8).expect("Non-zero threshold."),
    };
    let expiry = TransactionTime::from_seconds(u64::MAX);
    let new_account = create_credential(
        context,
        &id_object,
        &id_use_data,
        8,
        policy,
        &CredentialTarget::NewAccount {
            expiry,
            cred_data: &cred_data,
        },
        &mut csprng,
    )
    .expect("Valid credential.");
    c.bench_function("verify_cdi new account with 3 keys", |b| {
        b.iter(|| {
            verify_cdi(
                &global_ctx,
                &ip_info,
                &ars_infos,
                &new_account,
                &either::Either::Left(expiry),
                now,
            )
            .expect("Valid credential.")
        })
    });
}

criterion_group! {
    name = verify_cdi_benchmarks;
    config = Criterion::default().sample_size(10);
    targets = bench_verify_cdi
}
criterion_main!(verify_cdi_benchmarks);
