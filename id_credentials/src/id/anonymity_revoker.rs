//! Anonymity revocation. Every revoker named in a credential can decrypt its
//! share of IdCredPub, and any threshold of decrypted shares determine
//! IdCredPub, which identifies the account holder to the identity provider.
use super::{
    secret_sharing::{reveal_in_group, Threshold},
    types::*,
};
use crate::{
    curve_arithmetic::Curve,
    elgamal::{Message, SecretKey},
};
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RevocationError {
    #[error("Revealing needs {needed} shares, but only {got} were given.")]
    InsufficientShares { needed: u8, got: usize },
    #[error("More than one share from anonymity revoker {0}.")]
    DuplicateShare(ArIdentity),
}

/// Decrypt the share of IdCredPub meant for the owner of `ar_secret_key`.
/// The result is `g^{f(i)}` where `i` is the identity of the revoker.
pub fn decrypt_share<C: Curve>(ar_secret_key: &SecretKey<C>, chain_ar_data: &ChainArData<C>) -> Message<C> {
    ar_secret_key.decrypt(&chain_ar_data.enc_id_cred_pub_share)
}

/// Combine decrypted shares into IdCredPub. The shares must come from
/// distinct revokers, and there must be at least `threshold` of them. Any
/// such set of correct shares gives the same result.
pub fn reveal_id_cred_pub<C: Curve>(
    threshold: Threshold,
    shares: &[(ArIdentity, Message<C>)],
) -> Result<C, RevocationError> {
    let mut seen = BTreeSet::new();
    for (ar, _) in shares.iter() {
        if !seen.insert(*ar) {
            return Err(RevocationError::DuplicateShare(*ar));
        }
    }
    if shares.len() < usize::from(threshold) {
        return Err(RevocationError::InsufficientShares {
            needed: threshold.into(),
            got:    shares.len(),
        });
    }
    let points = shares
        .iter()
        .map(|(ar, m)| (*ar, m.value))
        .collect::<Vec<(ArIdentity, C)>>();
    Ok(reveal_in_group(&points))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        curve_arithmetic::{Value, G1},
        elgamal::PublicKey,
        id::secret_sharing::share,
    };
    use rand::{seq::SliceRandom, thread_rng};
    use std::convert::TryFrom;

    /// Share a fresh IdCredSec among `n` revokers, and return IdCredPub and
    /// every revoker's decrypted share.
    fn shares_for(n: u32, t: Threshold) -> (G1, Vec<(ArIdentity, Message<G1>)>) {
        let mut csprng = thread_rng();
        let g = G1::generate(&mut csprng);
        let id_cred_sec = Value::<G1>::generate_non_zero(&mut csprng);
        let ars = (1..=n)
            .map(|i| ArIdentity::try_from(i).expect("Identities are non-zero."))
            .collect::<Vec<_>>();
        let sharing = share::<G1, _, _, _>(&id_cred_sec, ars.iter().copied(), t, &mut csprng);
        let decrypted = ars
            .iter()
            .zip(sharing.shares.iter())
            .map(|(ar, s)| {
                let sk = SecretKey::generate_all(&mut csprng);
                let pk = PublicKey::from(&sk);
                let data = ChainArData {
                    enc_id_cred_pub_share: pk.encrypt_exponent_given_generator(s, &g, &mut csprng),
                };
                (*ar, decrypt_share(&sk, &data))
            })
            .collect();
        (g.mul_by_scalar(&id_cred_sec), decrypted)
    }

    #[test]
    fn test_any_threshold_subset_reveals() {
        let t = Threshold::try_from(3u8).expect("Non-zero threshold.");
        let (id_cred_pub, mut shares) = shares_for(5, t);
        for _ in 0..5 {
            shares.shuffle(&mut thread_rng());
            let revealed = reveal_id_cred_pub(t, &shares[..3]).expect("Enough shares.");
            assert_eq!(revealed, id_cred_pub);
        }
        let revealed = reveal_id_cred_pub(t, &shares).expect("Enough shares.");
        assert_eq!(revealed, id_cred_pub);
    }

    #[test]
    fn test_too_few_shares() {
        let t = Threshold::try_from(3u8).expect("Non-zero threshold.");
        let (_, shares) = shares_for(5, t);
        assert_eq!(
            reveal_id_cred_pub(t, &shares[..2]),
            Err(RevocationError::InsufficientShares { needed: 3, got: 2 })
        );
    }

    #[test]
    fn test_duplicate_share() {
        let t = Threshold::try_from(2u8).expect("Non-zero threshold.");
        let (_, shares) = shares_for(3, t);
        let dup = vec![shares[0], shares[1], shares[0]];
        assert_eq!(
            reveal_id_cred_pub(t, &dup),
            Err(RevocationError::DuplicateShare(shares[0].0))
        );
    }
}
