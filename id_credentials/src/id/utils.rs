use super::{secret_sharing::Threshold, types::*};
use crate::{
    common::{to_bytes, Put},
    curve_arithmetic::{Curve, Field},
    pedersen_commitment::Commitment,
};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

/// Given a list of commitments g^{a_i}h^{r_i}
/// and a point x (the share number), compute
/// g^p(x)h^r(x) where
/// p(x) = a_0 + a_1 x + ... + a_n x^n
/// r(x) = r_0 + r_1 x + ... + r_n x^n
pub fn commitment_to_share<C: Curve>(
    share_number: &C::Scalar,
    coeff_commitments: &[Commitment<C>],
) -> Commitment<C> {
    let mut cmm_share_point: C = C::zero_point();
    // Horner's scheme in the exponent
    for cmm in coeff_commitments.iter().rev() {
        cmm_share_point = cmm_share_point.mul_by_scalar(share_number);
        cmm_share_point = cmm_share_point.plus_point(cmm);
    }
    Commitment(cmm_share_point)
}

/// Interpret the array as coefficients of a polynomial starting at 0,
/// and evaluate the polynomial at the given point.
pub fn evaluate_poly<F: Field, R: AsRef<F>>(coeffs: &[R], point: &F) -> F {
    let mut eval: F = F::zero();
    // Horner's scheme at point point
    for rand in coeffs.iter().rev() {
        eval.mul_assign(point);
        eval.add_assign(rand.as_ref());
    }
    eval
}

/// Encode the validity period and the revocation threshold into one scalar,
/// the third message signed by the identity provider. The layout, from the
/// most significant byte, is
/// `created_at.year | created_at.month | 0 | valid_to.year | valid_to.month | threshold`.
pub fn encode_public_credential_values<C: Curve>(
    created_at: YearMonth,
    valid_to: YearMonth,
    threshold: Threshold,
) -> C::Scalar {
    let packed = u64::from(created_at.year()) << 40
        | u64::from(created_at.month()) << 32
        | u64::from(valid_to.year()) << 16
        | u64::from(valid_to.month()) << 8
        | u64::from(u8::from(threshold));
    C::scalar_from_u64(packed)
}

/// Encode a set of anonymity revokers as a scalar, the fourth message signed
/// by the identity provider. This is the SHA-256 hash of the number of
/// revokers followed by their identities in increasing order.
pub fn encode_ars<C: Curve>(ars: &BTreeSet<ArIdentity>) -> C::Scalar {
    let mut hasher = Sha256::new();
    hasher.put(&(ars.len() as u32));
    for ar in ars.iter() {
        hasher.put(ar);
    }
    C::scalar_from_bytes(hasher.finalize())
}

/// Check that the anonymity revokers and threshold are usable: the
/// threshold is not larger than the number of revokers.
pub fn check_ar_parameters(ar_identities: &BTreeSet<ArIdentity>, threshold: Threshold) -> bool {
    usize::from(threshold) <= ar_identities.len()
}

/// The string the identity provider signs for an initial account, the
/// serialization of the expiry followed by the values.
pub fn initial_credential_message<C: Curve>(
    expiry: crate::common::types::TransactionTime,
    values: &InitialCredentialDeploymentValues<C>,
) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(to_bytes(&expiry));
    hasher.update(to_bytes(values));
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        curve_arithmetic::{Value, G1},
        id::secret_sharing::share,
        pedersen_commitment::CommitmentKey,
    };
    use rand::thread_rng;
    use std::convert::TryFrom;

    #[test]
    fn test_commitment_to_share_matches_shares() {
        let mut csprng = thread_rng();
        let ck = CommitmentKey::<G1>::generate(&mut csprng);
        let secret = Value::<G1>::generate(&mut csprng);
        let threshold = Threshold::try_from(3u8).expect("Threshold is non-zero.");
        let points = [1u64, 2, 3, 4, 5];
        let sharing = share::<G1, _, _, _>(&secret, points.iter().copied(), threshold, &mut csprng);
        let mut values = vec![secret.clone()];
        values.extend(sharing.coefficients.iter().cloned());
        let (cmms, rands): (Vec<_>, Vec<_>) =
            values.iter().map(|v| ck.commit(v, &mut csprng)).unzip();
        for (x, share_value) in points.iter().zip(sharing.shares.iter()) {
            let point = G1::scalar_from_u64(*x);
            let cmm = commitment_to_share(&point, &cmms);
            let rand = evaluate_poly(&rands, &point);
            assert_eq!(cmm, ck.hide_worker(share_value, &rand));
        }
    }

    #[test]
    fn test_public_values_encoding() {
        let created_at = YearMonth::new(2020, 5).expect("Valid date.");
        let valid_to = YearMonth::new(2025, 12).expect("Valid date.");
        let t = Threshold::try_from(2u8).expect("Threshold is non-zero.");
        let expected: u64 = (2020 << 40) | (5 << 32) | (2025 << 16) | (12 << 8) | 2;
        assert_eq!(
            encode_public_credential_values::<G1>(created_at, valid_to, t),
            G1::scalar_from_u64(expected)
        );
    }

    #[test]
    fn test_encode_ars_depends_on_set() {
        let ar = |x: u32| ArIdentity::try_from(x).expect("Non-zero identity.");
        let s1: BTreeSet<_> = [ar(1), ar(2)].into_iter().collect();
        let s2: BTreeSet<_> = [ar(2), ar(1)].into_iter().collect();
        let s3: BTreeSet<_> = [ar(1), ar(3)].into_iter().collect();
        assert_eq!(encode_ars::<G1>(&s1), encode_ars::<G1>(&s2));
        assert_ne!(encode_ars::<G1>(&s1), encode_ars::<G1>(&s3));
    }
}
