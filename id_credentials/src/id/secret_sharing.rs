//! Shamir secret sharing over the scalar field, with reconstruction both of
//! the scalar and of a group element that has the secret in the exponent.
use crate::{common::*, curve_arithmetic::*};
use anyhow::bail;
use rand::*;
use std::convert::TryFrom;

/// Revealing threshold, i.e., degree of the polynomial + 1.
/// This value must always be at least 1.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, SerdeSerialize, SerdeDeserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Threshold(u8);

impl Serial for Threshold {
    fn serial<B: Buffer>(&self, out: &mut B) { out.put(&self.0) }
}

impl Deserial for Threshold {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let x: u8 = source.get()?;
        if x >= 1 {
            Ok(Threshold(x))
        } else {
            bail!("Threshold must be at least 1.")
        }
    }
}

impl Threshold {
    /// Curve scalars must be big enough to accommodate all 8 bit unsigned
    /// integers.
    pub fn to_scalar<C: Curve>(self) -> C::Scalar { C::scalar_from_u64(u64::from(self.0)) }
}

impl From<Threshold> for u8 {
    fn from(x: Threshold) -> Self { x.0 }
}

impl From<Threshold> for usize {
    fn from(x: Threshold) -> Self { x.0.into() }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Threshold must be between 1 and 255.")]
pub struct ThresholdOutOfRange;

impl TryFrom<u8> for Threshold {
    type Error = ThresholdOutOfRange;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value == 0 {
            Err(ThresholdOutOfRange)
        } else {
            Ok(Threshold(value))
        }
    }
}

impl TryFrom<usize> for Threshold {
    type Error = ThresholdOutOfRange;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        match u8::try_from(value) {
            Ok(v) => Threshold::try_from(v),
            Err(_) => Err(ThresholdOutOfRange),
        }
    }
}

impl std::fmt::Display for Threshold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { self.0.fmt(f) }
}

/// Data used to share a single value.
pub struct SharingData<C: Curve> {
    /// The coefficients of the sharing polynomial, except the zeroth.
    pub coefficients: Vec<Value<C>>,
    /// Shares, i.e., evaluations of the polynomial at the requested points,
    /// in the order the points were given.
    pub shares:       Vec<Value<C>>,
}

/// Share `secret` so that any `revealing_threshold` of the shares determine
/// it. The points must be distinct and non-zero, since the share at zero is
/// the secret itself. The preconditions are not checked.
pub fn share<C: Curve, P: Into<u64>, I: IntoIterator<Item = P>, R: Rng>(
    secret: &C::Scalar,
    points: I,
    revealing_threshold: Threshold,
    csprng: &mut R,
) -> SharingData<C> {
    let deg = u8::from(revealing_threshold) - 1;

    // The zeroth coefficient is the secret. The remaining ones are random,
    // with the top one non-zero so that the polynomial has exactly the
    // required degree.
    let mut coefficients: Vec<Value<C>> = Vec::with_capacity(deg.into());
    for _ in 1..deg {
        coefficients.push(Value::generate(csprng));
    }
    if deg > 0 {
        coefficients.push(Value::generate_non_zero(csprng));
    }

    let shares = points
        .into_iter()
        .map(|p| {
            let x = C::scalar_from_u64(p.into());
            let mut share = C::Scalar::zero();
            for coeff in coefficients.iter().rev() {
                share.mul_assign(&x);
                share.add_assign(coeff);
            }
            share.mul_assign(&x);
            share.add_assign(secret);
            Value::new(share)
        })
        .collect();

    SharingData {
        coefficients,
        shares,
    }
}

/// The Lagrange basis polynomial for `i` over the points `kxs`, evaluated at
/// zero.
pub fn lagrange<P: Into<u64> + Copy, C: Curve>(kxs: &[P], i: P) -> C::Scalar {
    let point = C::scalar_from_u64(i.into());
    kxs.iter().fold(C::Scalar::one(), |accum, &j| {
        let mut fe_j = C::scalar_from_u64(j.into());
        let mut j_minus_i = fe_j;
        j_minus_i.sub_assign(&point);
        match j_minus_i.inverse() {
            // j == i
            None => accum,
            Some(z) => {
                fe_j.mul_assign(&z);
                fe_j.mul_assign(&accum);
                fe_j
            }
        }
    })
}

/// Given a list of length n of pairs (x_i, y_i), with all x_i distinct,
/// interpolate a polynomial f of max degree n-1 and return f(0).
/// This function does not check the precondition.
pub fn reveal<P: Into<u64> + Copy, C: Curve>(shares: &[(P, Value<C>)]) -> C::Scalar {
    let kxs = shares.iter().map(|(fst, _)| *fst).collect::<Vec<_>>();
    shares.iter().fold(C::Scalar::zero(), |accum, (i, v)| {
        let mut s = lagrange::<P, C>(&kxs, *i);
        s.mul_assign(v);
        s.add_assign(&accum);
        s
    })
}

/// Same as [reveal], but the shares are group elements `g^{f(x_i)}` and the
/// result is `g^{f(0)}`. The scalar `f(0)` is never computed.
pub fn reveal_in_group<P: Into<u64> + Copy, C: Curve>(shares: &[(P, C)]) -> C {
    let kxs = shares.iter().map(|(fst, _)| *fst).collect::<Vec<_>>();
    let (points, coeffs): (Vec<C>, Vec<C::Scalar>) = shares
        .iter()
        .map(|(i, v)| (*v, lagrange::<P, C>(&kxs, *i)))
        .unzip();
    multiexp(&points, &coeffs)
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::seq::SliceRandom;

    #[test]
    pub fn test_lagrange() {
        // For any kxs, the 0'th Lagrange polynomial is 1 at x=0
        let kxs = vec![1u32, 2, 3];
        let r = lagrange::<u32, G1>(&kxs, 0);
        assert_eq!(r, G1::scalar_from_u64(1));

        let kxs = vec![1u32, 2];
        let r = lagrange::<u32, G1>(&kxs, 1);
        assert_eq!(r, G1::scalar_from_u64(2));
    }

    #[test]
    pub fn test_threshold_range() {
        assert!(Threshold::try_from(0u8).is_err());
        assert!(Threshold::try_from(256usize).is_err());
        assert_eq!(Threshold::try_from(255usize).map(u8::from), Ok(255));
        assert!(from_bytes::<Threshold, _>(&mut std::io::Cursor::new([0u8])).is_err());
        let t: Result<Threshold, _> = serde_json::from_str("0");
        assert!(t.is_err());
    }

    /// We have n shares and the degree of the sharing polynomial is t - 1,
    /// meaning there are t - 1 coefficients since the constant term is the
    /// secret.
    #[test]
    pub fn test_share_output_length() {
        let mut csprng = thread_rng();
        let secret = G1::generate_scalar(&mut csprng);
        let n = csprng.gen_range(1u32..200);
        let mut xs = (1..=n).collect::<Vec<_>>();
        xs.shuffle(&mut csprng);

        let t = csprng.gen_range(1..=std::cmp::min(n, 255));
        let threshold = Threshold::try_from(t as u8).expect("Threshold is at least 1.");
        let shared = share::<G1, _, _, _>(&secret, xs, threshold, &mut csprng);

        assert_eq!(shared.coefficients.len() + 1, t as usize);
        assert_eq!(shared.shares.len(), n as usize);
    }

    /// Enough shares reconstruct the secret. A single wrong share, or too
    /// few shares, give something different.
    #[test]
    pub fn test_secret_sharing() {
        let mut csprng = thread_rng();
        for i in 1u8..10 {
            let generator = G1::one_point().mul_by_scalar(&G1::generate_non_zero_scalar(&mut csprng));
            let secret = G1::generate_scalar(&mut csprng);
            let secret_point = generator.mul_by_scalar(&secret);
            let threshold = csprng.gen_range(1..=i);

            let mut xs = (1..=i).collect::<Vec<_>>();
            xs.shuffle(&mut csprng);

            let sharing_data = share::<G1, _, _, _>(
                &secret,
                xs.iter().copied(),
                Threshold::try_from(threshold).expect("Threshold is at least 1."),
                &mut csprng,
            );
            let mut shares = xs
                .iter()
                .copied()
                .zip(sharing_data.shares)
                .collect::<Vec<_>>();
            shares.shuffle(&mut csprng);

            let sufficient_sample = &shares[0..(threshold as usize)];
            let sufficient_sample_points = sufficient_sample
                .iter()
                .map(|(n, s)| (*n, generator.mul_by_scalar(s)))
                .collect::<Vec<(u8, G1)>>();
            assert_eq!(reveal::<_, G1>(sufficient_sample), secret);
            assert_eq!(
                reveal_in_group::<_, G1>(&sufficient_sample_points),
                secret_point
            );

            // One wrong share.
            let mut erroneous = sufficient_sample.to_vec();
            if let Some(rand_elm) = erroneous.choose_mut(&mut csprng) {
                rand_elm.1 = Value::generate_non_zero(&mut csprng);
            }
            let erroneous_points = erroneous
                .iter()
                .map(|(n, s)| (*n, generator.mul_by_scalar(s)))
                .collect::<Vec<(u8, G1)>>();
            assert_ne!(reveal_in_group::<_, G1>(&erroneous_points), secret_point);

            // Too few shares.
            if threshold > 1 {
                let insufficient_sample = &shares[0..((threshold - 1) as usize)];
                assert_ne!(reveal::<_, G1>(insufficient_sample), secret);
            }
        }
    }
}
