//! Group, field and pairing abstractions the credential protocols are
//! written against, together with their instantiation on BLS12-381.
pub mod arkworks_instances;
mod bls12_381_arkworks;

pub mod secret_value;
pub use bls12_381_arkworks::{Bls12, G1, G2};
pub use secret_value::{Secret, Value};

use crate::common::{Serial, Serialize};
use rand::*;
use std::{borrow::Borrow, fmt, fmt::Debug};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CurveDecodingError {
    #[error("Not a point on the curve.")]
    NotOnCurve,
    #[error("{0} is not a field element.")]
    NotInField(String),
    #[error("Could not hash to the group: {0}")]
    HashingFailed(String),
}

/// This trait represents an element of a field.
pub trait Field: Sized + Eq + Copy + Clone + Send + Sync + fmt::Debug {
    /// Returns an element chosen uniformly at random using a user-provided RNG.
    fn random<R: RngCore + ?std::marker::Sized>(rng: &mut R) -> Self;

    /// Returns the zero element of the field, the additive identity.
    fn zero() -> Self;

    /// Returns the one element of the field, the multiplicative identity.
    fn one() -> Self;

    /// Returns true iff this element is zero.
    fn is_zero(&self) -> bool;

    /// Squares this element.
    fn square(&mut self);

    /// Doubles this element.
    fn double(&mut self);

    /// Negates this element.
    fn negate(&mut self);

    /// Adds another element to this element.
    fn add_assign(&mut self, other: &Self);

    /// Subtracts another element from this element.
    fn sub_assign(&mut self, other: &Self);

    /// Multiplies another element by this element.
    fn mul_assign(&mut self, other: &Self);

    /// Computes the multiplicative inverse of this element, if nonzero.
    fn inverse(&self) -> Option<Self>;
}

/// A field of prime order with access to the big integer representation of
/// its elements.
pub trait PrimeField: Field {
    /// How many bits are needed to represent an element of this field.
    const NUM_BITS: u32;

    /// How many bits of information can be reliably stored in the field
    /// element.
    const CAPACITY: u32;

    /// Get a big integer representation with least significant digit first.
    fn into_repr(self) -> Vec<u64>;
}

/// A group of prime order together with its scalar field. Everything the
/// commitment, encryption and proof layers need from the underlying curve.
pub trait Curve:
    Serialize + Copy + Clone + Sized + Send + Sync + Debug + PartialEq + Eq + 'static {
    /// The prime field of the group order size.
    type Scalar: PrimeField + Serialize;
    type MultiExpType: MultiExp<CurvePoint = Self>;
    /// Size in bytes of elements of the [Curve::Scalar] field.
    const SCALAR_LENGTH: usize;
    /// Size in bytes of group elements when serialized.
    const GROUP_ELEMENT_LENGTH: usize;
    /// Create new instance of multiexp algorithm given some initial points.
    fn new_multiexp<X: Borrow<Self>>(gs: &[X]) -> Self::MultiExpType { Self::MultiExpType::new(gs) }
    /// Unit for the group operation.
    fn zero_point() -> Self;
    /// Chosen generator of the group.
    fn one_point() -> Self;
    fn is_zero_point(&self) -> bool;
    #[must_use]
    /// Return the group inverse of the given element.
    fn inverse_point(&self) -> Self;
    #[must_use]
    /// Given x compute x + x.
    fn double_point(&self) -> Self;
    #[must_use]
    /// The group operation.
    fn plus_point(&self, other: &Self) -> Self;
    #[must_use]
    /// Subtraction.
    fn minus_point(&self, other: &Self) -> Self;
    #[must_use]
    /// Exponentiation by a scalar.
    fn mul_by_scalar(&self, scalar: &Self::Scalar) -> Self;
    /// Generate a random group element, uniformly distributed.
    fn generate<R: Rng>(rng: &mut R) -> Self;
    /// Generate a random scalar value, uniformly distributed.
    fn generate_scalar<R: Rng>(rng: &mut R) -> Self::Scalar;
    /// Generate a non-zero scalar by repeated sampling.
    fn generate_non_zero_scalar<R: Rng>(rng: &mut R) -> Self::Scalar {
        loop {
            let s = Self::generate_scalar(rng);
            if !s.is_zero() {
                return s;
            }
        }
    }
    /// Make a scalar from a 64-bit unsigned integer.
    fn scalar_from_u64(n: u64) -> Self::Scalar;
    /// Make a scalar by interpreting the bytes as a big-endian integer and
    /// reducing it modulo the group order.
    fn scalar_from_bytes<A: AsRef<[u8]>>(bs: A) -> Self::Scalar;
    /// Hash to a curve point from a seed. This is a deterministic function.
    fn hash_to_group(m: &[u8]) -> Result<Self, CurveDecodingError>;
}

/// An abstraction over a multiexp algorithm.
pub trait MultiExp {
    type CurvePoint: Curve;

    /// Create new algorithm instance by providing initial points.
    fn new<X: Borrow<Self::CurvePoint>>(gs: &[X]) -> Self;

    /// Multiexp algorithm that uses points provided at the instantiation step
    /// and scalars provided as a parameter.
    fn multiexp<X: Borrow<<Self::CurvePoint as Curve>::Scalar>>(
        &self,
        exps: &[X],
    ) -> Self::CurvePoint;
}

pub struct GenericMultiExp<C> {
    table:       Vec<Vec<C>>,
    window_size: usize,
}

impl<C: Curve> GenericMultiExp<C> {
    const DEFAULT_WINDOW_SIZE: usize = 4;

    /// Compute the table of odd multiples of each base used by `multiexp`.
    pub fn new<X: Borrow<C>>(gs: &[X], window_size: usize) -> Self {
        let num_exponents = 1 << (window_size - 1);
        let table = gs
            .iter()
            .map(|g| {
                let g = *g.borrow();
                let sq = g.double_point();
                let mut exps = Vec::with_capacity(num_exponents);
                let mut tmp = g;
                exps.push(tmp);
                for _ in 1..num_exponents {
                    tmp = tmp.plus_point(&sq);
                    exps.push(tmp);
                }
                exps
            })
            .collect();
        Self { table, window_size }
    }

    /// Width-(w+1) non-adjacent form of a scalar, least significant digit
    /// first.
    fn wnaf(&self, limbs: &[u64]) -> Vec<i64> {
        let window_size_plus1 = self.window_size + 1;
        let width = 1u64 << window_size_plus1;
        let window_mask = width - 1;
        let num_bits = limbs.len() * 64;

        let mut pos = 0;
        let mut carry = 0;
        let mut digits = Vec::with_capacity(num_bits + 1);
        while pos < num_bits {
            let u64_idx = pos / 64;
            let bit_idx = pos % 64;
            let cur_u64 = limbs[u64_idx];
            let bit_buf = if bit_idx + window_size_plus1 < 64 {
                cur_u64 >> bit_idx
            } else {
                let next_u64 = limbs.get(u64_idx + 1).copied().unwrap_or(0);
                (cur_u64 >> bit_idx) | (next_u64.checked_shl(64 - bit_idx as u32).unwrap_or(0))
            };

            let window_val = carry + (bit_buf & window_mask);
            if window_val & 1 == 0 {
                digits.push(0);
                pos += 1;
            } else {
                let digit = if window_val < width / 2 {
                    carry = 0;
                    window_val as i64
                } else {
                    carry = 1;
                    (window_val as i64).wrapping_sub(width as i64)
                };
                digits.push(digit);
                digits.extend(std::iter::repeat(0).take(window_size_plus1 - 1));
                pos += window_size_plus1;
            }
        }
        if carry == 1 {
            digits.push(1);
        }
        digits
    }
}

impl<C: Curve> MultiExp for GenericMultiExp<C> {
    type CurvePoint = C;

    fn new<X: Borrow<C>>(gs: &[X]) -> Self { Self::new(gs, Self::DEFAULT_WINDOW_SIZE) }

    /// The wNAF method of Möller, "Algorithms for multi-exponentiation".
    /// Scalars beyond the number of bases are ignored, as are bases beyond the
    /// number of scalars.
    fn multiexp<X: Borrow<<Self::CurvePoint as Curve>::Scalar>>(
        &self,
        exps: &[X],
    ) -> Self::CurvePoint {
        let wnafs: Vec<Vec<i64>> = exps
            .iter()
            .map(|c| self.wnaf(&c.borrow().into_repr()))
            .collect();
        let max_len = wnafs.iter().map(Vec::len).max().unwrap_or(0);

        let mut a = C::zero_point();
        for j in (0..max_len).rev() {
            a = a.double_point();
            for (wnaf_i, table_i) in wnafs.iter().zip(self.table.iter()) {
                match wnaf_i.get(j) {
                    Some(&ge) if ge > 0 => {
                        a = a.plus_point(&table_i[(ge / 2) as usize]);
                    }
                    Some(&ge) if ge < 0 => {
                        a = a.minus_point(&table_i[((-ge) / 2) as usize]);
                    }
                    _ => (),
                }
            }
        }
        a
    }
}

/// A pairing friendly curve is a collection of two groups and a pairing
/// function. The groups must be of prime order.
pub trait Pairing: Sized + 'static + Clone + Debug + Eq + Send + Sync {
    type ScalarField: PrimeField + Serialize;
    /// The first group of the pairing.
    type G1: Curve<Scalar = Self::ScalarField>;
    /// The second group, of the same order as [Pairing::G1].
    type G2: Curve<Scalar = Self::ScalarField>;
    /// The target of the pairing function. Only the multiplicative subgroup of
    /// order equal to the order of G1 is ever reached.
    type TargetField: Field + Serial;

    /// Compute the pairing of the two points.
    fn pair(p: &Self::G1, q: &Self::G2) -> Self::TargetField;

    /// Compute `e(g1x, g2x) * e(g1y, g2y)` with a shared final exponentiation.
    fn pairing_product(
        g1x: &Self::G1,
        g2x: &Self::G2,
        g1y: &Self::G1,
        g2y: &Self::G2,
    ) -> Self::TargetField;

    /// Check whether `e(g1x, g2x) = e(g1y, g2y)`.
    fn check_pairing_eq(g1x: &Self::G1, g2x: &Self::G2, g1y: &Self::G1, g2y: &Self::G2) -> bool {
        let res = Self::pairing_product(g1x, g2x, &g1y.inverse_point(), g2y);
        res == Self::TargetField::one()
    }

    fn generate_scalar<R: Rng>(rng: &mut R) -> Self::ScalarField {
        <Self::G1 as Curve>::generate_scalar(rng)
    }

    fn generate_non_zero_scalar<R: Rng>(rng: &mut R) -> Self::ScalarField {
        <Self::G1 as Curve>::generate_non_zero_scalar(rng)
    }
}

/// Calls a multiexp algorithm for a curve.
/// The function combines instantiation of an algorithm implementation and
/// computation.
#[inline(always)]
pub fn multiexp<C, X>(gs: &[X], exps: &[C::Scalar]) -> C
where
    C: Curve,
    X: Borrow<C>, {
    C::new_multiexp(gs).multiexp(exps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{serialize_deserialize, to_bytes};

    #[test]
    pub fn test_multiscalar() {
        let mut csprng = thread_rng();
        for l in 1..50 {
            let mut gs = Vec::with_capacity(l);
            let mut es = Vec::with_capacity(l);
            for _ in 0..l {
                gs.push(G1::generate(&mut csprng));
                es.push(G1::generate_scalar(&mut csprng));
            }
            let mut goal = G1::zero_point();
            for (g, e) in gs.iter().zip(es.iter()) {
                goal = goal.plus_point(&g.mul_by_scalar(e))
            }
            let g = multiexp(&gs, &es);
            assert!(
                goal.minus_point(&g).is_zero_point(),
                "Multiexponentiation produces a different answer than the naive method."
            )
        }
    }

    #[test]
    pub fn test_multiscalar_edge_scalars() {
        let mut csprng = thread_rng();
        let g = G1::generate(&mut csprng);
        let h = G1::generate(&mut csprng);
        let mut minus_one = <G1 as Curve>::Scalar::one();
        minus_one.negate();
        let zero = <G1 as Curve>::Scalar::zero();
        let res = multiexp(&[g, h], &[minus_one, zero]);
        assert_eq!(res, g.inverse_point());
    }

    #[test]
    pub fn test_element_lengths() {
        let mut csprng = thread_rng();
        let g1 = G1::generate(&mut csprng);
        let g2 = G2::generate(&mut csprng);
        let s = G1::generate_scalar(&mut csprng);
        assert_eq!(to_bytes(&g1).len(), G1::GROUP_ELEMENT_LENGTH);
        assert_eq!(to_bytes(&g2).len(), G2::GROUP_ELEMENT_LENGTH);
        assert_eq!(to_bytes(&s).len(), G1::SCALAR_LENGTH);
        assert_eq!(serialize_deserialize(&g1).ok(), Some(g1));
        assert_eq!(serialize_deserialize(&g2).ok(), Some(g2));
        assert_eq!(serialize_deserialize(&s).ok(), Some(s));
    }

    #[test]
    pub fn test_scalar_encoding_is_big_endian() {
        let bytes = to_bytes(&G1::scalar_from_u64(258));
        assert_eq!(&bytes[..30], &[0u8; 30]);
        assert_eq!(&bytes[30..], &[1, 2]);
    }

    #[test]
    pub fn test_non_canonical_scalar_rejected() {
        // The all-ones string is larger than the BLS12-381 group order.
        let bytes = [0xffu8; 32];
        let res: crate::common::ParseResult<<G1 as Curve>::Scalar> =
            crate::common::from_bytes(&mut std::io::Cursor::new(&bytes));
        assert!(res.is_err());
    }

    #[test]
    pub fn test_malformed_point_rejected() {
        let bytes = to_bytes(&G1::generate(&mut thread_rng()));
        // Points are always encoded with the compression flag set.
        let mut uncompressed_flag = bytes.clone();
        uncompressed_flag[0] &= 0x7f;
        let res: crate::common::ParseResult<G1> =
            crate::common::from_bytes(&mut std::io::Cursor::new(&uncompressed_flag));
        assert!(res.is_err(), "Missing compression flag must be rejected.");
        let res: crate::common::ParseResult<G1> =
            crate::common::from_bytes(&mut std::io::Cursor::new(&bytes[..40]));
        assert!(res.is_err(), "Truncated points must be rejected.");
    }

    #[test]
    pub fn test_hash_to_group_deterministic() {
        let a = G1::hash_to_group(b"genesis").expect("Hashing should succeed.");
        let b = G1::hash_to_group(b"genesis").expect("Hashing should succeed.");
        let c = G1::hash_to_group(b"genesis2").expect("Hashing should succeed.");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(!a.is_zero_point());
    }

    #[test]
    pub fn test_pairing_bilinear() {
        let mut csprng = thread_rng();
        let a = G1::generate_scalar(&mut csprng);
        let b = G1::generate_scalar(&mut csprng);
        let mut ab = a;
        ab.mul_assign(&b);
        let p = G1::one_point();
        let q = G2::one_point();
        assert!(Bls12::check_pairing_eq(
            &p.mul_by_scalar(&a),
            &q.mul_by_scalar(&b),
            &p.mul_by_scalar(&ab),
            &q
        ));
        assert!(!Bls12::check_pairing_eq(
            &p.mul_by_scalar(&a),
            &q.mul_by_scalar(&b),
            &p.mul_by_scalar(&a),
            &q
        ));
    }
}
