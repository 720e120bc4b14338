//! Adapters that make arkworks fields and curve groups usable through the
//! [Field], [PrimeField] and [Curve] traits.
use ark_ec::{hashing::HashToCurve, AffineRepr, CurveGroup, Group};
use ark_ff::{Field as _, PrimeField as _};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::{One, UniformRand, Zero};
use byteorder::ReadBytesExt;
use core::fmt;

use crate::common::{deserial_bytes, Buffer, Deserial, ParseResult, Serial};

use super::{Curve, CurveDecodingError, Field, GenericMultiExp, PrimeField};

/// A field element. Serialized in big-endian byte order, of the length of the
/// arkworks compressed encoding.
#[derive(PartialEq, Eq, Copy, Clone, fmt::Debug)]
#[repr(transparent)]
pub struct ArkField<F: ark_ff::Field>(pub(crate) F);

impl<F: ark_ff::Field> ArkField<F> {
    pub fn into_ark(self) -> F { self.0 }
}

impl<F: ark_ff::Field> From<F> for ArkField<F> {
    fn from(value: F) -> Self { ArkField(value) }
}

impl<F: ark_ff::Field> Serial for ArkField<F> {
    fn serial<B: Buffer>(&self, out: &mut B) {
        let mut bytes = Vec::with_capacity(self.0.compressed_size());
        self.0
            .serialize_compressed(&mut bytes)
            .expect("Serializing a field element into a vector should not fail.");
        bytes.reverse();
        out.write_all(&bytes)
            .expect("Writing to a buffer should not fail.");
    }
}

/// Decoding rejects integers that are not fully reduced.
impl<F: ark_ff::Field> Deserial for ArkField<F> {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let len = F::zero().compressed_size();
        let mut bytes = deserial_bytes(source, len)?;
        bytes.reverse();
        let x = F::deserialize_compressed(&bytes[..])
            .map_err(|e| CurveDecodingError::NotInField(e.to_string()))?;
        Ok(ArkField(x))
    }
}

impl<F: ark_ff::Field> Field for ArkField<F> {
    fn random<R: rand::RngCore + ?std::marker::Sized>(rng: &mut R) -> Self {
        ArkField(F::rand(rng))
    }

    fn zero() -> Self { ArkField(F::zero()) }

    fn one() -> Self { ArkField(F::one()) }

    fn is_zero(&self) -> bool { self.0.is_zero() }

    fn square(&mut self) { self.0.square_in_place(); }

    fn double(&mut self) { self.0.double_in_place(); }

    fn negate(&mut self) { self.0 = -self.0; }

    fn add_assign(&mut self, other: &Self) { self.0 += other.0; }

    fn sub_assign(&mut self, other: &Self) { self.0 -= other.0; }

    fn mul_assign(&mut self, other: &Self) { self.0 *= other.0; }

    fn inverse(&self) -> Option<Self> { self.0.inverse().map(ArkField) }
}

impl<F: ark_ff::PrimeField> PrimeField for ArkField<F> {
    const CAPACITY: u32 = F::MODULUS_BIT_SIZE - 1;
    const NUM_BITS: u32 = F::MODULUS_BIT_SIZE;

    fn into_repr(self) -> Vec<u64> { self.0.into_bigint().as_ref().to_vec() }
}

/// Per-curve constants and the hash-to-curve construction.
pub trait ArkCurveConfig: CurveGroup {
    type Hasher: HashToCurve<Self>;

    /// Domain separation tag used when hashing to the group.
    const DOMAIN_STRING: &'static str;
    const GROUP_ELEMENT_LENGTH: usize;
    const SCALAR_LENGTH: usize;
}

/// An element of a prime order group given in projective coordinates.
/// Serialized in the compressed affine form.
#[derive(PartialEq, Eq, Copy, Clone, fmt::Debug)]
#[repr(transparent)]
pub struct ArkGroup<G: CurveGroup>(pub(crate) G);

impl<G: CurveGroup> ArkGroup<G> {
    pub fn into_ark(self) -> G { self.0 }
}

impl<G: CurveGroup> From<G> for ArkGroup<G> {
    fn from(value: G) -> Self { ArkGroup(value) }
}

impl<G: CurveGroup> Serial for ArkGroup<G> {
    fn serial<B: Buffer>(&self, out: &mut B) {
        let affine = self.0.into_affine();
        let mut bytes = Vec::with_capacity(affine.compressed_size());
        affine
            .serialize_compressed(&mut bytes)
            .expect("Serializing a point into a vector should not fail.");
        out.write_all(&bytes)
            .expect("Writing to a buffer should not fail.");
    }
}

/// Decoding checks that the point is on the curve and in the prime order
/// subgroup.
impl<G: CurveGroup> Deserial for ArkGroup<G> {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let len = G::Affine::zero().compressed_size();
        let bytes = deserial_bytes(source, len)?;
        let affine =
            G::Affine::deserialize_compressed(&bytes[..]).map_err(|_| CurveDecodingError::NotOnCurve)?;
        Ok(ArkGroup(affine.into_group()))
    }
}

impl<G: ArkCurveConfig> Curve for ArkGroup<G> {
    type MultiExpType = GenericMultiExp<Self>;
    type Scalar = ArkField<G::ScalarField>;

    const GROUP_ELEMENT_LENGTH: usize = G::GROUP_ELEMENT_LENGTH;
    const SCALAR_LENGTH: usize = G::SCALAR_LENGTH;

    fn zero_point() -> Self { ArkGroup(G::zero()) }

    fn one_point() -> Self { ArkGroup(G::generator()) }

    fn is_zero_point(&self) -> bool { self.0.is_zero() }

    fn inverse_point(&self) -> Self { ArkGroup(-self.0) }

    fn double_point(&self) -> Self { ArkGroup(Group::double(&self.0)) }

    fn plus_point(&self, other: &Self) -> Self { ArkGroup(self.0 + other.0) }

    fn minus_point(&self, other: &Self) -> Self { ArkGroup(self.0 - other.0) }

    fn mul_by_scalar(&self, scalar: &Self::Scalar) -> Self { ArkGroup(self.0 * scalar.0) }

    fn generate<R: rand::Rng>(rng: &mut R) -> Self { ArkGroup(G::rand(rng)) }

    fn generate_scalar<R: rand::Rng>(rng: &mut R) -> Self::Scalar {
        ArkField(<G::ScalarField as UniformRand>::rand(rng))
    }

    fn scalar_from_u64(n: u64) -> Self::Scalar { ArkField(G::ScalarField::from(n)) }

    fn scalar_from_bytes<A: AsRef<[u8]>>(bs: A) -> Self::Scalar {
        ArkField(<G::ScalarField as ark_ff::PrimeField>::from_be_bytes_mod_order(
            bs.as_ref(),
        ))
    }

    fn hash_to_group(m: &[u8]) -> Result<Self, CurveDecodingError> {
        let hasher = G::Hasher::new(G::DOMAIN_STRING.as_bytes())
            .map_err(|e| CurveDecodingError::HashingFailed(e.to_string()))?;
        let point = hasher
            .hash(m)
            .map_err(|e| CurveDecodingError::HashingFailed(e.to_string()))?;
        Ok(ArkGroup(point.into_group()))
    }
}
