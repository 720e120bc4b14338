//! A thin wrapper around a scalar to indicate that it is a secret value.

use crate::{common::*, curve_arithmetic::*};
use rand::*;
use std::{
    ops::{Deref, Drop},
    ptr,
    rc::Rc,
    sync::atomic,
};

/// A generic wrapper for a secret that is overwritten with zero when dropped.
/// Other types are expected to wrap this in more convenient interfaces.
#[repr(transparent)]
#[derive(Debug, PartialEq, Eq)]
pub struct Secret<T: Field + Serialize> {
    secret: T,
}

impl<F: Field + Serialize> Secret<F> {
    pub fn new(secret: F) -> Self { Secret { secret } }
}

impl<F: Field + Serialize> AsRef<F> for Secret<F> {
    fn as_ref(&self) -> &F { &self.secret }
}

impl<F: Field + Serialize> Deref for Secret<F> {
    type Target = F;

    fn deref(&self) -> &Self::Target { &self.secret }
}

// The field elements we use are plain limb arrays, so a volatile write of
// zero clears the whole value.
impl<F: Field + Serialize> Drop for Secret<F> {
    fn drop(&mut self) {
        unsafe { ptr::write_volatile(&mut self.secret, F::zero()) }
        atomic::compiler_fence(atomic::Ordering::SeqCst);
    }
}

impl<F: Field + Serialize> Serial for Secret<F> {
    fn serial<B: Buffer>(&self, out: &mut B) { self.secret.serial(out) }
}

impl<F: Field + Serialize> Deserial for Secret<F> {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        Ok(Secret::new(source.get()?))
    }
}

/// A secret value. Marks scalars as secret so that there is no implicit
/// copy of them, and so that they are cleared once the last reference goes
/// away.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Value<C: Curve> {
    pub value: Rc<Secret<C::Scalar>>,
}

/// This trait allows automatic conversion of `&Value<C>` to `&C::Scalar`.
impl<C: Curve> Deref for Value<C> {
    type Target = C::Scalar;

    fn deref(&self) -> &C::Scalar { &self.value }
}

impl<C: Curve> AsRef<C::Scalar> for Value<C> {
    fn as_ref(&self) -> &C::Scalar { &self.value }
}

/// Any 64-bit value can be converted (by-value) to a scalar.
impl<C: Curve> From<u64> for Value<C> {
    fn from(secret: u64) -> Self { Self::new(C::scalar_from_u64(secret)) }
}

impl<C: Curve> Serial for Value<C> {
    fn serial<B: Buffer>(&self, out: &mut B) { out.put(&self.value) }
}

impl<C: Curve> Deserial for Value<C> {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        Ok(Value {
            value: source.get()?,
        })
    }
}

impl<C: Curve> Value<C> {
    pub fn new(secret: C::Scalar) -> Self {
        Self {
            value: Rc::new(Secret::new(secret)),
        }
    }

    /// Generate a single `Value` from a `csprng`.
    pub fn generate<T: Rng>(csprng: &mut T) -> Value<C> { Value::new(C::generate_scalar(csprng)) }

    /// Generate a non-zero value `Value` from a `csprng`.
    pub fn generate_non_zero<T: Rng>(csprng: &mut T) -> Value<C> {
        Value::new(C::generate_non_zero_scalar(csprng))
    }

    /// View the value as a value in another group. This does not
    /// copy the secret value.
    #[inline]
    pub fn view<T: Curve<Scalar = C::Scalar>>(&self) -> Value<T> {
        Value {
            value: self.value.clone(),
        }
    }

    /// Copy the secret into a new allocation and update it there.
    fn update_copy(&self, f: impl FnOnce(&mut C::Scalar)) -> Value<C> {
        let mut value = Rc::new(Secret::new(**self));
        // The allocation was just made, so it is not shared.
        if let Some(secret) = Rc::get_mut(&mut value) {
            f(&mut secret.secret);
        }
        Value { value }
    }

    /// `self + other` as a new secret.
    pub fn add(&self, other: &C::Scalar) -> Value<C> { self.update_copy(|v| v.add_assign(other)) }

    /// The multiplicative inverse as a new secret, or `None` for zero.
    pub fn inverse(&self) -> Option<Value<C>> {
        if self.is_zero() {
            return None;
        }
        let inv = self.update_copy(|v| {
            if let Some(inv) = v.inverse() {
                *v = inv;
            }
        });
        Some(inv)
    }
}
