use anyhow::{anyhow, bail, Context};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use core::cmp;
use sha2::Digest;
use std::{
    collections::btree_map::BTreeMap,
    convert::{TryFrom, TryInto},
    io::Read,
};

static MAX_PREALLOCATED_CAPACITY: usize = 4096;

/// Result when deserializing a value. Every decoding failure is reported as an
/// [anyhow::Error] with a description of what was malformed.
pub type ParseResult<T> = anyhow::Result<T>;

/// As Vec::with_capacity, but only allocate maximum MAX_PREALLOCATED_CAPACITY
/// elements. Lengths read from untrusted input go through this.
#[inline]
pub fn safe_with_capacity<T>(capacity: usize) -> Vec<T> {
    Vec::with_capacity(cmp::min(capacity, MAX_PREALLOCATED_CAPACITY))
}

/// Trait for types which can be recovered from byte sources.
pub trait Deserial: Sized {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self>;
}

impl Deserial for u64 {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<u64> {
        Ok(source.read_u64::<BigEndian>()?)
    }
}

impl Deserial for u32 {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<u32> {
        Ok(source.read_u32::<BigEndian>()?)
    }
}

impl Deserial for u16 {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<u16> {
        Ok(source.read_u16::<BigEndian>()?)
    }
}

impl Deserial for u8 {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<u8> { Ok(source.read_u8()?) }
}

impl Deserial for bool {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        match source.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            x => bail!("Unrecognized boolean value {}", x),
        }
    }
}

impl Deserial for std::num::NonZeroU32 {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let value = source.get()?;
        Self::new(value).context("Zero is not valid.")
    }
}

impl Deserial for std::num::NonZeroU8 {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let value = source.get()?;
        Self::new(value).context("Zero is not valid.")
    }
}

/// Read a vector where the first 8 bytes are taken as length in big endian.
impl<T: Deserial> Deserial for Vec<T> {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let len: u64 = u64::deserial(source)?;
        deserial_vector_no_length(source, usize::try_from(len)?)
    }
}

impl<T: Deserial, U: Deserial> Deserial for (T, U) {
    #[inline]
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let x = T::deserial(source)?;
        let y = U::deserial(source)?;
        Ok((x, y))
    }
}

impl<S: Deserial, T: Deserial, U: Deserial> Deserial for (S, T, U) {
    #[inline]
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let x = S::deserial(source)?;
        let y = T::deserial(source)?;
        let z = U::deserial(source)?;
        Ok((x, y, z))
    }
}

/// Read a string of given size.
/// NB: This allocates a buffer of the given length, so it must only be used
/// when the length is bounded by the format.
pub fn deserial_string<R: ReadBytesExt>(reader: &mut R, l: usize) -> ParseResult<String> {
    let mut svec = vec![0; l];
    reader.read_exact(&mut svec)?;
    Ok(String::from_utf8(svec)?)
}

/// Write a string directly to the provided sink (without encoding its length).
pub fn serial_string<R: Buffer>(s: &str, out: &mut R) {
    out.write_all(s.as_bytes())
        .expect("Writing to buffer should succeed.")
}

/// Read a vector of a given size. Only a bounded amount of memory is
/// preallocated, the rest is allocated as elements are successfully parsed.
pub fn deserial_vector_no_length<R: ReadBytesExt, T: Deserial>(
    reader: &mut R,
    len: usize,
) -> ParseResult<Vec<T>> {
    let mut vec = safe_with_capacity(len);
    for _ in 0..len {
        vec.push(T::deserial(reader)?);
    }
    Ok(vec)
}

/// Read exactly `l` bytes.
pub fn deserial_bytes<R: ReadBytesExt>(reader: &mut R, l: usize) -> ParseResult<Vec<u8>> {
    let mut svec = vec![0; l];
    reader.read_exact(&mut svec)?;
    Ok(svec)
}

/// Trait for writers which will not fail in normal operation with
/// small amounts of data, e.g., Vec<u8>. It is also implemented for the
/// SHA-256 hasher so that values can be hashed without an intermediate buffer.
pub trait Buffer: Sized + WriteBytesExt {
    type Result;
    fn start() -> Self;
    fn start_hint(_l: usize) -> Self { Self::start() }
    fn result(self) -> Self::Result;
}

impl Buffer for Vec<u8> {
    type Result = Vec<u8>;

    fn start() -> Vec<u8> { Vec::new() }

    fn start_hint(l: usize) -> Vec<u8> { Vec::with_capacity(l) }

    fn result(self) -> Self::Result { self }
}

impl Buffer for sha2::Sha256 {
    type Result = [u8; 32];

    fn start() -> Self { sha2::Sha256::new() }

    fn result(self) -> Self::Result { self.finalize().into() }
}

/// Trait implemented by types which can be encoded into byte arrays.
/// The encoding is binary, big endian, and not self-describing.
pub trait Serial {
    fn serial<B: Buffer>(&self, _out: &mut B);
}

impl Serial for u64 {
    fn serial<B: Buffer>(&self, out: &mut B) {
        out.write_u64::<BigEndian>(*self)
            .expect("Writing to a buffer should not fail.")
    }
}

impl Serial for u32 {
    fn serial<B: Buffer>(&self, out: &mut B) {
        out.write_u32::<BigEndian>(*self)
            .expect("Writing to a buffer should not fail.")
    }
}

impl Serial for u16 {
    fn serial<B: Buffer>(&self, out: &mut B) {
        out.write_u16::<BigEndian>(*self)
            .expect("Writing to a buffer should not fail.")
    }
}

impl Serial for u8 {
    fn serial<B: Buffer>(&self, out: &mut B) {
        out.write_u8(*self)
            .expect("Writing to a buffer should not fail.")
    }
}

impl Serial for bool {
    fn serial<B: Buffer>(&self, out: &mut B) { u8::from(*self).serial(out) }
}

impl Serial for std::num::NonZeroU32 {
    fn serial<B: Buffer>(&self, out: &mut B) { self.get().serial(out) }
}

impl Serial for std::num::NonZeroU8 {
    fn serial<B: Buffer>(&self, out: &mut B) { self.get().serial(out) }
}

/// Serialize a vector by encoding its length as a u64 in big endian and then
/// the list of elements in sequence.
impl<T: Serial> Serial for Vec<T> {
    fn serial<B: Buffer>(&self, out: &mut B) {
        (self.len() as u64).serial(out);
        serial_vector_no_length(self, out)
    }
}

/// Serialize all of the elements in the iterator.
pub fn serial_iter<'a, B: Buffer, T: Serial + 'a, I: Iterator<Item = &'a T>>(xs: I, out: &mut B) {
    for x in xs {
        x.serial(out);
    }
}

/// Write an array without including length information.
pub fn serial_vector_no_length<B: Buffer, T: Serial>(xs: &[T], out: &mut B) {
    serial_iter(xs.iter(), out)
}

/// Serialize an ordered map. Serialization is by increasing order of keys.
pub fn serial_map_no_length<B: Buffer, K: Serial, V: Serial>(map: &BTreeMap<K, V>, out: &mut B) {
    for (k, v) in map.iter() {
        out.put(k);
        out.put(v);
    }
}

/// Deserialize a map from a byte source. This ensures there are no duplicates,
/// as well as that all keys are in strictly increasing order.
pub fn deserial_map_no_length<R: ReadBytesExt, K: Deserial + Ord + Copy, V: Deserial>(
    source: &mut R,
    len: usize,
) -> ParseResult<BTreeMap<K, V>> {
    let mut out = BTreeMap::new();
    let mut last = None;
    for _ in 0..len {
        let k = source.get()?;
        let v = source.get()?;
        if let Some(kk) = last {
            if k <= kk {
                bail!("Keys not in order.")
            }
        }
        out.insert(k, v);
        last = Some(k);
    }
    Ok(out)
}

impl<T: Serial, S: Serial> Serial for (T, S) {
    #[inline]
    fn serial<B: Buffer>(&self, out: &mut B) {
        self.0.serial(out);
        self.1.serial(out);
    }
}

impl<S: Serial, T: Serial, U: Serial> Serial for (S, T, U) {
    #[inline]
    fn serial<B: Buffer>(&self, out: &mut B) {
        self.0.serial(out);
        self.1.serial(out);
        self.2.serial(out);
    }
}

impl Serial for [u8] {
    #[inline]
    fn serial<B: Buffer>(&self, out: &mut B) {
        out.write_all(self).expect("Writing to buffer is safe.");
    }
}

impl<T: Serial> Serial for &T {
    fn serial<B: Buffer>(&self, target: &mut B) { (*self).serial(target) }
}

impl<T: Serial, const N: usize> Serial for [T; N] {
    fn serial<B: Buffer>(&self, out: &mut B) {
        for x in self.iter() {
            x.serial(out);
        }
    }
}

impl<T: Deserial, const N: usize> Deserial for [T; N] {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let out_vec = deserial_vector_no_length(source, N)?;
        out_vec
            .try_into()
            .map_err(|_| anyhow!("Could not read an array of length {}.", N))
    }
}

/// Analogue of [Deserial], but instead this has the type to serialize as a type
/// parameter, and is implemented once for a source. It is often more
/// convenient since the typechecker fills in the type: contrast
/// `A::deserial(source)` to `source.get()`.
pub trait Get<A> {
    fn get(&mut self) -> ParseResult<A>;
}

impl<R: ReadBytesExt, A: Deserial> Get<A> for R {
    #[inline]
    fn get(&mut self) -> ParseResult<A> { A::deserial(self) }
}

/// Dual to `Get`, and the analogue of `Serial`. It allows writing
/// `sink.put(value)` in contrast to `value.serial(sink)`.
pub trait Put<A> {
    fn put(&mut self, _v: &A);
}

impl<R: Buffer, A: Serial> Put<A> for R {
    #[inline]
    fn put(&mut self, v: &A) { v.serial(self) }
}

/// A convenient way to refer to both [Serial] and [Deserial] together.
pub trait Serialize: Serial + Deserial {}

impl<A: Deserial + Serial> Serialize for A {}

/// Directly serialize to a vector of bytes.
#[inline]
pub fn to_bytes<A: Serial>(x: &A) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.put(x);
    buf
}

/// A small wrapper that is sometimes more convenient than `A::deserial`.
#[inline]
pub fn from_bytes<A: Deserial, R: ReadBytesExt>(source: &mut R) -> ParseResult<A> {
    A::deserial(source)
}

/// Parse a complete byte slice. Trailing bytes are an error.
pub fn from_bytes_complete<A: Deserial>(bytes: &[u8]) -> ParseResult<A> {
    let mut cursor = std::io::Cursor::new(bytes);
    let value = A::deserial(&mut cursor)?;
    if cursor.position() != bytes.len() as u64 {
        bail!(
            "{} trailing bytes after the value.",
            bytes.len() as u64 - cursor.position()
        )
    }
    Ok(value)
}

// Helpers for json serialization

use hex::{decode, encode};
use serde::{de, de::Visitor, Deserializer, Serializer};
use std::fmt;

/// Encode the given value into a byte array using its [Serial] instance, and
/// then encode that byte array as a hex string into the provided serde
/// Serializer.
pub fn base16_encode<S: Serializer, T: Serial>(v: &T, ser: S) -> Result<S::Ok, S::Error> {
    let b16_str = encode(to_bytes(v));
    ser.serialize_str(&b16_str)
}

/// Dual to [base16_encode].
pub fn base16_decode<'de, D: Deserializer<'de>, T: Deserial>(des: D) -> Result<T, D::Error> {
    struct Base16Visitor<D>(std::marker::PhantomData<D>);

    impl<'de, D: Deserial> Visitor<'de> for Base16Visitor<D> {
        type Value = D;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            write!(formatter, "A base 16 string.")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            let bytes = decode(v).map_err(de::Error::custom)?;
            from_bytes_complete(&bytes).map_err(de::Error::custom)
        }
    }

    des.deserialize_str(Base16Visitor(Default::default()))
}
