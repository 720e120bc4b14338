use super::{ParseResult, Serialize};
use std::io::Cursor;

/// Serialize and immediately deserialize a value. Used in tests to check that
/// the binary encoding is invertible.
pub fn serialize_deserialize<A: Serialize>(x: &A) -> ParseResult<A> {
    let mut buf = Vec::<u8>::new();
    x.serial(&mut buf);
    A::deserial(&mut Cursor::new(buf))
}
