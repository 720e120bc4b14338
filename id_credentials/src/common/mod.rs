//! Binary and JSON encodings shared by all components of the library.
#[cfg(test)]
mod helpers;
mod impls;
mod serialize;
pub mod types;
mod version;

#[cfg(test)]
pub use self::helpers::serialize_deserialize;
pub use self::{serialize::*, version::*};

// Reexport for ease of use.
pub use byteorder::{ReadBytesExt, WriteBytesExt};

/// Derive macro to derive [serde::Deserialize] instances.
pub use serde::Deserialize as SerdeDeserialize;
/// Derive macro to derive [serde::Serialize] instances.
pub use serde::Serialize as SerdeSerialize;

/// Implement [serde::Serialize] and [serde::Deserialize] for a type by hex
/// encoding its [Serial] output. Generic parameters go in brackets:
/// `serde_base16!([C: Curve] Commitment<C>)`.
macro_rules! serde_base16 {
    ([$($g:tt)*] $t:ty) => {
        impl<$($g)*> serde::Serialize for $t {
            fn serialize<S: serde::Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
                $crate::common::base16_encode(self, ser)
            }
        }

        impl<'de, $($g)*> serde::Deserialize<'de> for $t {
            fn deserialize<D: serde::Deserializer<'de>>(des: D) -> Result<Self, D::Error> {
                $crate::common::base16_decode(des)
            }
        }
    };
    ($t:ty) => {
        $crate::common::serde_base16!([] $t);
    };
}
pub(crate) use serde_base16;
