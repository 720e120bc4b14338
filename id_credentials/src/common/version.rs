use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

/// Version 0 as a constant for ease of use.
pub const VERSION_0: Version = Version { value: 0 };

/// Version of the JSON representation of a data structure stored on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, SerdeSerialize, SerdeDeserialize)]
#[serde(transparent)]
pub struct Version {
    pub value: u32,
}

impl From<u32> for Version {
    fn from(value: u32) -> Version { Version { value } }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result { write!(f, "{}", self.value) }
}

/// Versioned<T> represents T as a versioned data-structure.
/// The caller is responsible for ensuring the data structure `T`
/// is compatible with the version number.
#[derive(Clone, Copy, Debug, Eq, PartialEq, SerdeSerialize, SerdeDeserialize)]
pub struct Versioned<T> {
    #[serde(rename = "v")]
    pub version: Version,
    #[serde(rename = "value")]
    pub value:   T,
}

impl<T> Versioned<T> {
    pub fn new(version: Version, value: T) -> Versioned<T> { Versioned { version, value } }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versioned_json_envelope() {
        let v = Versioned::new(VERSION_0, 17u32);
        let json = serde_json::to_string(&v).expect("Serialization to JSON should succeed.");
        assert_eq!(json, r#"{"v":0,"value":17}"#);
        let back: Versioned<u32> =
            serde_json::from_str(&json).expect("Deserialization from JSON should succeed.");
        assert_eq!(back, v);
    }
}
