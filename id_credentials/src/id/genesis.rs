//! Loading of the parameters the chain is started with: the global context,
//! the identity providers, and the anonymity revokers. Each is stored as
//! versioned JSON, and only version 0 is supported.
use super::{constants::*, types::*};
use crate::{
    common::{SerdeDeserialize, SerdeSerialize, Version, Versioned, VERSION_0},
    curve_arithmetic::{Curve, Pairing},
};
use anyhow::{bail, Context};
use serde::de::DeserializeOwned;
use std::{collections::BTreeMap, fmt::Debug, fs::File, io::BufReader, path::Path};

/// Identity providers, keyed by their identity.
#[derive(Debug, Clone, PartialEq, Eq, SerdeSerialize, SerdeDeserialize)]
#[serde(bound(serialize = "P: Pairing", deserialize = "P: Pairing"))]
pub struct IpInfos<P: Pairing> {
    #[serde(rename = "idps")]
    pub identity_providers: BTreeMap<IpIdentity, IpInfo<P>>,
}

/// Anonymity revokers, keyed by their identity.
#[derive(Debug, Clone, PartialEq, Eq, SerdeSerialize, SerdeDeserialize)]
#[serde(bound(serialize = "C: Curve", deserialize = "C: Curve"))]
pub struct ArInfos<C: Curve> {
    #[serde(rename = "ars")]
    pub anonymity_revokers: BTreeMap<ArIdentity, ArInfo<C>>,
}

/// Everything the verifier needs to check credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenesisParameters {
    pub global_context: GlobalContext<ArCurve>,
    pub ip_infos:       BTreeMap<IpIdentity, IpInfo<IpPairing>>,
    pub ar_infos:       BTreeMap<ArIdentity, ArInfo<ArCurve>>,
}

impl GenesisParameters {
    /// Read the three parameter files. Every identity provider and
    /// anonymity revoker must be filed under its own identity.
    pub fn read<P: AsRef<Path> + Debug>(
        global_context: P,
        identity_providers: P,
        anonymity_revokers: P,
    ) -> anyhow::Result<Self> {
        let global_context = read_global_context(global_context)?;
        let ip_infos = read_identity_providers(identity_providers)?.identity_providers;
        let ar_infos = read_anonymity_revokers(anonymity_revokers)?.anonymity_revokers;
        if let Some((k, v)) = ip_infos.iter().find(|(k, v)| **k != v.ip_identity) {
            bail!("Identity provider {} is listed under {}.", v.ip_identity, k);
        }
        if let Some((k, v)) = ar_infos.iter().find(|(k, v)| **k != v.ar_identity) {
            bail!("Anonymity revoker {} is listed under {}.", v.ar_identity, k);
        }
        log::debug!(
            "Read genesis parameters with {} identity providers and {} anonymity revokers.",
            ip_infos.len(),
            ar_infos.len()
        );
        Ok(GenesisParameters {
            global_context,
            ip_infos,
            ar_infos,
        })
    }
}

/// Read a JSON value from a file.
pub fn read_json_from_file<P, T>(path: P) -> anyhow::Result<T>
where
    P: AsRef<Path> + Debug,
    T: DeserializeOwned, {
    let file = File::open(&path).with_context(|| format!("Cannot open {:?}.", path))?;
    let reader = BufReader::new(file);
    let v = serde_json::from_reader(reader).with_context(|| format!("Cannot parse {:?}.", path))?;
    Ok(v)
}

/// Read a versioned value, where the only supported version is 0.
fn read_versioned<P, T>(path: P, what: &str) -> anyhow::Result<T>
where
    P: AsRef<Path> + Debug,
    T: DeserializeOwned, {
    let versioned: Versioned<serde_json::Value> = read_json_from_file(path)?;
    match versioned.version {
        Version { value: 0 } => Ok(serde_json::from_value(versioned.value)?),
        other => bail!("Invalid {} version {}.", what, other),
    }
}

/// Read an object containing a versioned global context from the given file.
pub fn read_global_context<P: AsRef<Path> + Debug>(
    filename: P,
) -> anyhow::Result<GlobalContext<ArCurve>> {
    read_versioned(filename, "global context")
}

/// Read identity providers versioned with a single version at the top-level.
pub fn read_identity_providers<P: AsRef<Path> + Debug>(
    filename: P,
) -> anyhow::Result<IpInfos<IpPairing>> {
    read_versioned(filename, "identity providers")
}

/// Read anonymity revokers versioned with a single version at the top-level.
pub fn read_anonymity_revokers<P: AsRef<Path> + Debug>(
    filename: P,
) -> anyhow::Result<ArInfos<ArCurve>> {
    read_versioned(filename, "anonymity revokers")
}

/// Write a value as version 0 JSON, pretty printed.
pub fn write_versioned_json<P: AsRef<Path>, T: SerdeSerialize>(path: P, v: &T) -> anyhow::Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &Versioned::new(VERSION_0, v))?;
    Ok(())
}
