//! Parsing and validation of hierarchical resource names.
//!
//! Resource names follow the grammar
//! `projects/{project}/locations/{location}/keyRings/{key_ring}`, optionally
//! extended with `/cryptoKeys/{crypto_key}` and then
//! `/cryptoKeyVersions/{version}`. Each typed name parses exactly one depth,
//! so a name with the right keywords at the wrong depth is rejected before
//! any store lookup happens.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};

const ID_PATTERN: &str = "^[a-zA-Z0-9_-]{1,63}$";

fn id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(ID_PATTERN).expect("identifier pattern compiles"))
}

/// Validates a single resource identifier segment.
///
/// Identifiers are 1-63 characters drawn from `[a-zA-Z0-9_-]`.
pub fn validate_id(id: &str) -> Result<()> {
    if id_regex().is_match(id) {
        Ok(())
    } else {
        Err(Error::MalformedName(format!("invalid resource id {:?}", id)))
    }
}

// Version numbers are strictly positive decimals; leading zeros are rejected
// so that parse and Display round-trip.
fn parse_version_number(segment: &str, full_name: &str) -> Result<u64> {
    let well_formed = !segment.is_empty()
        && segment.bytes().all(|b| b.is_ascii_digit())
        && !(segment.len() > 1 && segment.starts_with('0'));

    well_formed
        .then(|| segment.parse::<u64>().ok())
        .flatten()
        .filter(|n| *n > 0)
        .ok_or_else(|| Error::MalformedName(full_name.to_string()))
}

/// The name of a location: `projects/{project}/locations/{location}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocationName {
    pub project: String,
    pub location: String,
}

impl LocationName {
    /// Parses a location name, failing on any grammar violation
    pub fn parse(name: &str) -> Result<Self> {
        let parts: Vec<&str> = name.split('/').collect();
        match parts.as_slice() {
            ["projects", project, "locations", location] => {
                validate_id(project)?;
                validate_id(location)?;
                Ok(Self {
                    project: (*project).to_string(),
                    location: (*location).to_string(),
                })
            }
            _ => Err(Error::MalformedName(name.to_string())),
        }
    }
}

impl fmt::Display for LocationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "projects/{}/locations/{}", self.project, self.location)
    }
}

/// The name of a key ring: `.../keyRings/{key_ring}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyRingName {
    pub project: String,
    pub location: String,
    pub key_ring: String,
}

impl KeyRingName {
    /// Parses a key ring name, failing on any grammar violation
    pub fn parse(name: &str) -> Result<Self> {
        let parts: Vec<&str> = name.split('/').collect();
        match parts.as_slice() {
            ["projects", project, "locations", location, "keyRings", key_ring] => {
                validate_id(project)?;
                validate_id(location)?;
                validate_id(key_ring)?;
                Ok(Self {
                    project: (*project).to_string(),
                    location: (*location).to_string(),
                    key_ring: (*key_ring).to_string(),
                })
            }
            _ => Err(Error::MalformedName(name.to_string())),
        }
    }

    /// Returns the name of the containing location
    pub fn parent(&self) -> LocationName {
        LocationName {
            project: self.project.clone(),
            location: self.location.clone(),
        }
    }
}

impl fmt::Display for KeyRingName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/keyRings/{}", self.parent(), self.key_ring)
    }
}

/// The name of a crypto key: `.../cryptoKeys/{crypto_key}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CryptoKeyName {
    pub project: String,
    pub location: String,
    pub key_ring: String,
    pub crypto_key: String,
}

impl CryptoKeyName {
    /// Parses a crypto key name, failing on any grammar violation
    pub fn parse(name: &str) -> Result<Self> {
        let parts: Vec<&str> = name.split('/').collect();
        match parts.as_slice() {
            ["projects", project, "locations", location, "keyRings", key_ring, "cryptoKeys", crypto_key] =>
            {
                validate_id(project)?;
                validate_id(location)?;
                validate_id(key_ring)?;
                validate_id(crypto_key)?;
                Ok(Self {
                    project: (*project).to_string(),
                    location: (*location).to_string(),
                    key_ring: (*key_ring).to_string(),
                    crypto_key: (*crypto_key).to_string(),
                })
            }
            _ => Err(Error::MalformedName(name.to_string())),
        }
    }

    /// Returns the name of the containing key ring
    pub fn parent(&self) -> KeyRingName {
        KeyRingName {
            project: self.project.clone(),
            location: self.location.clone(),
            key_ring: self.key_ring.clone(),
        }
    }
}

impl fmt::Display for CryptoKeyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/cryptoKeys/{}", self.parent(), self.crypto_key)
    }
}

/// The name of a crypto key version: `.../cryptoKeyVersions/{version}`
///
/// The version segment is a strictly positive decimal assigned by the
/// service, starting at 1 for each crypto key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CryptoKeyVersionName {
    pub project: String,
    pub location: String,
    pub key_ring: String,
    pub crypto_key: String,
    pub version: u64,
}

impl CryptoKeyVersionName {
    /// Parses a crypto key version name, failing on any grammar violation
    pub fn parse(name: &str) -> Result<Self> {
        let parts: Vec<&str> = name.split('/').collect();
        match parts.as_slice() {
            ["projects", project, "locations", location, "keyRings", key_ring, "cryptoKeys", crypto_key, "cryptoKeyVersions", version] =>
            {
                validate_id(project)?;
                validate_id(location)?;
                validate_id(key_ring)?;
                validate_id(crypto_key)?;
                let version = parse_version_number(version, name)?;
                Ok(Self {
                    project: (*project).to_string(),
                    location: (*location).to_string(),
                    key_ring: (*key_ring).to_string(),
                    crypto_key: (*crypto_key).to_string(),
                    version,
                })
            }
            _ => Err(Error::MalformedName(name.to_string())),
        }
    }

    /// Returns the name of the containing crypto key
    pub fn parent(&self) -> CryptoKeyName {
        CryptoKeyName {
            project: self.project.clone(),
            location: self.location.clone(),
            key_ring: self.key_ring.clone(),
            crypto_key: self.crypto_key.clone(),
        }
    }
}

impl fmt::Display for CryptoKeyVersionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/cryptoKeyVersions/{}", self.parent(), self.version)
    }
}
