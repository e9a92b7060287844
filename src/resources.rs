//! Resource types for the key management hierarchy.
//!
//! Entities form a strict three-level hierarchy: a [`KeyRing`] owns
//! [`CryptoKey`]s, and a [`CryptoKey`] owns [`CryptoKeyVersion`]s. Ownership
//! lives in the store; the types here are plain records and hold no live
//! references to parents or children beyond their names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A grouping container for crypto keys within a location
///
/// Key rings are immutable once created and are never deleted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KeyRing {
    /// Fully-qualified resource name, assigned by the service
    pub name: String,

    /// Creation timestamp, assigned by the service
    pub create_time: Option<DateTime<Utc>>,
}

/// A named cryptographic key with a fixed purpose
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CryptoKey {
    /// Fully-qualified resource name, assigned by the service
    pub name: String,

    /// What the key may be used for; immutable after creation
    pub purpose: CryptoKeyPurpose,

    /// Creation timestamp, assigned by the service
    pub create_time: Option<DateTime<Utc>>,
}

/// A specific generation of key material under a crypto key
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CryptoKeyVersion {
    /// Fully-qualified resource name, assigned by the service
    pub name: String,

    /// Lifecycle state of the version's key material
    pub state: CryptoKeyVersionState,

    /// Algorithm the version's material supports, derived from the parent
    /// key's purpose at allocation time
    pub algorithm: CryptoKeyVersionAlgorithm,

    /// Creation timestamp, assigned by the service
    pub create_time: Option<DateTime<Utc>>,

    /// Timestamp at which generation completed; unset while the version is
    /// still pending
    pub generate_time: Option<DateTime<Utc>>,
}

/// The purpose of a crypto key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CryptoKeyPurpose {
    /// No purpose set; rejected on create
    #[default]
    Unspecified,
    /// Symmetric encryption and decryption
    EncryptDecrypt,
    /// Asymmetric signing
    AsymmetricSign,
    /// Asymmetric decryption
    AsymmetricDecrypt,
    /// Keyed message authentication
    Mac,
}

impl CryptoKeyPurpose {
    /// Returns the algorithm newly allocated versions of a key with this
    /// purpose default to, or None when no purpose is set
    pub fn default_algorithm(&self) -> Option<CryptoKeyVersionAlgorithm> {
        match self {
            CryptoKeyPurpose::Unspecified => None,
            CryptoKeyPurpose::EncryptDecrypt => {
                Some(CryptoKeyVersionAlgorithm::GoogleSymmetricEncryption)
            }
            CryptoKeyPurpose::AsymmetricSign => Some(CryptoKeyVersionAlgorithm::EcSignP256Sha256),
            CryptoKeyPurpose::AsymmetricDecrypt => {
                Some(CryptoKeyVersionAlgorithm::RsaDecryptOaep2048Sha256)
            }
            CryptoKeyPurpose::Mac => Some(CryptoKeyVersionAlgorithm::HmacSha256),
        }
    }
}

/// The algorithm a crypto key version supports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CryptoKeyVersionAlgorithm {
    /// No algorithm assigned
    #[default]
    Unspecified,
    GoogleSymmetricEncryption,
    EcSignP256Sha256,
    RsaDecryptOaep2048Sha256,
    HmacSha256,
}

/// Lifecycle state of a crypto key version
///
/// `PendingGeneration` is the only non-terminal state; every version reaches
/// exactly one of the terminal states and never leaves it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CryptoKeyVersionState {
    /// Key material is still being generated
    #[default]
    PendingGeneration,
    /// Key material is ready for use
    Enabled,
    /// Key material generation failed
    GenerationFailed,
}

impl CryptoKeyVersionState {
    /// Whether this state is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CryptoKeyVersionState::Enabled | CryptoKeyVersionState::GenerationFailed
        )
    }
}
