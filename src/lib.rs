//! # Fake Key Management Service
//!
//! An in-memory fake of a cloud key-management resource service, usable as a
//! drop-in test double for client libraries that talk to the real API.
//!
//! `fakekms` reproduces the resource model (KeyRing -> CryptoKey ->
//! CryptoKeyVersion), the hierarchical naming scheme, the asynchronous
//! version-generation lifecycle, and the error semantics of the real
//! service: malformed names fail with `INVALID_ARGUMENT` before any lookup,
//! well-formed names over missing resources fail with `NOT_FOUND`, and id
//! collisions on create fail with `ALREADY_EXISTS`. Nothing is persisted and
//! no real cryptography is performed.
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use fakekms::{
//!     CreateCryptoKeyRequest, CreateKeyRingRequest, CryptoKey, CryptoKeyPurpose,
//!     CryptoKeyVersionState, FakeKeyManagementService, KeyManagementService,
//! };
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let kms = FakeKeyManagementService::new();
//!
//! let key_ring = kms
//!     .create_key_ring(CreateKeyRingRequest {
//!         parent: "projects/p1/locations/global".to_string(),
//!         key_ring_id: "kr1".to_string(),
//!         ..Default::default()
//!     })
//!     .await?;
//!
//! let crypto_key = kms
//!     .create_crypto_key(CreateCryptoKeyRequest {
//!         parent: key_ring.name.clone(),
//!         crypto_key_id: "ck1".to_string(),
//!         crypto_key: CryptoKey {
//!             purpose: CryptoKeyPurpose::EncryptDecrypt,
//!             ..Default::default()
//!         },
//!         ..Default::default()
//!     })
//!     .await?;
//!
//! // The initial version is generated on a background task; poll until it
//! // reaches its terminal state.
//! let version_name = format!("{}/cryptoKeyVersions/1", crypto_key.name);
//! let version =
//!     fakekms::testutil::wait_for_terminal(&kms, &version_name, Duration::from_secs(5)).await?;
//! assert_eq!(version.state, CryptoKeyVersionState::Enabled);
//! # Ok(())
//! # }
//! ```
//!
//! ## Failure Injection
//!
//! The generation lifecycle is configurable, so tests can exercise the
//! failure path deterministically:
//!
//! ```rust,no_run
//! use fakekms::{FakeKeyManagementService, GenerationOutcome, GenerationPolicy};
//! use std::time::Duration;
//!
//! let kms = FakeKeyManagementService::with_policy(
//!     GenerationPolicy::new()
//!         .with_delay(Duration::from_millis(1))
//!         .with_outcome(GenerationOutcome::Fail),
//! );
//! ```

pub mod error;
pub mod generator;
pub mod name;
pub mod resources;
pub mod service;
pub mod store;
pub mod testutil;

mod page;

// Re-export key types
pub use crate::error::{Error, Result, RpcResult, Status, StatusCode};
pub use crate::generator::{
    GenerationOutcome, GenerationPolicy, VersionGenerator, DEFAULT_GENERATION_DELAY,
};
pub use crate::name::{CryptoKeyName, CryptoKeyVersionName, KeyRingName, LocationName};
pub use crate::resources::{
    CryptoKey, CryptoKeyPurpose, CryptoKeyVersion, CryptoKeyVersionAlgorithm,
    CryptoKeyVersionState, KeyRing,
};
pub use crate::service::{
    CreateCryptoKeyRequest, CreateCryptoKeyVersionRequest, CreateKeyRingRequest,
    FakeKeyManagementService, GetCryptoKeyRequest, GetCryptoKeyVersionRequest, GetKeyRingRequest,
    ListCryptoKeyVersionsRequest, ListCryptoKeyVersionsResponse, ListCryptoKeysRequest,
    ListCryptoKeysResponse, ListKeyRingsRequest, ListKeyRingsResponse, DEFAULT_PAGE_SIZE,
    MAX_PAGE_SIZE,
};
pub use crate::store::ResourceStore;

use async_trait::async_trait;
use std::fmt;

/// The key management RPC surface
///
/// One method per RPC; every method either returns a fully-populated
/// resource or listing, or a single [`Status`] carrying one of the codes in
/// [`StatusCode`].
#[async_trait]
pub trait KeyManagementService: Send + Sync + fmt::Debug {
    /// Creates a key ring under a location
    async fn create_key_ring(&self, req: CreateKeyRingRequest) -> RpcResult<KeyRing>;

    /// Fetches a key ring by name
    async fn get_key_ring(&self, req: GetKeyRingRequest) -> RpcResult<KeyRing>;

    /// Lists key rings under a location in creation order
    async fn list_key_rings(&self, req: ListKeyRingsRequest) -> RpcResult<ListKeyRingsResponse>;

    /// Creates a crypto key under a key ring, allocating version 1 unless
    /// the request skips initial version creation
    async fn create_crypto_key(&self, req: CreateCryptoKeyRequest) -> RpcResult<CryptoKey>;

    /// Fetches a crypto key by name
    async fn get_crypto_key(&self, req: GetCryptoKeyRequest) -> RpcResult<CryptoKey>;

    /// Lists crypto keys under a key ring in creation order
    async fn list_crypto_keys(&self, req: ListCryptoKeysRequest)
        -> RpcResult<ListCryptoKeysResponse>;

    /// Allocates the next sequential version under a crypto key
    async fn create_crypto_key_version(
        &self,
        req: CreateCryptoKeyVersionRequest,
    ) -> RpcResult<CryptoKeyVersion>;

    /// Fetches a crypto key version by name
    async fn get_crypto_key_version(
        &self,
        req: GetCryptoKeyVersionRequest,
    ) -> RpcResult<CryptoKeyVersion>;

    /// Lists versions of a crypto key in creation order
    async fn list_crypto_key_versions(
        &self,
        req: ListCryptoKeyVersionsRequest,
    ) -> RpcResult<ListCryptoKeyVersionsResponse>;
}
