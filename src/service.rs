//! The fake service: request/response types and the RPC method handlers.
//!
//! Each handler is a thin composition: parse and validate the names and
//! fields in the request, invoke the store, optionally kick off the version
//! generator, and let `?` map abstract failures onto RPC statuses. The store
//! itself never sees transport-level error vocabulary.

use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result, RpcResult};
use crate::generator::{GenerationPolicy, VersionGenerator};
use crate::name::{self, CryptoKeyName, CryptoKeyVersionName, KeyRingName, LocationName};
use crate::resources::{CryptoKey, CryptoKeyPurpose, CryptoKeyVersion, KeyRing};
use crate::store::ResourceStore;
use crate::KeyManagementService;

/// Number of items returned when a list request leaves `page_size` unset
pub const DEFAULT_PAGE_SIZE: i32 = 100;

/// Upper bound applied to caller-provided page sizes
pub const MAX_PAGE_SIZE: i32 = 1000;

/// Request to create a key ring under a location
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateKeyRingRequest {
    pub parent: String,
    pub key_ring_id: String,
    pub key_ring: KeyRing,
}

/// Request to fetch a key ring by name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GetKeyRingRequest {
    pub name: String,
}

/// Request to list the key rings under a location
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListKeyRingsRequest {
    pub parent: String,
    pub page_size: i32,
    pub page_token: String,
}

/// One page of key rings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListKeyRingsResponse {
    pub key_rings: Vec<KeyRing>,
    pub next_page_token: String,
}

/// Request to create a crypto key under a key ring
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateCryptoKeyRequest {
    pub parent: String,
    pub crypto_key_id: String,
    pub crypto_key: CryptoKey,
    pub skip_initial_version_creation: bool,
}

/// Request to fetch a crypto key by name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GetCryptoKeyRequest {
    pub name: String,
}

/// Request to list the crypto keys under a key ring
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListCryptoKeysRequest {
    pub parent: String,
    pub page_size: i32,
    pub page_token: String,
}

/// One page of crypto keys
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListCryptoKeysResponse {
    pub crypto_keys: Vec<CryptoKey>,
    pub next_page_token: String,
}

/// Request to allocate the next version under a crypto key
///
/// Server-assigned fields in the provided body are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateCryptoKeyVersionRequest {
    pub parent: String,
    pub crypto_key_version: CryptoKeyVersion,
}

/// Request to fetch a crypto key version by name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GetCryptoKeyVersionRequest {
    pub name: String,
}

/// Request to list the versions of a crypto key
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListCryptoKeyVersionsRequest {
    pub parent: String,
    pub page_size: i32,
    pub page_token: String,
}

/// One page of crypto key versions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListCryptoKeyVersionsResponse {
    pub crypto_key_versions: Vec<CryptoKeyVersion>,
    pub next_page_token: String,
}

/// The in-memory fake key management service
///
/// State lives for the lifetime of the instance; nothing is persisted. The
/// generation lifecycle is controlled by the [`GenerationPolicy`] the
/// service was built with.
#[derive(Debug)]
pub struct FakeKeyManagementService {
    store: Arc<ResourceStore>,
    generator: VersionGenerator,
}

impl FakeKeyManagementService {
    /// Creates a service with the default generation policy
    pub fn new() -> Self {
        Self::with_policy(GenerationPolicy::default())
    }

    /// Creates a service with the given generation policy
    pub fn with_policy(policy: GenerationPolicy) -> Self {
        let store = Arc::new(ResourceStore::new());
        let generator = VersionGenerator::new(Arc::clone(&store), policy);
        Self { store, generator }
    }

    fn effective_page_size(page_size: i32) -> Result<usize> {
        if page_size < 0 {
            return Err(Error::InvalidArgument(format!(
                "page_size must not be negative, got {}",
                page_size
            )));
        }

        let size = if page_size == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            page_size.min(MAX_PAGE_SIZE)
        };

        Ok(size as usize)
    }

    fn check_purpose(key: &CryptoKey) -> Result<()> {
        if key.purpose == CryptoKeyPurpose::Unspecified {
            return Err(Error::InvalidArgument(
                "crypto_key.purpose must be specified".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for FakeKeyManagementService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyManagementService for FakeKeyManagementService {
    async fn create_key_ring(&self, req: CreateKeyRingRequest) -> RpcResult<KeyRing> {
        counter!("fakekms.requests.create_key_ring", 1);

        let parent = LocationName::parse(&req.parent)?;
        name::validate_id(&req.key_ring_id)?;

        let key_ring = self
            .store
            .create_key_ring(&parent, &req.key_ring_id, req.key_ring)?;
        log::debug!("created key ring {}", key_ring.name);

        Ok(key_ring)
    }

    async fn get_key_ring(&self, req: GetKeyRingRequest) -> RpcResult<KeyRing> {
        counter!("fakekms.requests.get_key_ring", 1);

        let key_ring_name = KeyRingName::parse(&req.name)?;
        Ok(self.store.get_key_ring(&key_ring_name)?)
    }

    async fn list_key_rings(&self, req: ListKeyRingsRequest) -> RpcResult<ListKeyRingsResponse> {
        counter!("fakekms.requests.list_key_rings", 1);

        let parent = LocationName::parse(&req.parent)?;
        let page_size = Self::effective_page_size(req.page_size)?;

        let (key_rings, next_page_token) =
            self.store.list_key_rings(&parent, page_size, &req.page_token)?;

        Ok(ListKeyRingsResponse {
            key_rings,
            next_page_token,
        })
    }

    async fn create_crypto_key(&self, req: CreateCryptoKeyRequest) -> RpcResult<CryptoKey> {
        counter!("fakekms.requests.create_crypto_key", 1);

        let parent = KeyRingName::parse(&req.parent)?;
        name::validate_id(&req.crypto_key_id)?;
        Self::check_purpose(&req.crypto_key)?;

        let (crypto_key, initial_version) = self.store.create_crypto_key(
            &parent,
            &req.crypto_key_id,
            req.crypto_key,
            req.skip_initial_version_creation,
        )?;

        if let Some(version) = initial_version {
            self.generator.spawn(&version)?;
        }
        log::debug!("created crypto key {}", crypto_key.name);

        Ok(crypto_key)
    }

    async fn get_crypto_key(&self, req: GetCryptoKeyRequest) -> RpcResult<CryptoKey> {
        counter!("fakekms.requests.get_crypto_key", 1);

        let key_name = CryptoKeyName::parse(&req.name)?;
        Ok(self.store.get_crypto_key(&key_name)?)
    }

    async fn list_crypto_keys(
        &self,
        req: ListCryptoKeysRequest,
    ) -> RpcResult<ListCryptoKeysResponse> {
        counter!("fakekms.requests.list_crypto_keys", 1);

        let parent = KeyRingName::parse(&req.parent)?;
        let page_size = Self::effective_page_size(req.page_size)?;

        let (crypto_keys, next_page_token) =
            self.store
                .list_crypto_keys(&parent, page_size, &req.page_token)?;

        Ok(ListCryptoKeysResponse {
            crypto_keys,
            next_page_token,
        })
    }

    async fn create_crypto_key_version(
        &self,
        req: CreateCryptoKeyVersionRequest,
    ) -> RpcResult<CryptoKeyVersion> {
        counter!("fakekms.requests.create_crypto_key_version", 1);

        let parent = CryptoKeyName::parse(&req.parent)?;

        let version = self.store.create_crypto_key_version(&parent)?;
        self.generator.spawn(&version)?;
        log::debug!("created crypto key version {}", version.name);

        Ok(version)
    }

    async fn get_crypto_key_version(
        &self,
        req: GetCryptoKeyVersionRequest,
    ) -> RpcResult<CryptoKeyVersion> {
        counter!("fakekms.requests.get_crypto_key_version", 1);

        let version_name = CryptoKeyVersionName::parse(&req.name)?;
        Ok(self.store.get_crypto_key_version(&version_name)?)
    }

    async fn list_crypto_key_versions(
        &self,
        req: ListCryptoKeyVersionsRequest,
    ) -> RpcResult<ListCryptoKeyVersionsResponse> {
        counter!("fakekms.requests.list_crypto_key_versions", 1);

        let parent = CryptoKeyName::parse(&req.parent)?;
        let page_size = Self::effective_page_size(req.page_size)?;

        let (crypto_key_versions, next_page_token) =
            self.store
                .list_crypto_key_versions(&parent, page_size, &req.page_token)?;

        Ok(ListCryptoKeyVersionsResponse {
            crypto_key_versions,
            next_page_token,
        })
    }
}
