#![allow(dead_code)]

use std::time::Duration;

use fakekms::testutil::random_id;
use fakekms::{
    CreateCryptoKeyRequest, CreateKeyRingRequest, CryptoKey, CryptoKeyPurpose,
    FakeKeyManagementService, GenerationPolicy, KeyManagementService, KeyRing,
};

/// Location under which all test resources are created.
pub const LOCATION: &str = "projects/test-project/locations/us-east1";

/// Upper bound on how long tests wait for a version's terminal state.
pub const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// A service instance with a short generation delay for tight test loops.
pub fn fast_kms() -> FakeKeyManagementService {
    let _ = env_logger::builder().is_test(true).try_init();

    FakeKeyManagementService::with_policy(
        GenerationPolicy::new().with_delay(Duration::from_millis(1)),
    )
}

/// Creates a key ring with a randomized id, or panics.
pub async fn create_test_key_ring(kms: &FakeKeyManagementService) -> KeyRing {
    kms.create_key_ring(CreateKeyRingRequest {
        parent: LOCATION.to_string(),
        key_ring_id: random_id("kr-"),
        ..Default::default()
    })
    .await
    .expect("create test key ring")
}

/// Creates an ENCRYPT_DECRYPT crypto key with a randomized id, or panics.
pub async fn create_test_crypto_key(
    kms: &FakeKeyManagementService,
    parent: &str,
    skip_initial_version_creation: bool,
) -> CryptoKey {
    kms.create_crypto_key(CreateCryptoKeyRequest {
        parent: parent.to_string(),
        crypto_key_id: random_id("ck-"),
        crypto_key: CryptoKey {
            purpose: CryptoKeyPurpose::EncryptDecrypt,
            ..Default::default()
        },
        skip_initial_version_creation,
    })
    .await
    .expect("create test crypto key")
}
