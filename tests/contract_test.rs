// Contract tests mirroring how a client library exercises the service:
// create resources, wait for version generation, fetch by name, and check
// the error code for every class of bad name.

mod common;

use common::{create_test_crypto_key, create_test_key_ring, fast_kms, WAIT_TIMEOUT};
use fakekms::testutil::{create_version_and_wait, wait_for_terminal};
use fakekms::{
    CreateCryptoKeyVersionRequest, CryptoKeyVersionAlgorithm, CryptoKeyVersionState,
    FakeKeyManagementService, GenerationOutcome, GenerationPolicy, GetCryptoKeyRequest,
    GetCryptoKeyVersionRequest, GetKeyRingRequest, KeyManagementService, StatusCode,
};
use std::time::Duration;

#[tokio::test]
async fn test_get_crypto_key_version_equals_created() {
    let kms = fast_kms();
    let kr = create_test_key_ring(&kms).await;
    let ck = create_test_crypto_key(&kms, &kr.name, true).await;

    let want = create_version_and_wait(&kms, &ck.name, WAIT_TIMEOUT)
        .await
        .unwrap();

    let got = kms
        .get_crypto_key_version(GetCryptoKeyVersionRequest {
            name: want.name.clone(),
        })
        .await
        .unwrap();

    assert_eq!(want, got);
}

#[tokio::test]
async fn test_get_crypto_key_version_malformed_name() {
    let kms = fast_kms();

    let err = kms
        .get_crypto_key_version(GetCryptoKeyVersionRequest {
            name: "malformed name".to_string(),
        })
        .await
        .unwrap_err();

    assert_eq!(err.code(), StatusCode::InvalidArgument);
}

#[tokio::test]
async fn test_get_crypto_key_version_not_found() {
    let kms = fast_kms();
    let kr = create_test_key_ring(&kms).await;

    let err = kms
        .get_crypto_key_version(GetCryptoKeyVersionRequest {
            name: format!("{}/cryptoKeys/foo/cryptoKeyVersions/1", kr.name),
        })
        .await
        .unwrap_err();

    assert_eq!(err.code(), StatusCode::NotFound);
}

#[tokio::test]
async fn test_get_key_ring_and_crypto_key_equal_created() {
    let kms = fast_kms();
    let kr = create_test_key_ring(&kms).await;
    let ck = create_test_crypto_key(&kms, &kr.name, true).await;

    let got_kr = kms
        .get_key_ring(GetKeyRingRequest {
            name: kr.name.clone(),
        })
        .await
        .unwrap();
    assert_eq!(kr, got_kr);

    let got_ck = kms
        .get_crypto_key(GetCryptoKeyRequest {
            name: ck.name.clone(),
        })
        .await
        .unwrap();
    assert_eq!(ck, got_ck);
}

#[tokio::test]
async fn test_create_crypto_key_allocates_initial_version() {
    let kms = fast_kms();
    let kr = create_test_key_ring(&kms).await;
    let ck = create_test_crypto_key(&kms, &kr.name, false).await;

    let version = wait_for_terminal(
        &kms,
        &format!("{}/cryptoKeyVersions/1", ck.name),
        WAIT_TIMEOUT,
    )
    .await
    .unwrap();

    assert_eq!(version.state, CryptoKeyVersionState::Enabled);
    assert_eq!(
        version.algorithm,
        CryptoKeyVersionAlgorithm::GoogleSymmetricEncryption
    );
}

#[tokio::test]
async fn test_created_version_starts_pending_and_terminates_enabled() {
    let kms = fast_kms();
    let kr = create_test_key_ring(&kms).await;
    let ck = create_test_crypto_key(&kms, &kr.name, true).await;

    let created = kms
        .create_crypto_key_version(CreateCryptoKeyVersionRequest {
            parent: ck.name.clone(),
            ..Default::default()
        })
        .await
        .unwrap();

    // The create response always reflects the pending allocation.
    assert_eq!(created.name, format!("{}/cryptoKeyVersions/1", ck.name));
    assert_eq!(created.state, CryptoKeyVersionState::PendingGeneration);
    assert!(created.generate_time.is_none());

    let terminal = wait_for_terminal(&kms, &created.name, WAIT_TIMEOUT)
        .await
        .unwrap();
    assert_eq!(terminal.state, CryptoKeyVersionState::Enabled);
    assert!(terminal.generate_time.is_some());
    assert_eq!(terminal.create_time, created.create_time);

    // Terminal states never change.
    for _ in 0..5 {
        let again = kms
            .get_crypto_key_version(GetCryptoKeyVersionRequest {
                name: created.name.clone(),
            })
            .await
            .unwrap();
        assert_eq!(again, terminal);
    }
}

#[tokio::test]
async fn test_generation_failure_injection() {
    let kms = FakeKeyManagementService::with_policy(
        GenerationPolicy::new()
            .with_delay(Duration::from_millis(1))
            .with_outcome(GenerationOutcome::Fail),
    );
    let kr = create_test_key_ring(&kms).await;
    let ck = create_test_crypto_key(&kms, &kr.name, true).await;

    let version = create_version_and_wait(&kms, &ck.name, WAIT_TIMEOUT)
        .await
        .unwrap();

    assert_eq!(version.state, CryptoKeyVersionState::GenerationFailed);
    assert!(version.generate_time.is_some());
}

#[tokio::test]
async fn test_duplicate_key_ring_id_already_exists() {
    let kms = fast_kms();
    let kr = create_test_key_ring(&kms).await;

    let err = kms
        .create_key_ring(fakekms::CreateKeyRingRequest {
            parent: common::LOCATION.to_string(),
            key_ring_id: kr.name.rsplit('/').next().unwrap().to_string(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert_eq!(err.code(), StatusCode::AlreadyExists);
}

#[tokio::test]
async fn test_create_under_missing_parent_not_found() {
    let kms = fast_kms();

    let err = kms
        .create_crypto_key_version(CreateCryptoKeyVersionRequest {
            parent: format!("{}/keyRings/nope/cryptoKeys/nope", common::LOCATION),
            ..Default::default()
        })
        .await
        .unwrap_err();

    assert_eq!(err.code(), StatusCode::NotFound);
}

// The end-to-end shape a PKCS#11 provider test suite depends on.
#[tokio::test]
async fn test_skip_initial_version_lifecycle() {
    let kms = fast_kms();
    let kr = create_test_key_ring(&kms).await;
    let ck = create_test_crypto_key(&kms, &kr.name, true).await;

    let created = kms
        .create_crypto_key_version(CreateCryptoKeyVersionRequest {
            parent: ck.name.clone(),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(created.name, format!("{}/cryptoKeyVersions/1", ck.name));
    assert_eq!(created.state, CryptoKeyVersionState::PendingGeneration);

    let enabled = wait_for_terminal(&kms, &created.name, WAIT_TIMEOUT)
        .await
        .unwrap();
    assert_eq!(enabled.state, CryptoKeyVersionState::Enabled);

    let got = kms
        .get_crypto_key_version(GetCryptoKeyVersionRequest {
            name: created.name.clone(),
        })
        .await
        .unwrap();
    assert_eq!(got, enabled);
}
