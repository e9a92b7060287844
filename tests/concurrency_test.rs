// Tests to verify concurrent access to the service: version numbering under
// contention, create races, and independence of disjoint subtrees.

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use common::{create_test_crypto_key, create_test_key_ring, fast_kms, WAIT_TIMEOUT};
use fakekms::testutil::wait_for_terminal;
use fakekms::{
    CreateCryptoKeyRequest, CreateCryptoKeyVersionRequest, CryptoKey, CryptoKeyPurpose,
    CryptoKeyVersionState, KeyManagementService, StatusCode,
};
use futures::future::join_all;
use tokio::task;

const NUM_TASKS: usize = 32;

#[tokio::test]
async fn test_concurrent_version_creation_yields_distinct_numbers() {
    let kms = Arc::new(fast_kms());
    let kr = create_test_key_ring(&kms).await;
    let ck = create_test_crypto_key(&kms, &kr.name, true).await;

    let mut tasks = Vec::new();
    for _ in 0..NUM_TASKS {
        let kms = Arc::clone(&kms);
        let parent = ck.name.clone();

        tasks.push(task::spawn(async move {
            kms.create_crypto_key_version(CreateCryptoKeyVersionRequest {
                parent,
                ..Default::default()
            })
            .await
            .expect("create version")
        }));
    }

    let mut numbers = HashSet::new();
    for result in join_all(tasks).await {
        let version = result.expect("task panicked");
        let number: u64 = version
            .name
            .rsplit('/')
            .next()
            .unwrap()
            .parse()
            .expect("numeric version suffix");
        assert!(numbers.insert(number), "duplicate version {}", number);
    }

    // Exactly N distinct, sequential numbers starting at 1.
    let expected: HashSet<u64> = (1..=NUM_TASKS as u64).collect();
    assert_eq!(numbers, expected);
}

#[tokio::test]
async fn test_concurrent_create_with_same_id_exactly_one_wins() {
    let kms = Arc::new(fast_kms());
    let kr = create_test_key_ring(&kms).await;

    let mut tasks = Vec::new();
    for _ in 0..NUM_TASKS {
        let kms = Arc::clone(&kms);
        let parent = kr.name.clone();

        tasks.push(task::spawn(async move {
            kms.create_crypto_key(CreateCryptoKeyRequest {
                parent,
                crypto_key_id: "contended".to_string(),
                crypto_key: CryptoKey {
                    purpose: CryptoKeyPurpose::EncryptDecrypt,
                    ..Default::default()
                },
                skip_initial_version_creation: true,
            })
            .await
        }));
    }

    let mut successes = 0;
    for result in join_all(tasks).await {
        match result.expect("task panicked") {
            Ok(_) => successes += 1,
            Err(status) => assert_eq!(status.code(), StatusCode::AlreadyExists),
        }
    }

    assert_eq!(successes, 1);
}

#[tokio::test]
async fn test_disjoint_key_rings_progress_independently() {
    let kms = Arc::new(fast_kms());
    let ring_a = create_test_key_ring(&kms).await;
    let ring_b = create_test_key_ring(&kms).await;

    let mut tasks = Vec::new();
    for ring in [&ring_a, &ring_b] {
        for i in 0..NUM_TASKS {
            let kms = Arc::clone(&kms);
            let parent = ring.name.clone();

            tasks.push(task::spawn(async move {
                kms.create_crypto_key(CreateCryptoKeyRequest {
                    parent,
                    crypto_key_id: format!("key-{}", i),
                    crypto_key: CryptoKey {
                        purpose: CryptoKeyPurpose::EncryptDecrypt,
                        ..Default::default()
                    },
                    skip_initial_version_creation: true,
                })
                .await
                .expect("create crypto key")
            }));
        }
    }

    for result in join_all(tasks).await {
        result.expect("task panicked");
    }
}

#[tokio::test]
async fn test_all_pending_versions_reach_terminal_state() {
    let kms = Arc::new(fast_kms());
    let kr = create_test_key_ring(&kms).await;
    let ck = create_test_crypto_key(&kms, &kr.name, true).await;

    let mut created = Vec::new();
    for _ in 0..NUM_TASKS {
        let version = kms
            .create_crypto_key_version(CreateCryptoKeyVersionRequest {
                parent: ck.name.clone(),
                ..Default::default()
            })
            .await
            .unwrap();
        created.push(version.name);
    }

    for name in created {
        let version = wait_for_terminal(kms.as_ref(), &name, WAIT_TIMEOUT)
            .await
            .unwrap();
        assert_eq!(version.state, CryptoKeyVersionState::Enabled);
    }
}
