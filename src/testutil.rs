//! Helpers for writing contract tests against the service.
//!
//! Creating a version is asynchronous on the service side, so tests that
//! need usable key material poll until the version reaches a terminal state.

use std::time::Duration;

use tokio::time::{sleep, Instant};
use uuid::Uuid;

use crate::error::RpcResult;
use crate::resources::CryptoKeyVersion;
use crate::service::{CreateCryptoKeyVersionRequest, GetCryptoKeyVersionRequest};
use crate::KeyManagementService;

/// Interval between polls while waiting on a version's terminal state
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Returns a randomized identifier suitable for naming test resources
pub fn random_id(prefix: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}{}", prefix, &suffix[..12])
}

/// Polls `get_crypto_key_version` until the named version reaches a
/// terminal state or the timeout expires
///
/// RPC failures are propagated; an expired timeout panics, since a version
/// that never terminates is a bug in the caller's setup rather than a
/// condition a test should handle.
pub async fn wait_for_terminal<K>(
    kms: &K,
    name: &str,
    timeout: Duration,
) -> RpcResult<CryptoKeyVersion>
where
    K: KeyManagementService + ?Sized,
{
    let deadline = Instant::now() + timeout;

    loop {
        let version = kms
            .get_crypto_key_version(GetCryptoKeyVersionRequest {
                name: name.to_string(),
            })
            .await?;

        if version.state.is_terminal() {
            return Ok(version);
        }

        if Instant::now() >= deadline {
            panic!(
                "version {} still {:?} after {:?}",
                name, version.state, timeout
            );
        }

        sleep(DEFAULT_POLL_INTERVAL).await;
    }
}

/// Creates a version under `parent` and waits for its terminal state
pub async fn create_version_and_wait<K>(
    kms: &K,
    parent: &str,
    timeout: Duration,
) -> RpcResult<CryptoKeyVersion>
where
    K: KeyManagementService + ?Sized,
{
    let version = kms
        .create_crypto_key_version(CreateCryptoKeyVersionRequest {
            parent: parent.to_string(),
            ..Default::default()
        })
        .await?;

    wait_for_terminal(kms, &version.name, timeout).await
}
