//! Simulated asynchronous key-material generation.
//!
//! Every newly allocated version starts in `PendingGeneration`; a background
//! task per version drives it to a terminal state after a configurable
//! delay. The outcome is injected through [`GenerationPolicy`] rather than
//! drawn from randomness, so failure-path tests are deterministic.

use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::name::CryptoKeyVersionName;
use crate::resources::{CryptoKeyVersion, CryptoKeyVersionState};
use crate::store::ResourceStore;

/// Default simulated generation delay
pub const DEFAULT_GENERATION_DELAY: Duration = Duration::from_millis(50);

/// Terminal outcome applied once simulated generation completes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// Versions become `Enabled`
    #[default]
    Succeed,
    /// Versions become `GenerationFailed`
    Fail,
}

/// Policy controlling the simulated generation lifecycle
#[derive(Debug, Clone)]
pub struct GenerationPolicy {
    /// How long a version stays in `PendingGeneration`
    pub delay: Duration,

    /// Which terminal state generation produces
    pub outcome: GenerationOutcome,
}

impl Default for GenerationPolicy {
    fn default() -> Self {
        Self {
            delay: DEFAULT_GENERATION_DELAY,
            outcome: GenerationOutcome::Succeed,
        }
    }
}

impl GenerationPolicy {
    /// Creates a policy with the default delay and a successful outcome
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the simulated generation delay
    ///
    /// A zero delay still completes on a background task, so callers always
    /// observe `PendingGeneration` on the create response itself.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Sets the terminal outcome, e.g. to exercise failure-path tests
    pub fn with_outcome(mut self, outcome: GenerationOutcome) -> Self {
        self.outcome = outcome;
        self
    }
}

/// Drives pending versions to their terminal state on background tasks
///
/// One task is spawned per version, the creator is never blocked, and
/// generation of independent versions proceeds independently. Once spawned,
/// a task always commits exactly one terminal state.
#[derive(Debug)]
pub struct VersionGenerator {
    store: Arc<ResourceStore>,
    policy: GenerationPolicy,
}

impl VersionGenerator {
    /// Creates a generator over the given store
    pub fn new(store: Arc<ResourceStore>, policy: GenerationPolicy) -> Self {
        Self { store, policy }
    }

    /// Spawns the single generation task for a newly allocated version
    ///
    /// Must be called exactly once per version, immediately after the store
    /// allocates it; the store rejects any second transition attempt.
    pub fn spawn(&self, version: &CryptoKeyVersion) -> Result<()> {
        let name = CryptoKeyVersionName::parse(&version.name)?;
        let store = Arc::clone(&self.store);
        let delay = self.policy.delay;
        let target = match self.policy.outcome {
            GenerationOutcome::Succeed => CryptoKeyVersionState::Enabled,
            GenerationOutcome::Fail => CryptoKeyVersionState::GenerationFailed,
        };

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match store.complete_generation(&name, target) {
                Ok(version) => log::debug!("generated {} -> {:?}", version.name, version.state),
                Err(err) => log::warn!("generation of {} did not commit: {}", name, err),
            }
        });

        Ok(())
    }
}
