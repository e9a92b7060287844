//! The hierarchical in-memory resource store.
//!
//! The store is the sole owner of every resource. The top level is a
//! concurrent map of locations, each location guards its key rings with one
//! lock, each key ring guards its crypto keys with its own lock, and each
//! crypto key guards its versions (and the version-number counter) the same
//! way. Operations on disjoint subtrees therefore never contend with each
//! other, while creations under one parent are serialized, which is what
//! makes collision checks, version numbering, and per-parent timestamp
//! ordering atomic.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::error::{Error, Result};
use crate::name::{CryptoKeyName, CryptoKeyVersionName, KeyRingName, LocationName};
use crate::page;
use crate::resources::{CryptoKey, CryptoKeyVersion, CryptoKeyVersionState, KeyRing};

/// In-memory store of KeyRing -> CryptoKey -> CryptoKeyVersion
///
/// All mutating operations are atomic with respect to concurrent callers,
/// and an entity is visible to every subsequent read once its create call
/// has returned.
#[derive(Debug, Default)]
pub struct ResourceStore {
    // Locations come into existence implicitly with their first key ring.
    locations: DashMap<String, Arc<LocationState>>,
}

#[derive(Debug, Default)]
struct LocationState {
    rings: RwLock<ResourceTable<Arc<KeyRingState>>>,
}

#[derive(Debug)]
struct KeyRingState {
    resource: KeyRing,
    keys: RwLock<ResourceTable<Arc<CryptoKeyState>>>,
}

#[derive(Debug)]
struct CryptoKeyState {
    resource: CryptoKey,
    versions: RwLock<VersionTable>,
}

/// One level of the hierarchy: id-keyed entries plus their creation order.
#[derive(Debug)]
struct ResourceTable<T> {
    by_id: HashMap<String, T>,
    order: Vec<String>,
    last_create: Option<DateTime<Utc>>,
}

impl<T> Default for ResourceTable<T> {
    fn default() -> Self {
        Self {
            by_id: HashMap::new(),
            order: Vec::new(),
            last_create: None,
        }
    }
}

impl<T> ResourceTable<T> {
    // Issues a creation timestamp that never moves backwards within this
    // parent scope, even if the wall clock does.
    fn next_create_time(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let ts = match self.last_create {
            Some(prev) if prev > now => prev,
            _ => now,
        };
        self.last_create = Some(ts);
        ts
    }

    fn insert(&mut self, id: String, entry: T) {
        self.by_id.insert(id.clone(), entry);
        self.order.push(id);
    }

    fn in_order(&self) -> impl Iterator<Item = &T> {
        self.order.iter().filter_map(move |id| self.by_id.get(id))
    }
}

/// Versions of one crypto key, keyed by their sequential number.
#[derive(Debug)]
struct VersionTable {
    next: u64,
    by_number: BTreeMap<u64, CryptoKeyVersion>,
    last_create: Option<DateTime<Utc>>,
}

impl Default for VersionTable {
    fn default() -> Self {
        Self {
            next: 1,
            by_number: BTreeMap::new(),
            last_create: None,
        }
    }
}

impl VersionTable {
    fn next_create_time(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let ts = match self.last_create {
            Some(prev) if prev > now => prev,
            _ => now,
        };
        self.last_create = Some(ts);
        ts
    }
}

impl ResourceStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a key ring under the given location
    ///
    /// Fails with `AlreadyExists` if the id collides under that location.
    pub fn create_key_ring(
        &self,
        parent: &LocationName,
        id: &str,
        mut body: KeyRing,
    ) -> Result<KeyRing> {
        let location = Arc::clone(
            self.locations
                .entry(parent.to_string())
                .or_default()
                .value(),
        );

        let mut rings = location.rings.write().unwrap();
        let name = format!("{}/keyRings/{}", parent, id);
        if rings.by_id.contains_key(id) {
            return Err(Error::AlreadyExists(name));
        }

        body.name = name;
        body.create_time = Some(rings.next_create_time());

        rings.insert(
            id.to_string(),
            Arc::new(KeyRingState {
                resource: body.clone(),
                keys: RwLock::new(ResourceTable::default()),
            }),
        );

        Ok(body)
    }

    /// Returns the key ring with the given name
    pub fn get_key_ring(&self, name: &KeyRingName) -> Result<KeyRing> {
        Ok(self.ring_state(name)?.resource.clone())
    }

    /// Lists key rings under a location in creation order
    pub fn list_key_rings(
        &self,
        parent: &LocationName,
        page_size: usize,
        page_token: &str,
    ) -> Result<(Vec<KeyRing>, String)> {
        // Locations are not themselves resources, so listing one that has
        // never held a key ring yields an empty page rather than NotFound.
        let all: Vec<KeyRing> = match self.location(parent) {
            Some(location) => {
                let rings = location.rings.read().unwrap();
                rings.in_order().map(|r| r.resource.clone()).collect()
            }
            None => Vec::new(),
        };

        page::paginate(all, page_size, page_token)
    }

    /// Creates a crypto key under the given key ring
    ///
    /// Fails with `NotFound` if the key ring is absent and `AlreadyExists`
    /// on id collision. Unless `skip_initial_version` is set, version 1 is
    /// allocated in `PendingGeneration` state before the key is published,
    /// and returned so the caller can hand it to the generator.
    pub fn create_crypto_key(
        &self,
        parent: &KeyRingName,
        id: &str,
        mut body: CryptoKey,
        skip_initial_version: bool,
    ) -> Result<(CryptoKey, Option<CryptoKeyVersion>)> {
        let ring = self.ring_state(parent)?;

        let mut keys = ring.keys.write().unwrap();
        let name = format!("{}/cryptoKeys/{}", parent, id);
        if keys.by_id.contains_key(id) {
            return Err(Error::AlreadyExists(name));
        }

        body.name = name;
        body.create_time = Some(keys.next_create_time());

        let state = Arc::new(CryptoKeyState {
            resource: body.clone(),
            versions: RwLock::new(VersionTable::default()),
        });

        // Allocate version 1 before publishing the key so no reader can
        // observe the key without its initial version.
        let initial = if skip_initial_version {
            None
        } else {
            Some(Self::allocate_version(&state))
        };

        keys.insert(id.to_string(), state);

        Ok((body, initial))
    }

    /// Returns the crypto key with the given name
    pub fn get_crypto_key(&self, name: &CryptoKeyName) -> Result<CryptoKey> {
        Ok(self.key_state(name)?.resource.clone())
    }

    /// Lists crypto keys under a key ring in creation order
    pub fn list_crypto_keys(
        &self,
        parent: &KeyRingName,
        page_size: usize,
        page_token: &str,
    ) -> Result<(Vec<CryptoKey>, String)> {
        let ring = self.ring_state(parent)?;
        let all: Vec<CryptoKey> = {
            let keys = ring.keys.read().unwrap();
            keys.in_order().map(|k| k.resource.clone()).collect()
        };

        page::paginate(all, page_size, page_token)
    }

    /// Allocates the next version under the given crypto key
    ///
    /// The new version starts in `PendingGeneration` state; numbering is
    /// sequential per key and never produces duplicates, concurrent callers
    /// included.
    pub fn create_crypto_key_version(&self, parent: &CryptoKeyName) -> Result<CryptoKeyVersion> {
        let key = self.key_state(parent)?;
        Ok(Self::allocate_version(&key))
    }

    /// Returns the crypto key version with the given name
    pub fn get_crypto_key_version(&self, name: &CryptoKeyVersionName) -> Result<CryptoKeyVersion> {
        let key = self.key_state(&name.parent())?;
        let versions = key.versions.read().unwrap();
        versions
            .by_number
            .get(&name.version)
            .cloned()
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    /// Lists versions of a crypto key in creation (numeric) order
    pub fn list_crypto_key_versions(
        &self,
        parent: &CryptoKeyName,
        page_size: usize,
        page_token: &str,
    ) -> Result<(Vec<CryptoKeyVersion>, String)> {
        let key = self.key_state(parent)?;
        let all: Vec<CryptoKeyVersion> = {
            let versions = key.versions.read().unwrap();
            versions.by_number.values().cloned().collect()
        };

        page::paginate(all, page_size, page_token)
    }

    /// Commits the terminal state of a version whose generation finished
    ///
    /// The transition is atomic: readers observe either the pending version
    /// or the fully terminal one, never an intermediate. Only
    /// `PendingGeneration` versions may transition, and only to a terminal
    /// state; anything else is an invariant violation.
    pub fn complete_generation(
        &self,
        name: &CryptoKeyVersionName,
        state: CryptoKeyVersionState,
    ) -> Result<CryptoKeyVersion> {
        if !state.is_terminal() {
            return Err(Error::Internal(format!(
                "generation of {} cannot complete into non-terminal state {:?}",
                name, state
            )));
        }

        let key = self.key_state(&name.parent())?;
        let mut versions = key.versions.write().unwrap();
        let now = Utc::now();

        let version = versions
            .by_number
            .get_mut(&name.version)
            .ok_or_else(|| Error::NotFound(name.to_string()))?;

        if version.state != CryptoKeyVersionState::PendingGeneration {
            return Err(Error::Internal(format!(
                "version {} is {:?}, not pending generation",
                name, version.state
            )));
        }

        version.state = state;
        // generate_time never precedes create_time.
        let floor = version.create_time.unwrap_or(now);
        version.generate_time = Some(if floor > now { floor } else { now });

        Ok(version.clone())
    }

    fn location(&self, parent: &LocationName) -> Option<Arc<LocationState>> {
        self.locations
            .get(&parent.to_string())
            .map(|entry| Arc::clone(entry.value()))
    }

    fn ring_state(&self, name: &KeyRingName) -> Result<Arc<KeyRingState>> {
        let location = self
            .location(&name.parent())
            .ok_or_else(|| Error::NotFound(name.to_string()))?;
        let rings = location.rings.read().unwrap();
        rings
            .by_id
            .get(&name.key_ring)
            .cloned()
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    fn key_state(&self, name: &CryptoKeyName) -> Result<Arc<CryptoKeyState>> {
        let ring = self.ring_state(&name.parent())?;
        let keys = ring.keys.read().unwrap();
        keys.by_id
            .get(&name.crypto_key)
            .cloned()
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    // Allocation holds only the one key's version lock, so versions of
    // unrelated keys are assigned independently.
    fn allocate_version(key: &CryptoKeyState) -> CryptoKeyVersion {
        let mut versions = key.versions.write().unwrap();
        let number = versions.next;
        versions.next += 1;

        let version = CryptoKeyVersion {
            name: format!("{}/cryptoKeyVersions/{}", key.resource.name, number),
            state: CryptoKeyVersionState::PendingGeneration,
            algorithm: key.resource.purpose.default_algorithm().unwrap_or_default(),
            create_time: Some(versions.next_create_time()),
            generate_time: None,
        };

        versions.by_number.insert(number, version.clone());
        version
    }
}
