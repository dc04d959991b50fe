//! Credential persistence for paired bridges.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use log::warn;

use crate::bridge::Bridge;

/// An opaque string key-value store used as the persistence seam.
///
/// Semantics mirror a browser's local storage: `set` is fire-and-forget,
/// `get` returns `None` for anything absent. Implementations that can fail
/// internally (see [`FileStore`]) degrade to "nothing stored" and log.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
}

/// Key-value store held in memory, for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
    }
}

/// Key-value store backed by one file per key inside a directory.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStore { dir: dir.into() }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.dir.join(key)).ok()
    }

    fn set(&self, key: &str, value: &str) {
        if let Err(err) = std::fs::create_dir_all(&self.dir)
            .and_then(|()| std::fs::write(self.dir.join(key), value))
        {
            warn!("failed to persist {key:?}: {err}");
        }
    }
}

/// The persisted list of known bridges and their issued usernames.
///
/// The whole list is serialized under one fixed key and rewritten on every
/// change. Reads of missing or unreadable state come back empty rather than
/// failing, so a corrupted store behaves like a fresh one.
///
/// ```
/// use hue_lights_rs::{Bridge, CredentialStore, MemoryStore};
///
/// let accounts = CredentialStore::new(MemoryStore::new());
/// accounts.add_bridge(&Bridge::new("192.168.1.2", "Hue Bridge"));
/// assert_eq!(accounts.bridges().len(), 1);
///
/// // Same identity: the first write wins.
/// accounts.add_bridge(&Bridge::new("192.168.1.2", "Duplicate"));
/// assert_eq!(accounts.bridges().len(), 1);
/// ```
#[derive(Debug)]
pub struct CredentialStore<S> {
    store: S,
}

impl<S: KeyValueStore> CredentialStore<S> {
    /// Key under which the serialized bridge list lives.
    pub const STORAGE_KEY: &'static str = "bridgeAccounts";

    pub fn new(store: S) -> Self {
        CredentialStore { store }
    }

    /// All stored bridges, oldest first.
    pub fn bridges(&self) -> Vec<Bridge> {
        let Some(raw) = self.store.get(Self::STORAGE_KEY) else {
            return Vec::new();
        };
        serde_json::from_str(&raw).unwrap_or_else(|err| {
            warn!("stored bridge list is unreadable, starting over: {err}");
            Vec::new()
        })
    }

    /// Look up a stored bridge by address.
    pub fn find(&self, ip: &str) -> Option<Bridge> {
        self.bridges().into_iter().find(|bridge| bridge.ip == ip)
    }

    /// Add a bridge to the stored list.
    ///
    /// First write wins: when an entry with the same identity already
    /// exists, the new one is discarded rather than merged.
    pub fn add_bridge(&self, bridge: &Bridge) {
        let mut bridges = self.bridges();
        if bridges.iter().any(|known| known.same_identity(bridge)) {
            return;
        }
        bridges.push(bridge.clone());

        match serde_json::to_string(&bridges) {
            Ok(raw) => self.store.set(Self::STORAGE_KEY, &raw),
            Err(err) => warn!("failed to serialize bridge list: {err}"),
        }
    }
}
