//! Device credentials and the store that holds them.
//!
//! One record per device: shared secret, authorization flag, and the largest
//! counter ever accepted. Provisioning and revocation happen out of band; the
//! protocol only reads records and advances counters.

use std::{
    collections::HashMap,
    fmt,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

/// Shared secret between one device and the server.
///
/// # Security
///
/// - **Debug Redaction**: the `Debug` impl prints only the key length.
#[derive(Clone, PartialEq, Eq)]
pub struct SharedKey(Vec<u8>);

impl SharedKey {
    /// Recommended key length in bytes.
    pub const RECOMMENDED_LEN: usize = 256;

    /// Wrap raw key bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Key length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true for a zero-length key.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SharedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedKey(<redacted {} bytes>)", self.0.len())
    }
}

impl From<Vec<u8>> for SharedKey {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for SharedKey {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<&str> for SharedKey {
    fn from(key: &str) -> Self {
        Self(key.as_bytes().to_vec())
    }
}

/// Stored record for one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceCredential {
    /// Device identifier.
    pub client_id: u64,
    /// Shared secret; `None` until provisioned.
    pub shared_key: Option<SharedKey>,
    /// Only authorized devices may issue commands.
    pub authorized: bool,
    /// Largest counter ever accepted from this device.
    pub last_counter: u64,
}

impl DeviceCredential {
    /// An authorized device with the given key and no accepted counter yet.
    pub fn new(client_id: u64, shared_key: impl Into<SharedKey>) -> Self {
        Self { client_id, shared_key: Some(shared_key.into()), authorized: true, last_counter: 0 }
    }

    /// Set the last accepted counter.
    #[must_use]
    pub fn with_last_counter(mut self, last_counter: u64) -> Self {
        self.last_counter = last_counter;
        self
    }

    /// Set the authorization flag.
    #[must_use]
    pub fn with_authorized(mut self, authorized: bool) -> Self {
        self.authorized = authorized;
        self
    }

    /// The shared key, if one is configured and non-empty.
    pub fn key(&self) -> Option<&SharedKey> {
        self.shared_key.as_ref().filter(|key| !key.is_empty())
    }
}

/// Errors from a credential store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A lock guarding the records was poisoned by a panicking writer.
    #[error("credential store lock poisoned")]
    Poisoned,

    /// Persistent storage could not be read or written.
    #[error("I/O error: {0}")]
    Io(String),

    /// Persistent storage holds data that does not parse.
    #[error("corrupt credential data: {0}")]
    Corrupt(String),
}

/// Repository of device credentials.
///
/// # Invariants
///
/// - `last_counter` never decreases
/// - `advance_counter` is atomic with respect to its own comparison: of two
///   concurrent calls with the same counter, at most one returns `true`
pub trait CredentialStore: Send + Sync {
    /// Load the record for `client_id`.
    fn get(&self, client_id: u64) -> Result<Option<DeviceCredential>, StoreError>;

    /// Set `last_counter` to `counter` iff `counter > last_counter`.
    ///
    /// Returns `Ok(false)` when the counter is stale or the device is unknown.
    fn advance_counter(&self, client_id: u64, counter: u64) -> Result<bool, StoreError>;
}

/// In-memory credential store.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    devices: RwLock<HashMap<u64, DeviceCredential>>,
}

impl MemoryCredentialStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `devices`. Later duplicates replace earlier ones.
    pub fn with_devices(devices: impl IntoIterator<Item = DeviceCredential>) -> Self {
        let devices = devices.into_iter().map(|device| (device.client_id, device)).collect();
        Self { devices: RwLock::new(devices) }
    }

    /// Provision or replace a device.
    pub fn insert(&self, device: DeviceCredential) -> Result<(), StoreError> {
        self.write()?.insert(device.client_id, device);
        Ok(())
    }

    /// Clear the authorization flag. Returns false if the device is unknown.
    pub fn revoke(&self, client_id: u64) -> Result<bool, StoreError> {
        let mut devices = self.write()?;
        let Some(device) = devices.get_mut(&client_id) else {
            return Ok(false);
        };
        device.authorized = false;
        Ok(true)
    }

    /// All records, sorted by client ID.
    pub fn snapshot(&self) -> Result<Vec<DeviceCredential>, StoreError> {
        let mut devices: Vec<DeviceCredential> = self.read()?.values().cloned().collect();
        devices.sort_by_key(|device| device.client_id);
        Ok(devices)
    }

    /// Number of provisioned devices.
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.len())
    }

    /// Returns true if no device is provisioned.
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.read()?.is_empty())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<u64, DeviceCredential>>, StoreError> {
        self.devices.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<u64, DeviceCredential>>, StoreError> {
        self.devices.write().map_err(|_| StoreError::Poisoned)
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, client_id: u64) -> Result<Option<DeviceCredential>, StoreError> {
        Ok(self.read()?.get(&client_id).cloned())
    }

    fn advance_counter(&self, client_id: u64, counter: u64) -> Result<bool, StoreError> {
        let mut devices = self.write()?;
        match devices.get_mut(&client_id) {
            Some(device) if counter > device.last_counter => {
                device.last_counter = counter;
                Ok(true)
            },
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread};

    use super::*;

    #[test]
    fn shared_key_debug_is_redacted() {
        let key = SharedKey::from("super-secret");
        let rendered = format!("{key:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("12 bytes"));
    }

    #[test]
    fn empty_key_counts_as_missing() {
        let device = DeviceCredential::new(1, "");
        assert!(device.key().is_none());

        let device = DeviceCredential { shared_key: None, ..DeviceCredential::new(1, "k") };
        assert!(device.key().is_none());
    }

    #[test]
    fn advance_requires_strictly_greater_counter() {
        let store = MemoryCredentialStore::with_devices([
            DeviceCredential::new(42, "k").with_last_counter(5)
        ]);

        assert!(!store.advance_counter(42, 5).unwrap());
        assert!(!store.advance_counter(42, 4).unwrap());
        assert!(store.advance_counter(42, 6).unwrap());
        assert_eq!(store.get(42).unwrap().unwrap().last_counter, 6);
        assert!(!store.advance_counter(42, 6).unwrap());
    }

    #[test]
    fn advance_unknown_device_is_false() {
        let store = MemoryCredentialStore::new();
        assert!(!store.advance_counter(7, 1).unwrap());
    }

    #[test]
    fn revoke_clears_authorization() {
        let store = MemoryCredentialStore::with_devices([DeviceCredential::new(3, "k")]);
        assert!(store.revoke(3).unwrap());
        assert!(!store.get(3).unwrap().unwrap().authorized);
        assert!(!store.revoke(4).unwrap());
    }

    #[test]
    fn snapshot_is_sorted() {
        let store = MemoryCredentialStore::with_devices([
            DeviceCredential::new(9, "a"),
            DeviceCredential::new(2, "b"),
        ]);
        let ids: Vec<u64> = store.snapshot().unwrap().iter().map(|d| d.client_id).collect();
        assert_eq!(ids, vec![2, 9]);
        assert_eq!(store.len().unwrap(), 2);
    }

    #[test]
    fn concurrent_advances_admit_one_winner() {
        let store = Arc::new(MemoryCredentialStore::with_devices([DeviceCredential::new(1, "k")]));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || store.advance_counter(1, 10).unwrap())
            })
            .collect();

        let winners = handles.into_iter().map(|h| h.join().unwrap()).filter(|won| *won).count();
        assert_eq!(winners, 1);
        assert_eq!(store.get(1).unwrap().unwrap().last_counter, 10);
    }
}
