//! Credential store backed by a JSON file.
//!
//! The file holds an array of device records:
//!
//! ```json
//! [
//!   { "client_id": 42, "shared_key": "6b", "authorized": true, "last_counter": 5 }
//! ]
//! ```
//!
//! `shared_key` is hex. Every counter advance rewrites the whole file through a
//! temp file and a rename, so a crash leaves either the old or the new file,
//! never a torn one.

use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Mutex,
};

use serde::{Deserialize, Serialize};
use warden_core::{CredentialStore, DeviceCredential, SharedKey, StoreError};

/// On-disk form of a [`DeviceCredential`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct DeviceRecord {
    client_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    shared_key: Option<String>,
    #[serde(default = "authorized_by_default")]
    authorized: bool,
    #[serde(default)]
    last_counter: u64,
}

const fn authorized_by_default() -> bool {
    true
}

impl DeviceRecord {
    fn into_credential(self) -> Result<DeviceCredential, StoreError> {
        let shared_key = self
            .shared_key
            .map(|encoded| {
                hex::decode(&encoded).map(SharedKey::new).map_err(|e| {
                    StoreError::Corrupt(format!("device {}: bad shared_key: {e}", self.client_id))
                })
            })
            .transpose()?;

        Ok(DeviceCredential {
            client_id: self.client_id,
            shared_key,
            authorized: self.authorized,
            last_counter: self.last_counter,
        })
    }

    fn from_credential(credential: &DeviceCredential) -> Self {
        Self {
            client_id: credential.client_id,
            shared_key: credential.shared_key.as_ref().map(|key| hex::encode(key.as_bytes())),
            authorized: credential.authorized,
            last_counter: credential.last_counter,
        }
    }
}

/// Credential store persisted to a JSON file.
pub struct JsonFileCredentialStore {
    path: PathBuf,
    devices: Mutex<BTreeMap<u64, DeviceCredential>>,
}

impl JsonFileCredentialStore {
    /// Load the store from `path`.
    ///
    /// # Errors
    ///
    /// - `StoreError::Io` if the file cannot be read
    /// - `StoreError::Corrupt` if it is not a valid device list, a key is not
    ///   hex, or a `client_id` appears twice
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let bytes = fs::read(&path).map_err(|e| io_error(&path, &e))?;
        let records: Vec<DeviceRecord> = serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::Corrupt(format!("{}: {e}", path.display())))?;

        let mut devices = BTreeMap::new();
        for record in records {
            let credential = record.into_credential()?;
            let client_id = credential.client_id;
            if devices.insert(client_id, credential).is_some() {
                return Err(StoreError::Corrupt(format!("duplicate client_id {client_id}")));
            }
        }

        tracing::info!(path = %path.display(), devices = devices.len(), "credential store loaded");
        Ok(Self { path, devices: Mutex::new(devices) })
    }

    /// Write `devices` to a new file at `path` and open it.
    ///
    /// # Errors
    ///
    /// `StoreError::Io` if the file cannot be written.
    pub fn create(
        path: impl Into<PathBuf>,
        devices: impl IntoIterator<Item = DeviceCredential>,
    ) -> Result<Self, StoreError> {
        let path = path.into();
        let devices: BTreeMap<u64, DeviceCredential> =
            devices.into_iter().map(|device| (device.client_id, device)).collect();
        persist(&path, &devices)?;
        Ok(Self { path, devices: Mutex::new(devices) })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of provisioned devices.
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.devices.lock().map_err(|_| StoreError::Poisoned)?.len())
    }

    /// Returns true if no device is provisioned.
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

impl CredentialStore for JsonFileCredentialStore {
    fn get(&self, client_id: u64) -> Result<Option<DeviceCredential>, StoreError> {
        let devices = self.devices.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(devices.get(&client_id).cloned())
    }

    fn advance_counter(&self, client_id: u64, counter: u64) -> Result<bool, StoreError> {
        let mut devices = self.devices.lock().map_err(|_| StoreError::Poisoned)?;

        let Some(device) = devices.get_mut(&client_id) else {
            return Ok(false);
        };
        if counter <= device.last_counter {
            return Ok(false);
        }

        let previous = device.last_counter;
        device.last_counter = counter;

        // Keep memory and disk in agreement: a counter that was not persisted
        // was not accepted.
        if let Err(err) = persist(&self.path, &devices) {
            if let Some(device) = devices.get_mut(&client_id) {
                device.last_counter = previous;
            }
            return Err(err);
        }
        Ok(true)
    }
}

impl std::fmt::Debug for JsonFileCredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonFileCredentialStore").field("path", &self.path).finish_non_exhaustive()
    }
}

fn persist(path: &Path, devices: &BTreeMap<u64, DeviceCredential>) -> Result<(), StoreError> {
    let records: Vec<DeviceRecord> = devices.values().map(DeviceRecord::from_credential).collect();
    let bytes = serde_json::to_vec_pretty(&records)
        .map_err(|e| StoreError::Corrupt(format!("serialize devices: {e}")))?;

    let tmp = temp_path(path);
    let write = || -> io::Result<()> {
        let mut file = File::create(&tmp)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        fs::rename(&tmp, path)
    };

    write().map_err(|e| {
        let _ = fs::remove_file(&tmp);
        io_error(path, &e)
    })
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(ToOwned::to_owned).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn io_error(path: &Path, err: &io::Error) -> StoreError {
    StoreError::Io(format!("{}: {err}", path.display()))
}
