//! Most-recently-used list of saved fields.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::error::{StorageError, StorageResult};
use super::store::KeyValueStore;
use crate::api::{AreaOfInterest, ParcelInfo};

pub const SAVED_FIELDS_KEY: &str = "biomass_explorer_saved_fields";
pub const MAX_SAVED_FIELDS: usize = 10;

/// Cadastral details kept alongside a saved boundary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldInfo {
    #[serde(default)]
    pub parcel_id: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub commune: Option<String>,
}

impl From<&ParcelInfo> for FieldInfo {
    fn from(parcel: &ParcelInfo) -> Self {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        Self {
            parcel_id: non_empty(&parcel.parcel_id),
            region: non_empty(&parcel.region),
            commune: non_empty(&parcel.commune),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedField {
    pub name: String,
    pub geojson: AreaOfInterest,
    #[serde(default)]
    pub info: Option<FieldInfo>,
    #[serde(rename = "savedAt")]
    pub saved_at: DateTime<Utc>,
}

/// Saved-field list stored as one JSON array, most recent first.
///
/// Updates read, modify and rewrite the whole array under `update_lock`;
/// clones share the lock.
#[derive(Clone)]
pub struct SavedFields {
    store: Arc<dyn KeyValueStore>,
    update_lock: Arc<Mutex<()>>,
}

impl SavedFields {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            update_lock: Arc::new(Mutex::new(())),
        }
    }

    /// All saved fields; a missing or corrupt blob reads as an empty list.
    pub fn list(&self) -> Vec<SavedField> {
        let Some(raw) = self.store.get(SAVED_FIELDS_KEY) else {
            return Vec::new();
        };
        match serde_json::from_str(&raw) {
            Ok(fields) => fields,
            Err(e) => {
                warn!("Discarding unreadable saved-field list: {}", e);
                Vec::new()
            }
        }
    }

    pub fn get(&self, index: usize) -> Option<SavedField> {
        self.list().into_iter().nth(index)
    }

    /// Save a field at the front of the list.
    ///
    /// An entry with the same name is replaced; the list is truncated to
    /// [`MAX_SAVED_FIELDS`].
    pub fn save(
        &self,
        name: &str,
        geojson: AreaOfInterest,
        info: Option<FieldInfo>,
    ) -> StorageResult<SavedField> {
        let _guard = self.update_lock.lock();
        let mut fields = self.list();
        fields.retain(|f| f.name != name);
        let entry = SavedField {
            name: name.to_string(),
            geojson,
            info,
            saved_at: Utc::now(),
        };
        fields.insert(0, entry.clone());
        fields.truncate(MAX_SAVED_FIELDS);
        self.write(&fields)?;
        debug!("Saved field '{}' ({} in list)", name, fields.len());
        Ok(entry)
    }

    /// Remove the entry at `index`; returns it if it existed.
    pub fn remove(&self, index: usize) -> StorageResult<Option<SavedField>> {
        let _guard = self.update_lock.lock();
        let mut fields = self.list();
        if index >= fields.len() {
            return Ok(None);
        }
        let removed = fields.remove(index);
        self.write(&fields)?;
        Ok(Some(removed))
    }

    fn write(&self, fields: &[SavedField]) -> StorageResult<()> {
        let raw = serde_json::to_string(fields)
            .map_err(|e| StorageError::serialization(SAVED_FIELDS_KEY, e))?;
        self.store.set(SAVED_FIELDS_KEY, &raw)
    }
}
