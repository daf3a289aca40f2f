//! Local persistence: a key-value store plus the two typed views the explorer
//! keeps in it (saved fields and preferences).

pub mod error;
pub mod file;
pub mod memory;
pub mod preferences;
pub mod saved_fields;
pub mod store;

pub use error::{StorageError, StorageResult};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use preferences::{Language, Preferences, PreferencesSnapshot, PreferencesUpdate};
pub use saved_fields::{FieldInfo, SavedField, SavedFields, MAX_SAVED_FIELDS};
pub use store::KeyValueStore;
