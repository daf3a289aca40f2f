//! User preferences persisted as individual keys.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::error::StorageResult;
use super::store::KeyValueStore;

pub const LANG_KEY: &str = "biomass_lang";
pub const DARK_MODE_KEY: &str = "biomass_dark_mode";
pub const WELCOME_DONE_KEY: &str = "biomass_welcome_done";
pub const TOUR_DONE_KEY: &str = "biomass_tour_done";
pub const FIELD_COUNTER_KEY: &str = "biomass_field_counter";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Pl,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Pl => "pl",
        }
    }

    /// Prefix of auto-generated field names.
    pub fn field_prefix(&self) -> &'static str {
        match self {
            Language::En => "Field_",
            Language::Pl => "Pole_",
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" => Ok(Language::En),
            "pl" => Ok(Language::Pl),
            other => Err(format!("Unsupported language: {}", other)),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Snapshot of every preference, as exposed over the API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferencesSnapshot {
    pub language: Language,
    pub dark_mode: bool,
    pub welcome_done: bool,
    pub tour_done: bool,
    pub field_counter: u32,
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreferencesUpdate {
    pub language: Option<Language>,
    pub dark_mode: Option<bool>,
    pub welcome_done: Option<bool>,
    pub tour_done: Option<bool>,
}

#[derive(Clone)]
pub struct Preferences {
    store: Arc<dyn KeyValueStore>,
    counter_lock: Arc<Mutex<()>>,
}

impl Preferences {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            counter_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Stored language; unknown or missing values fall back to English.
    pub fn language(&self) -> Language {
        self.store
            .get(LANG_KEY)
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    }

    pub fn set_language(&self, language: Language) -> StorageResult<()> {
        self.store.set(LANG_KEY, language.code())
    }

    pub fn dark_mode(&self) -> bool {
        self.flag(DARK_MODE_KEY)
    }

    pub fn set_dark_mode(&self, enabled: bool) -> StorageResult<()> {
        self.store.set(DARK_MODE_KEY, if enabled { "1" } else { "0" })
    }

    pub fn welcome_done(&self) -> bool {
        self.flag(WELCOME_DONE_KEY)
    }

    pub fn tour_done(&self) -> bool {
        self.flag(TOUR_DONE_KEY)
    }

    pub fn set_welcome_done(&self, done: bool) -> StorageResult<()> {
        self.set_flag(WELCOME_DONE_KEY, done)
    }

    pub fn set_tour_done(&self, done: bool) -> StorageResult<()> {
        self.set_flag(TOUR_DONE_KEY, done)
    }

    /// Current field counter (0 when never bumped).
    pub fn field_counter(&self) -> u32 {
        self.store
            .get(FIELD_COUNTER_KEY)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0)
    }

    /// Increment and persist the field counter; called once per session.
    pub fn next_field_number(&self) -> StorageResult<u32> {
        let _guard = self.counter_lock.lock();
        let next = self.field_counter().saturating_add(1);
        self.store.set(FIELD_COUNTER_KEY, &next.to_string())?;
        Ok(next)
    }

    /// Auto-generated name for a field the user left unnamed.
    pub fn default_field_name(&self) -> String {
        let counter = self.field_counter().max(1);
        format!("{}{}", self.language().field_prefix(), counter)
    }

    pub fn snapshot(&self) -> PreferencesSnapshot {
        PreferencesSnapshot {
            language: self.language(),
            dark_mode: self.dark_mode(),
            welcome_done: self.welcome_done(),
            tour_done: self.tour_done(),
            field_counter: self.field_counter(),
        }
    }

    pub fn apply(&self, update: &PreferencesUpdate) -> StorageResult<PreferencesSnapshot> {
        if let Some(language) = update.language {
            self.set_language(language)?;
        }
        if let Some(dark) = update.dark_mode {
            self.set_dark_mode(dark)?;
        }
        if let Some(done) = update.welcome_done {
            self.set_welcome_done(done)?;
        }
        if let Some(done) = update.tour_done {
            self.set_tour_done(done)?;
        }
        Ok(self.snapshot())
    }

    fn flag(&self, key: &str) -> bool {
        self.store.get(key).is_some_and(|v| v == "1")
    }

    fn set_flag(&self, key: &str, value: bool) -> StorageResult<()> {
        if value {
            self.store.set(key, "1")
        } else {
            self.store.remove(key)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn prefs() -> (Arc<MemoryStore>, Preferences) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), Preferences::new(store))
    }

    #[test]
    fn test_defaults() {
        let (_, prefs) = prefs();
        assert_eq!(prefs.snapshot(), PreferencesSnapshot::default());
        assert_eq!(prefs.default_field_name(), "Field_1");
    }

    #[test]
    fn test_unknown_language_falls_back() {
        let (store, prefs) = prefs();
        store.set(LANG_KEY, "de").unwrap();
        assert_eq!(prefs.language(), Language::En);
        prefs.set_language(Language::Pl).unwrap();
        assert_eq!(store.get(LANG_KEY).as_deref(), Some("pl"));
    }

    #[test]
    fn test_dark_mode_encoding() {
        let (store, prefs) = prefs();
        prefs.set_dark_mode(true).unwrap();
        assert_eq!(store.get(DARK_MODE_KEY).as_deref(), Some("1"));
        prefs.set_dark_mode(false).unwrap();
        assert_eq!(store.get(DARK_MODE_KEY).as_deref(), Some("0"));
        assert!(!prefs.dark_mode());
    }

    #[test]
    fn test_field_counter_and_name() {
        let (_, prefs) = prefs();
        assert_eq!(prefs.next_field_number().unwrap(), 1);
        assert_eq!(prefs.next_field_number().unwrap(), 2);
        prefs.set_language(Language::Pl).unwrap();
        assert_eq!(prefs.default_field_name(), "Pole_2");
    }

    #[test]
    fn test_apply_partial_update() {
        let (_, prefs) = prefs();
        let update = PreferencesUpdate {
            tour_done: Some(true),
            ..Default::default()
        };
        let snapshot = prefs.apply(&update).unwrap();
        assert!(snapshot.tour_done);
        assert!(!snapshot.welcome_done);
        assert_eq!(snapshot.language, Language::En);
    }
}
