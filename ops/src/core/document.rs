//! In-memory configuration document and value updates.

use std::fmt;

use serde::Serialize;

/// One `<table>` record of the configuration document.
///
/// Fields are optional because partially specified records exist in the
/// wild; they are tolerated on load and skipped by the viewer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConfigEntry {
    pub key: Option<String>,
    pub value: Option<String>,
    pub description: Option<String>,
    #[serde(skip)]
    dirty: bool,
}

impl ConfigEntry {
    #[cfg(test)]
    pub fn new(key: Option<String>, value: Option<String>, description: Option<String>) -> Self {
        Self {
            key,
            value,
            description,
            dirty: false,
        }
    }

    /// True when the value was replaced since the document was loaded.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

/// Loaded configuration document.
///
/// Keeps the original source so that saving rewrites only changed values and
/// leaves every other byte of structure intact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDocument {
    source: String,
    entries: Vec<ConfigEntry>,
}

/// Before/after record of a successful update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueChange {
    pub key: String,
    pub old: Option<String>,
    pub new: String,
}

impl fmt::Display for ValueChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let old = self.old.as_deref().unwrap_or("(unset)");
        write!(f, "{}: {} -> {}", self.key, old, self.new)
    }
}

impl ConfigDocument {
    pub fn new(source: String, entries: Vec<ConfigEntry>) -> Self {
        Self { source, entries }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn entries(&self) -> &[ConfigEntry] {
        &self.entries
    }

    pub fn get(&self, key: &str) -> Option<&ConfigEntry> {
        self.entries
            .iter()
            .find(|entry| entry.key.as_deref() == Some(key))
    }

    /// True when any entry changed and the document needs saving.
    #[cfg(test)]
    pub fn is_dirty(&self) -> bool {
        self.entries.iter().any(ConfigEntry::is_dirty)
    }

    /// Set the value of the first entry whose key equals `key`.
    ///
    /// Returns `None` and leaves the document untouched when no entry
    /// matches. Duplicate keys are not rejected; only the first is updated.
    pub fn update(&mut self, key: &str, new_value: impl ToString) -> Option<ValueChange> {
        let entry = self
            .entries
            .iter_mut()
            .find(|entry| entry.key.as_deref() == Some(key))?;
        let new = new_value.to_string();
        let old = entry.value.replace(new.clone());
        entry.dirty = true;
        Some(ValueChange {
            key: key.to_string(),
            old,
            new,
        })
    }
}
