//! Pass-through key/value options handed to store drivers.
//!
//! The engine never interprets these; drivers read the keys they know and
//! ignore the rest, in the manner of GDAL open and layer-creation options.

use std::collections::BTreeMap;
use std::fmt;

/// Ordered `KEY=VALUE` option set. Keys are stored upper-case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverOptions {
    entries: BTreeMap<String, String>,
}

/// Options supplied when opening an input dataset.
pub type OpenOptions = DriverOptions;

/// Options supplied when creating an output layer.
pub type LayerOptions = DriverOptions;

impl DriverOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a comma separated `KEY=VALUE` list such as
    /// `LNAM_REFS=ON,SPLIT_MULTIPOINT=ON`. Entries without `=` are read as
    /// `KEY=ON`; empty entries are skipped.
    #[must_use]
    pub fn parse(list: &str) -> Self {
        let mut options = Self::new();
        for entry in list.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            match entry.split_once('=') {
                Some((key, value)) => options.set(key.trim(), value.trim()),
                None => options.set(entry, "ON"),
            }
        }
        options
    }

    /// Sets an option, replacing any previous value.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.entries.insert(key.to_ascii_uppercase(), value.into());
    }

    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Merges `other` over `self`; keys in `other` win.
    #[must_use]
    pub fn merged_with(mut self, other: &Self) -> Self {
        for (key, value) in &other.entries {
            self.entries.insert(key.clone(), value.clone());
        }
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(&key.to_ascii_uppercase())
            .map(String::as_str)
    }

    /// Reads a boolean switch: `ON`, `YES`, `TRUE` and `1` are true, anything
    /// else false, and `default` applies when the key is absent.
    #[must_use]
    pub fn flag(&self, key: &str, default: bool) -> bool {
        self.get(key).map_or(default, |value| {
            matches!(
                value.to_ascii_uppercase().as_str(),
                "ON" | "YES" | "TRUE" | "1"
            )
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for DriverOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.iter().map(|(k, v)| format!("{k}={v}")).collect();
        f.write_str(&rendered.join(","))
    }
}
