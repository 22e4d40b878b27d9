//! Key/value persistence for visualizer state
//!
//! Values are stored as strings so any store (a TOML file here, a platform
//! settings API elsewhere) can hold them. Numbers are written with Rust's
//! shortest round-trip formatting, so a saved `f64` restores bit-exact.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{MeterError, Result};

pub trait SettingsStore {
    fn value(&self, key: &str) -> Option<String>;
    fn set_value(&mut self, key: &str, value: String);
}

/// Read a float; `Ok(None)` if the key is absent
pub fn read_f64(store: &dyn SettingsStore, key: &str) -> Result<Option<f64>> {
    store
        .value(key)
        .map(|raw| {
            raw.trim()
                .parse::<f64>()
                .map_err(|_| MeterError::Settings(format!("{}: invalid number {:?}", key, raw)))
        })
        .transpose()
}

pub fn write_f64(store: &mut dyn SettingsStore, key: &str, value: f64) {
    store.set_value(key, value.to_string());
}

/// In-memory store, loadable from and savable to a flat TOML table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemorySettings {
    values: BTreeMap<String, String>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let values = toml::from_str(text).map_err(|e| MeterError::Settings(e.to_string()))?;
        Ok(Self { values })
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(&self.values).map_err(|e| MeterError::Settings(e.to_string()))
    }

    /// Load from `path`; a missing file yields an empty store
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml_str(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No settings at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(MeterError::Settings(format!("{}: {}", path.display(), e))),
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_toml_string()?)
            .map_err(|e| MeterError::Settings(format!("{}: {}", path.display(), e)))
    }
}

impl SettingsStore for MemorySettings {
    fn value(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set_value(&mut self, key: &str, value: String) {
        self.values.insert(key.to_string(), value);
    }
}
