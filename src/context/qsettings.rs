//! A small process-wide key/value store for cross-session settings such as
//! the worker count, mirroring the original's use of `QSettings` for values
//! that outlive any single scan or workflow (e.g. `global/mp_n_workers`).

use std::collections::HashMap;
use std::path::Path;

use crate::errors::ContextError;
use crate::parameter::ParamValue;

/// An in-memory settings store, optionally seeded from a TOML file at
/// startup. Unlike [`super::ScanContext`]/[`super::DiffractionExperimentContext`]
/// this carries no domain behaviour -- it is a typed key/value map with
/// declared defaults.
#[derive(Debug, Clone, Default)]
pub struct QSettings {
    values: HashMap<String, ParamValue>,
}

impl QSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with the standard pydidas-equivalent defaults.
    pub fn with_defaults() -> Self {
        let mut s = Self::new();
        s.values
            .insert("global/mp_n_workers".into(), ParamValue::Int(4));
        s.values
            .insert("global/det_mask_val".into(), ParamValue::Float(0.0));
        s
    }

    /// Load settings from a TOML file, overlaying onto the current values
    /// (missing keys keep their existing/default value).
    pub fn load_from_file(&mut self, path: &Path) -> Result<(), ContextError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ContextError::UnknownSetting(format!("{}: {e}", path.display())))?;
        let parsed: toml::Value = text
            .parse()
            .map_err(|e: toml::de::Error| ContextError::UnknownSetting(e.to_string()))?;
        if let toml::Value::Table(table) = parsed {
            for (key, value) in table {
                let converted = match value {
                    toml::Value::Integer(v) => ParamValue::Int(v),
                    toml::Value::Float(v) => ParamValue::Float(v),
                    toml::Value::Boolean(v) => ParamValue::Bool(v),
                    toml::Value::String(v) => ParamValue::Text(v),
                    _ => continue,
                };
                self.values.insert(key, converted);
            }
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<&ParamValue, ContextError> {
        self.values
            .get(key)
            .ok_or_else(|| ContextError::UnknownSetting(key.to_string()))
    }

    pub fn set(&mut self, key: impl Into<String>, value: ParamValue) {
        self.values.insert(key.into(), value);
    }

    pub fn n_workers(&self) -> usize {
        self.values
            .get("global/mp_n_workers")
            .and_then(|v| v.as_i64())
            .map(|v| v.max(1) as usize)
            .unwrap_or(4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_include_worker_count() {
        let s = QSettings::with_defaults();
        assert_eq!(s.n_workers(), 4);
    }

    #[test]
    fn unknown_key_errors() {
        let s = QSettings::new();
        assert!(s.get("nonexistent").is_err());
    }

    #[test]
    fn load_from_file_overlays_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[global]\nmp_n_workers = 8\n").unwrap();
        // top-level keys only; nested tables aren't flattened here, so
        // store values at top level for this minimal store.
        std::fs::write(&path, "\"global/mp_n_workers\" = 8\n").unwrap();
        let mut s = QSettings::with_defaults();
        s.load_from_file(&path).unwrap();
        assert_eq!(s.n_workers(), 8);
    }
}
