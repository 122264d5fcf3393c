//! Localized strings.
//!
//! The pipeline needs exactly one translated string (the "on World Anvil"
//! suffix of the source link), but the lookup goes through the [`Localize`]
//! trait so a host application can plug in its own translation layer.
//!
//! [`Catalog`] reads the same language files the host module ships:
//!
//! ```json
//! { "WA.OnWA": "on World Anvil" }
//! ```
//!
//! Nested objects are flattened with dots, so `{"WA": {"OnWA": "..."}}` is
//! equivalent. Unknown keys resolve to the key itself.

use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("language file must contain a JSON object")]
    NotAnObject,
}

/// Translation lookup.
pub trait Localize: Send + Sync {
    fn localize(&self, key: &str) -> String;
}

/// Built-in English strings.
const ENGLISH: &[(&str, &str)] = &[("WA.OnWA", "on World Anvil")];

/// Key → string table.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: HashMap<String, String>,
}

impl Catalog {
    /// The built-in English catalog.
    pub fn english() -> Self {
        Self::from_pairs(ENGLISH.iter().copied())
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Parse a language file. Keys it lacks fall back to English.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let value: Value = serde_json::from_str(json)?;
        let Value::Object(_) = value else {
            return Err(CatalogError::NotAnObject);
        };
        let mut catalog = Self::english();
        flatten_into(&mut catalog.entries, String::new(), &value);
        Ok(catalog)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Localize for Catalog {
    fn localize(&self, key: &str) -> String {
        self.entries
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}

fn flatten_into(entries: &mut HashMap<String, String>, prefix: String, value: &Value) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_into(entries, path, child);
            }
        }
        Value::String(s) => {
            entries.insert(prefix, s.clone());
        }
        // Numbers, bools and arrays have no place in a language file
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn english_has_source_link_suffix() {
        assert_eq!(Catalog::english().localize("WA.OnWA"), "on World Anvil");
    }

    #[test]
    fn unknown_key_resolves_to_itself() {
        assert_eq!(Catalog::english().localize("WA.Missing"), "WA.Missing");
    }

    #[test]
    fn flat_language_file() {
        let catalog = Catalog::from_json(r#"{"WA.OnWA": "sur World Anvil"}"#).unwrap();
        assert_eq!(catalog.localize("WA.OnWA"), "sur World Anvil");
    }

    #[test]
    fn nested_language_file_is_flattened() {
        let catalog =
            Catalog::from_json(r#"{"WA": {"OnWA": "auf World Anvil", "Other": "x"}}"#).unwrap();
        assert_eq!(catalog.localize("WA.OnWA"), "auf World Anvil");
        assert_eq!(catalog.localize("WA.Other"), "x");
    }

    #[test]
    fn missing_keys_fall_back_to_english() {
        let catalog = Catalog::from_json(r#"{"WA.Other": "x"}"#).unwrap();
        assert_eq!(catalog.localize("WA.OnWA"), "on World Anvil");
    }

    #[test]
    fn non_object_file_is_rejected() {
        let result = Catalog::from_json(r#"["WA.OnWA"]"#);
        assert!(matches!(result, Err(CatalogError::NotAnObject)));
    }

    #[test]
    fn load_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("fr.json");
        fs::write(&path, r#"{"WA.OnWA": "sur World Anvil"}"#).unwrap();
        let catalog = Catalog::load(&path).unwrap();
        assert_eq!(catalog.localize("WA.OnWA"), "sur World Anvil");
        assert!(!catalog.is_empty());
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let result = Catalog::load(&tmp.path().join("nope.json"));
        assert!(matches!(result, Err(CatalogError::Io(_))));
    }
}
