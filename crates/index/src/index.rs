//! Catalog index and published-catalog reader

use crate::legacy::LegacyEntry;
use mhub_errors::CatalogError;
use mhub_types::normalize_version;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Version tag written into `catalog/index.json`
pub const INDEX_FORMAT_VERSION: &str = "3.0";

/// Index versions this reader understands
pub const SUPPORTED_INDEX_VERSIONS: &[&str] = &["2.0", "3.0"];

/// Lightweight list of every exporter, sorted by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogIndex {
    pub version: String,
    pub exporters: Vec<IndexEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub name: String,
    pub version: String,
    pub category: String,
    pub last_updated: Option<String>,
}

impl From<&LegacyEntry> for IndexEntry {
    fn from(entry: &LegacyEntry) -> Self {
        Self {
            name: entry.name.clone(),
            version: entry.version.clone(),
            category: entry.category.clone(),
            last_updated: entry.build_date.clone(),
        }
    }
}

impl CatalogIndex {
    /// Build an index, sorting entries by name
    #[must_use]
    pub fn new(mut exporters: Vec<IndexEntry>) -> Self {
        exporters.sort_by(|a, b| a.name.cmp(&b.name));
        Self {
            version: INDEX_FORMAT_VERSION.to_string(),
            exporters,
        }
    }

    /// Parse and check the index version
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidDocument` for malformed JSON and
    /// `CatalogError::UnsupportedFormat` for an unknown version.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let index: Self = serde_json::from_str(json).map_err(|e| CatalogError::InvalidDocument {
            message: format!("invalid index JSON: {e}"),
        })?;
        if !SUPPORTED_INDEX_VERSIONS.contains(&index.version.as_str()) {
            return Err(CatalogError::UnsupportedFormat {
                version: index.version,
            });
        }
        Ok(index)
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&IndexEntry> {
        self.exporters.iter().find(|e| e.name == name)
    }
}

/// Name and version pairs of a previously published catalog
///
/// Accepts both the index shape and the legacy full catalog, since each
/// carries `exporters[].name` and `exporters[].version`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishedCatalog {
    versions: BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct PublishedShape {
    #[serde(default)]
    exporters: Vec<PublishedEntry>,
}

#[derive(Deserialize)]
struct PublishedEntry {
    name: String,
    version: serde_json::Value,
}

impl PublishedCatalog {
    /// Parse a published document
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidDocument` if the body is not JSON or an
    /// entry lacks a name or version.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let shape: PublishedShape =
            serde_json::from_str(json).map_err(|e| CatalogError::InvalidDocument {
                message: e.to_string(),
            })?;

        let versions = shape
            .exporters
            .into_iter()
            .map(|entry| {
                // YAML-sourced catalogs occasionally carry bare numbers
                let version = match entry.version {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                (entry.name, normalize_version(&version).to_string())
            })
            .collect();
        Ok(Self { versions })
    }

    #[must_use]
    pub fn from_versions(versions: BTreeMap<String, String>) -> Self {
        Self { versions }
    }

    /// Normalized published version of `name`
    #[must_use]
    pub fn version_of(&self, name: &str) -> Option<&str> {
        self.versions.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str) -> IndexEntry {
        IndexEntry {
            name: name.to_string(),
            version: "1.0.0".to_string(),
            category: "System".to_string(),
            last_updated: None,
        }
    }

    #[test]
    fn test_index_sorted_by_name() {
        let index = CatalogIndex::new(vec![entry("zeta"), entry("alpha"), entry("mid")]);
        let names: Vec<_> = index.exporters.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
        assert_eq!(index.version, INDEX_FORMAT_VERSION);
        assert!(index.get("mid").is_some());
    }

    #[test]
    fn test_index_version_checked() {
        let json = CatalogIndex::new(vec![entry("a")])
            .to_json()
            .unwrap()
            .replace("\"3.0\"", "\"9.0\"");
        assert!(matches!(
            CatalogIndex::from_json(&json),
            Err(CatalogError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_published_accepts_index_and_legacy_shapes() {
        let index = r#"{"version": "3.0", "exporters": [
            {"name": "node_exporter", "version": "1.8.2", "category": "System", "last_updated": null}
        ]}"#;
        let legacy = r#"{"_note": "deprecated", "exporters": [
            {"name": "node_exporter", "version": "v1.8.2", "rpm_status": "success"},
            {"name": "redis_exporter", "version": 1.5}
        ]}"#;

        let from_index = PublishedCatalog::from_json(index).unwrap();
        let from_legacy = PublishedCatalog::from_json(legacy).unwrap();
        assert_eq!(from_index.version_of("node_exporter"), Some("1.8.2"));
        assert_eq!(from_legacy.version_of("node_exporter"), Some("1.8.2"));
        assert_eq!(from_legacy.version_of("redis_exporter"), Some("1.5"));
        assert_eq!(from_legacy.len(), 2);
    }

    #[test]
    fn test_published_rejects_non_catalog() {
        assert!(PublishedCatalog::from_json("<html>").is_err());
        assert!(PublishedCatalog::from_json(r#"{"exporters": [{"version": "1"}]}"#).is_err());
        assert!(PublishedCatalog::from_json("{}").unwrap().is_empty());
    }
}
