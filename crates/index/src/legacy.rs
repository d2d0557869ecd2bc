//! Legacy `catalog.json` shape
//!
//! Older portal templates and third-party consumers read a single flat
//! catalog. It is derived from the current rollup format and never read back.

use crate::rollup::{RollupDocument, TargetMap};
use mhub_types::{normalize_version, rpm_arch, AggregateStatus, BuildStatus, Manifest};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Readme text used when an exporter ships no README.md
pub const DEFAULT_README: &str = "No documentation available.";

pub const DEPRECATION_NOTE: &str =
    "This format is deprecated. Use /catalog/index.json for new integrations.";

/// `dist -> arch -> slot`
pub type Availability = BTreeMap<String, BTreeMap<String, AvailabilitySlot>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    pub status: BuildStatus,
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyEntry {
    pub name: String,
    pub version: String,
    pub category: String,
    pub description: String,
    pub readme: String,
    pub build_date: Option<String>,
    /// RPM availability, arch names in RPM spelling
    pub availability: Availability,
    pub deb_availability: Availability,
    pub rpm_status: AggregateStatus,
    pub deb_status: AggregateStatus,
    pub docker_status: AggregateStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyCatalog {
    pub exporters: Vec<LegacyEntry>,
    #[serde(rename = "_note")]
    pub note: String,
}

impl LegacyCatalog {
    #[must_use]
    pub fn new(mut exporters: Vec<LegacyEntry>) -> Self {
        exporters.sort_by(|a, b| a.name.cmp(&b.name));
        Self {
            exporters,
            note: DEPRECATION_NOTE.to_string(),
        }
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl RollupDocument {
    /// Convert to the legacy entry shape
    #[must_use]
    pub fn to_legacy(&self, readme: Option<&str>, arch_map: &BTreeMap<String, String>) -> LegacyEntry {
        match self {
            Self::V3(rollup) => LegacyEntry {
                name: rollup.exporter.clone(),
                version: rollup.version.clone(),
                category: rollup.category.clone(),
                description: rollup.description.clone(),
                readme: readme.unwrap_or(DEFAULT_README).to_string(),
                build_date: rollup.last_updated.clone(),
                availability: availability(&rollup.artifacts.rpm, Some(arch_map)),
                deb_availability: availability(&rollup.artifacts.deb, None),
                rpm_status: rollup.status.rpm,
                deb_status: rollup.status.deb,
                docker_status: rollup.status.docker,
            },
        }
    }
}

/// Entry for an exporter that has no rollup yet
#[must_use]
pub fn manifest_only(manifest: &Manifest, readme: Option<&str>) -> LegacyEntry {
    LegacyEntry {
        name: manifest.name.clone(),
        version: normalize_version(&manifest.version).to_string(),
        category: manifest.category.clone(),
        description: manifest.description.clone(),
        readme: readme.unwrap_or(DEFAULT_README).to_string(),
        build_date: None,
        availability: Availability::new(),
        deb_availability: Availability::new(),
        rpm_status: AggregateStatus::Na,
        deb_status: AggregateStatus::Na,
        docker_status: AggregateStatus::Na,
    }
}

fn availability(targets: &TargetMap, arch_map: Option<&BTreeMap<String, String>>) -> Availability {
    targets
        .iter()
        .map(|(dist, archs)| {
            let slots = archs
                .iter()
                .map(|(arch, leaf)| {
                    let arch = arch_map.map_or(arch.as_str(), |map| rpm_arch(map, arch));
                    (
                        arch.to_string(),
                        AvailabilitySlot {
                            status: leaf.status,
                            path: leaf.url.clone(),
                        },
                    )
                })
                .collect();
            (dist.clone(), slots)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rollup::{Leaf, Rollup, RollupArtifacts, StatusSummary};
    use mhub_types::default_arch_map;

    fn leaf(status: BuildStatus) -> Leaf {
        Leaf {
            status,
            url: Some("https://dl/pkg".to_string()),
            size_bytes: Some(1),
            sha256: None,
            build_date: None,
        }
    }

    #[test]
    fn test_rpm_arches_are_mapped_deb_arches_are_not() {
        let mut artifacts = RollupArtifacts::default();
        artifacts
            .rpm
            .entry("el9".to_string())
            .or_default()
            .insert("amd64".to_string(), leaf(BuildStatus::Success));
        artifacts
            .rpm
            .entry("el9".to_string())
            .or_default()
            .insert("riscv64".to_string(), leaf(BuildStatus::Failed));
        artifacts
            .deb
            .entry("debian-12".to_string())
            .or_default()
            .insert("arm64".to_string(), leaf(BuildStatus::Pending));

        let doc = RollupDocument::V3(Rollup {
            exporter: "node_exporter".to_string(),
            version: "1.8.2".to_string(),
            category: "System".to_string(),
            description: "Host metrics".to_string(),
            last_updated: Some("2024-01-02T00:00:00Z".to_string()),
            artifacts,
            status: StatusSummary {
                rpm: AggregateStatus::Success,
                deb: AggregateStatus::Pending,
                docker: AggregateStatus::Na,
            },
        });

        let entry = doc.to_legacy(Some("# Node"), &default_arch_map());
        assert!(entry.availability["el9"].contains_key("x86_64"));
        assert!(entry.availability["el9"].contains_key("riscv64"));
        assert!(entry.deb_availability["debian-12"].contains_key("arm64"));
        assert_eq!(
            entry.availability["el9"]["x86_64"].path.as_deref(),
            Some("https://dl/pkg")
        );
        assert_eq!(entry.build_date.as_deref(), Some("2024-01-02T00:00:00Z"));
        assert_eq!(entry.readme, "# Node");
        assert_eq!(entry.deb_status, AggregateStatus::Pending);
    }

    #[test]
    fn test_manifest_only_entry() {
        let manifest = Manifest::from_yaml(
            "name: redis_exporter\nversion: v1.62.0\nupstream:\n  type: github\n  repo: oliver006/redis_exporter\n",
        )
        .unwrap();
        let entry = manifest_only(&manifest, None);
        assert_eq!(entry.version, "1.62.0");
        assert_eq!(entry.readme, DEFAULT_README);
        assert_eq!(entry.rpm_status, AggregateStatus::Na);
        assert!(entry.availability.is_empty());
        assert!(entry.build_date.is_none());
    }

    #[test]
    fn test_catalog_note_key() {
        let json = LegacyCatalog::new(Vec::new()).to_json().unwrap();
        assert!(json.contains(r#""_note": "This format is deprecated."#));
    }
}
