//! Artifact fact model
//!
//! A fact records the outcome of one build job. It is identified by
//! `(exporter, artifact_type, arch, dist)` for packages and by
//! `(exporter, artifact_type)` for docker images, and every key owns exactly
//! one file in the store.

use mhub_errors::FactError;
use mhub_types::{ArtifactType, BuildStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Format tag written into every fact and rollup
pub const FACT_FORMAT_VERSION: &str = "3.0";

/// Per-exporter rollup file; lives next to the facts but is never one
pub const ROLLUP_FILE: &str = "metadata.json";

/// One build job's outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactFact {
    pub format_version: String,
    pub artifact_type: ArtifactType,
    pub exporter: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dist: Option<String>,
    /// RFC 3339 UTC, second precision, `Z` suffix
    #[serde(default)]
    pub build_date: Option<String>,
    pub status: BuildStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<PackagePayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<ImageRef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpm_metadata: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deb_metadata: Option<BTreeMap<String, String>>,
}

/// Built package file as uploaded to the release host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackagePayload {
    pub filename: String,
    pub url: String,
    pub sha256: String,
    pub size_bytes: u64,
}

/// One pushed container image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub registry: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(default)]
    pub platforms: Vec<String>,
}

/// Identity of a fact; two facts with equal keys describe the same build slot
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FactKey {
    pub exporter: String,
    pub artifact_type: ArtifactType,
    /// `(arch, dist)` for rpm/deb, `None` for docker
    pub target: Option<(String, String)>,
}

impl FactKey {
    /// Canonical file name inside `<store>/<exporter>/`
    #[must_use]
    pub fn file_name(&self) -> String {
        match &self.target {
            Some((arch, dist)) => format!("{}_{arch}_{dist}.json", self.artifact_type),
            None => format!("{}.json", self.artifact_type),
        }
    }
}

impl fmt::Display for FactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            Some((arch, dist)) => write!(
                f,
                "{}/{}/{arch}/{dist}",
                self.exporter, self.artifact_type
            ),
            None => write!(f, "{}/{}", self.exporter, self.artifact_type),
        }
    }
}

impl ArtifactFact {
    /// Derive the key this fact occupies
    ///
    /// # Errors
    ///
    /// Returns `FactError::MissingFields` when a package fact lacks arch or
    /// dist, since it would have no slot to live in.
    pub fn key(&self) -> Result<FactKey, FactError> {
        let target = if self.artifact_type.is_package() {
            match (&self.arch, &self.dist) {
                (Some(arch), Some(dist)) => Some((arch.clone(), dist.clone())),
                (arch, dist) => {
                    let mut fields = Vec::new();
                    if arch.is_none() {
                        fields.push("arch".to_string());
                    }
                    if dist.is_none() {
                        fields.push("dist".to_string());
                    }
                    return Err(FactError::MissingFields {
                        artifact_type: self.artifact_type.to_string(),
                        fields,
                    });
                }
            }
        } else {
            None
        };

        Ok(FactKey {
            exporter: self.exporter.clone(),
            artifact_type: self.artifact_type,
            target,
        })
    }

    /// Parse a fact document, rejecting other format versions
    ///
    /// # Errors
    ///
    /// Returns `FactError::Malformed` if the JSON does not describe a fact and
    /// `FactError::UnsupportedFormat` for an unknown `format_version`.
    pub fn from_json(path: &str, content: &str) -> Result<Self, FactError> {
        let fact: Self = serde_json::from_str(content).map_err(|e| FactError::Malformed {
            path: path.to_string(),
            message: e.to_string(),
        })?;

        if fact.format_version != FACT_FORMAT_VERSION {
            return Err(FactError::UnsupportedFormat {
                version: fact.format_version,
            });
        }
        Ok(fact)
    }

    /// Pretty JSON as written to disk
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rpm_fact() -> ArtifactFact {
        ArtifactFact {
            format_version: FACT_FORMAT_VERSION.to_string(),
            artifact_type: ArtifactType::Rpm,
            exporter: "node_exporter".to_string(),
            version: "1.8.2".to_string(),
            arch: Some("amd64".to_string()),
            dist: Some("el9".to_string()),
            build_date: Some("2024-01-01T00:00:00Z".to_string()),
            status: BuildStatus::Success,
            package: Some(PackagePayload {
                filename: "node_exporter-1.8.2-1.el9.x86_64.rpm".to_string(),
                url: "https://example.com/node_exporter-1.8.2-1.el9.x86_64.rpm".to_string(),
                sha256: "ab".repeat(32),
                size_bytes: 4096,
            }),
            images: None,
            rpm_metadata: None,
            deb_metadata: None,
        }
    }

    #[test]
    fn test_key_and_file_name() {
        let key = rpm_fact().key().unwrap();
        assert_eq!(key.file_name(), "rpm_amd64_el9.json");
        assert_eq!(key.to_string(), "node_exporter/rpm/amd64/el9");

        let mut docker = rpm_fact();
        docker.artifact_type = ArtifactType::Docker;
        docker.arch = None;
        docker.dist = None;
        assert_eq!(docker.key().unwrap().file_name(), "docker.json");
    }

    #[test]
    fn test_package_fact_without_target_has_no_key() {
        let mut fact = rpm_fact();
        fact.dist = None;
        match fact.key().unwrap_err() {
            FactError::MissingFields { fields, .. } => assert_eq!(fields, vec!["dist"]),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_docker_omits_arch_and_dist() {
        let mut fact = rpm_fact();
        fact.artifact_type = ArtifactType::Docker;
        fact.arch = None;
        fact.dist = None;
        fact.package = None;
        let json = fact.to_json().unwrap();
        assert!(!json.contains("\"arch\""));
        assert!(!json.contains("\"dist\""));
        assert!(json.contains("\"build_date\""));
    }

    #[test]
    fn test_unknown_status_is_malformed() {
        let json = rpm_fact().to_json().unwrap().replace("\"success\"", "\"cancelled\"");
        assert!(matches!(
            ArtifactFact::from_json("x.json", &json),
            Err(FactError::Malformed { .. })
        ));
    }

    #[test]
    fn test_other_format_version_rejected() {
        let json = rpm_fact().to_json().unwrap().replace("\"3.0\"", "\"2.0\"");
        assert!(matches!(
            ArtifactFact::from_json("x.json", &json),
            Err(FactError::UnsupportedFormat { .. })
        ));
    }
}
