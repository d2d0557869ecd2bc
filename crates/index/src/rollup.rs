//! Exporter rollup document
//!
//! The rollup is written as `metadata.json` next to an exporter's facts. Its
//! on-disk form is a tagged union keyed by `format_version`, so readers can
//! refuse documents written by an incompatible generation of the tool.

use mhub_errors::CatalogError;
use mhub_store::ImageRef;
use mhub_types::{AggregateStatus, ArtifactType, BuildStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `dist -> arch -> leaf`
pub type TargetMap = BTreeMap<String, BTreeMap<String, Leaf>>;

/// Aggregated view of one exporter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rollup {
    pub exporter: String,
    pub version: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub last_updated: Option<String>,
    pub artifacts: RollupArtifacts,
    pub status: StatusSummary,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollupArtifacts {
    #[serde(default)]
    pub rpm: TargetMap,
    #[serde(default)]
    pub deb: TargetMap,
    #[serde(default)]
    pub docker: DockerSummary,
}

/// One `(dist, arch)` build slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaf {
    pub status: BuildStatus,
    pub url: Option<String>,
    pub size_bytes: Option<u64>,
    pub sha256: Option<String>,
    pub build_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockerSummary {
    pub status: AggregateStatus,
    #[serde(default)]
    pub images: Vec<ImageRef>,
    pub build_date: Option<String>,
}

impl Default for DockerSummary {
    fn default() -> Self {
        Self {
            status: AggregateStatus::Na,
            images: Vec::new(),
            build_date: None,
        }
    }
}

/// Aggregate status per artifact type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSummary {
    pub rpm: AggregateStatus,
    pub deb: AggregateStatus,
    pub docker: AggregateStatus,
}

impl Default for StatusSummary {
    fn default() -> Self {
        Self {
            rpm: AggregateStatus::Na,
            deb: AggregateStatus::Na,
            docker: AggregateStatus::Na,
        }
    }
}

impl StatusSummary {
    #[must_use]
    pub fn get(&self, artifact_type: ArtifactType) -> AggregateStatus {
        match artifact_type {
            ArtifactType::Rpm => self.rpm,
            ArtifactType::Deb => self.deb,
            ArtifactType::Docker => self.docker,
        }
    }
}

impl Rollup {
    /// Leaves of one package type; docker has none
    #[must_use]
    pub fn targets(&self, artifact_type: ArtifactType) -> Option<&TargetMap> {
        match artifact_type {
            ArtifactType::Rpm => Some(&self.artifacts.rpm),
            ArtifactType::Deb => Some(&self.artifacts.deb),
            ArtifactType::Docker => None,
        }
    }

    /// Serialize as the current document version
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        RollupDocument::V3(self.clone()).to_json()
    }
}

/// Rollup as stored on disk, discriminated by `format_version`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "format_version")]
pub enum RollupDocument {
    #[serde(rename = "3.0")]
    V3(Rollup),
}

impl RollupDocument {
    /// Parse a stored rollup
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::UnsupportedFormat` when the tag is missing or
    /// names another version, and `CatalogError::InvalidDocument` when a
    /// known version fails to deserialize.
    pub fn from_json(content: &str) -> Result<Self, CatalogError> {
        let value: serde_json::Value =
            serde_json::from_str(content).map_err(|e| CatalogError::InvalidDocument {
                message: e.to_string(),
            })?;

        let tag = value
            .get("format_version")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("");
        if tag != mhub_store::FACT_FORMAT_VERSION {
            return Err(CatalogError::UnsupportedFormat {
                version: if tag.is_empty() {
                    "<missing>".to_string()
                } else {
                    tag.to_string()
                },
            });
        }

        serde_json::from_value(value).map_err(|e| CatalogError::InvalidDocument {
            message: e.to_string(),
        })
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    #[must_use]
    pub fn format_version(&self) -> &'static str {
        match self {
            Self::V3(_) => "3.0",
        }
    }

    #[must_use]
    pub fn into_rollup(self) -> Rollup {
        match self {
            Self::V3(rollup) => rollup,
        }
    }
}
