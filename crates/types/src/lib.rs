#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for the mhub build catalog
//!
//! This crate provides the vocabulary shared by every other crate: artifact
//! types, build and aggregate statuses, version normalization, package
//! version ordering and the exporter manifest model.

pub mod manifest;
pub mod version;

// Re-export commonly used types
pub use manifest::{
    ArtifactsSpec, BuildMethod, BuildSpec, DockerSpec, Manifest, PackageSpec, UpstreamKind,
    UpstreamSpec, MANIFEST_FILE,
};
pub use manifest::set_manifest_version;
pub use semver::Version;
pub use version::{normalize_version, PackageVersion};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Kind of artifact a build job produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactType {
    Rpm,
    Deb,
    Docker,
}

impl ArtifactType {
    /// All artifact types in rollup order
    pub const ALL: [ArtifactType; 3] = [Self::Rpm, Self::Deb, Self::Docker];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rpm => "rpm",
            Self::Deb => "deb",
            Self::Docker => "docker",
        }
    }

    /// Whether facts of this type are keyed by (arch, dist)
    #[must_use]
    pub fn is_package(self) -> bool {
        matches!(self, Self::Rpm | Self::Deb)
    }
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rpm" => Ok(Self::Rpm),
            "deb" => Ok(Self::Deb),
            "docker" => Ok(Self::Docker),
            other => Err(format!("unknown artifact type: {other}")),
        }
    }
}

impl clap::ValueEnum for ArtifactType {
    fn value_variants<'a>() -> &'a [Self] {
        &Self::ALL
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(clap::builder::PossibleValue::new(self.as_str()))
    }
}

/// Outcome of a single build job, as recorded in a fact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildStatus {
    Success,
    Failed,
    Pending,
}

impl BuildStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Pending => "pending",
        }
    }
}

impl Default for BuildStatus {
    fn default() -> Self {
        Self::Success
    }
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl clap::ValueEnum for BuildStatus {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Success, Self::Failed, Self::Pending]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(clap::builder::PossibleValue::new(self.as_str()))
    }
}

/// Rolled-up status of one artifact type across all of its targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateStatus {
    Success,
    Pending,
    Failed,
    Na,
}

impl AggregateStatus {
    /// Fold leaf statuses: any success wins, then pending, then failed.
    pub fn from_leaves<I>(leaves: I) -> Self
    where
        I: IntoIterator<Item = BuildStatus>,
    {
        let (mut success, mut pending, mut failed) = (false, false, false);
        for status in leaves {
            match status {
                BuildStatus::Success => success = true,
                BuildStatus::Pending => pending = true,
                BuildStatus::Failed => failed = true,
            }
        }

        if success {
            Self::Success
        } else if pending {
            Self::Pending
        } else if failed {
            Self::Failed
        } else {
            Self::Na
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Pending => "pending",
            Self::Failed => "failed",
            Self::Na => "na",
        }
    }
}

impl From<BuildStatus> for AggregateStatus {
    fn from(status: BuildStatus) -> Self {
        match status {
            BuildStatus::Success => Self::Success,
            BuildStatus::Failed => Self::Failed,
            BuildStatus::Pending => Self::Pending,
        }
    }
}

impl fmt::Display for AggregateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Go-style architecture names mapped to their RPM spelling
#[must_use]
pub fn default_arch_map() -> BTreeMap<String, String> {
    [("amd64", "x86_64"), ("arm64", "aarch64")]
        .into_iter()
        .map(|(go, rpm)| (go.to_string(), rpm.to_string()))
        .collect()
}

/// Look up the RPM spelling of `arch`; unknown names pass through
#[must_use]
pub fn rpm_arch<'a>(arch_map: &'a BTreeMap<String, String>, arch: &'a str) -> &'a str {
    arch_map.get(arch).map_or(arch, String::as_str)
}

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Plain,
    Tty,
    Json,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Tty
    }
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    Always,
    Auto,
    Never,
}

// Implement clap::ValueEnum for ColorChoice
impl clap::ValueEnum for ColorChoice {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Always, Self::Auto, Self::Never]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Always => clap::builder::PossibleValue::new("always"),
            Self::Auto => clap::builder::PossibleValue::new("auto"),
            Self::Never => clap::builder::PossibleValue::new("never"),
        })
    }
}

impl Default for ColorChoice {
    fn default() -> Self {
        Self::Auto
    }
}
