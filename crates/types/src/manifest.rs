#![allow(clippy::module_name_repetitions)]

//! Exporter manifest handling types
//!
//! This module defines the `manifest.yaml` format that declares one exporter:
//! where its binary comes from, how it is repackaged, and which artifact types
//! are built for which distributions.

use crate::version::normalize_version;
use mhub_errors::{Error, ManifestError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File name of the manifest inside `exporters/<name>/`
pub const MANIFEST_FILE: &str = "manifest.yaml";

/// Distributions RPM targets default to
pub const DEFAULT_RPM_TARGETS: &[&str] = &["el8", "el9", "el10"];

/// Base image used when a manifest enables docker without naming one
pub const DEFAULT_BASE_IMAGE: &str = "registry.access.redhat.com/ubi9/ubi-minimal";

/// Exporter manifest (manifest.yaml contents)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Declared version, possibly with a leading `v`
    pub version: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub upstream: UpstreamSpec,
    #[serde(default)]
    pub build: BuildSpec,
    #[serde(default)]
    pub artifacts: ArtifactsSpec,
}

fn default_category() -> String {
    "System".to_string()
}

/// Where the exporter binary is fetched from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpstreamKind {
    #[default]
    Github,
    Local,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpstreamSpec {
    #[serde(rename = "type", default)]
    pub kind: UpstreamKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    #[serde(default = "default_strategy")]
    pub strategy: String,
    /// Pattern like `{name}_{version}_linux_{arch}.tar.gz`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_binary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_archive: Option<String>,
}

fn default_strategy() -> String {
    "latest_release".to_string()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildMethod {
    #[default]
    BinaryRepack,
    SourceBuild,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildSpec {
    #[serde(default)]
    pub method: BuildMethod,
    #[serde(default)]
    pub binary_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_binaries: Vec<String>,
    #[serde(default = "default_archs")]
    pub archs: Vec<String>,
}

impl Default for BuildSpec {
    fn default() -> Self {
        Self {
            method: BuildMethod::default(),
            binary_name: String::new(),
            extra_binaries: Vec::new(),
            archs: default_archs(),
        }
    }
}

fn default_archs() -> Vec<String> {
    vec!["amd64".to_string(), "arm64".to_string()]
}

/// Which artifact types are built
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArtifactsSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpm: Option<PackageSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deb: Option<PackageSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker: Option<DockerSpec>,
}

/// RPM or DEB section: enabled flag plus target distributions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageSpec {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_targets")]
    pub targets: Vec<String>,
}

fn default_targets() -> Vec<String> {
    DEFAULT_RPM_TARGETS.iter().map(ToString::to_string).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DockerSpec {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_base_image")]
    pub base_image: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entrypoint: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cmd: Vec<String>,
}

fn default_base_image() -> String {
    DEFAULT_BASE_IMAGE.to_string()
}

impl Manifest {
    /// Load and validate a manifest from disk
    ///
    /// # Errors
    ///
    /// Returns `ManifestError::NotFound` if the file does not exist,
    /// `ManifestError::Parse` if it is not valid manifest YAML, and
    /// `ManifestError::MissingField` if the upstream section is incomplete.
    pub async fn load(path: &Path) -> Result<Self, Error> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::from(ManifestError::NotFound {
                    path: path.display().to_string(),
                })
            } else {
                Error::io_with_path(&e, path)
            }
        })?;

        let manifest = Self::from_yaml(&content).map_err(|e| match e {
            Error::Manifest(ManifestError::Parse { message, .. }) => ManifestError::Parse {
                path: path.display().to_string(),
                message,
            }
            .into(),
            Error::Manifest(ManifestError::MissingField { field, .. }) => {
                ManifestError::MissingField {
                    path: path.display().to_string(),
                    field,
                }
                .into()
            }
            other => other,
        })?;

        Ok(manifest)
    }

    /// Parse and validate a manifest from a YAML string
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed or the manifest is invalid.
    pub fn from_yaml(content: &str) -> Result<Self, Error> {
        let manifest: Self = serde_yml::from_str(content)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Check the cross-field rules serde cannot express
    ///
    /// # Errors
    ///
    /// Returns `ManifestError::MissingField` naming the first offending field.
    pub fn validate(&self) -> Result<(), Error> {
        let missing = |field: &str| -> Error {
            ManifestError::MissingField {
                path: String::new(),
                field: field.to_string(),
            }
            .into()
        };

        if self.name.trim().is_empty() {
            return Err(missing("name"));
        }
        if self.version.trim().is_empty() {
            return Err(missing("version"));
        }

        match self.upstream.kind {
            UpstreamKind::Github if self.upstream.repo.is_none() => {
                Err(missing("upstream.repo"))
            }
            UpstreamKind::Local => {
                match (&self.upstream.local_binary, &self.upstream.local_archive) {
                    (Some(_), None) | (None, Some(_)) => Ok(()),
                    _ => Err(missing("upstream.local_binary or upstream.local_archive")),
                }
            }
            UpstreamKind::Github => Ok(()),
        }
    }

    /// Version with one leading `v` stripped; the comparison key everywhere
    #[must_use]
    pub fn normalized_version(&self) -> &str {
        normalize_version(&self.version)
    }

    /// Whether the given artifact type is enabled
    #[must_use]
    pub fn is_enabled(&self, artifact: crate::ArtifactType) -> bool {
        match artifact {
            crate::ArtifactType::Rpm => self.artifacts.rpm.as_ref().is_some_and(|s| s.enabled),
            crate::ArtifactType::Deb => self.artifacts.deb.as_ref().is_some_and(|s| s.enabled),
            crate::ArtifactType::Docker => {
                self.artifacts.docker.as_ref().is_some_and(|s| s.enabled)
            }
        }
    }
}

/// Replace the top-level `version:` line of manifest YAML, keeping every
/// other line (comments and key order included) as written
///
/// Returns `None` if the document has no top-level `version` key.
#[must_use]
pub fn set_manifest_version(content: &str, version: &str) -> Option<String> {
    let mut replaced = false;
    let mut out = String::with_capacity(content.len() + version.len());

    for line in content.split_inclusive('\n') {
        if !replaced && line.starts_with("version:") {
            let ending = if line.ends_with("\r\n") {
                "\r\n"
            } else if line.ends_with('\n') {
                "\n"
            } else {
                ""
            };
            out.push_str("version: ");
            out.push_str(version);
            out.push_str(ending);
            replaced = true;
        } else {
            out.push_str(line);
        }
    }

    replaced.then_some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r"
name: node_exporter
version: v1.8.2
upstream:
  type: github
  repo: prometheus/node_exporter
build:
  method: binary_repack
  binary_name: node_exporter
artifacts:
  rpm:
    enabled: true
  docker:
    enabled: true
";

    #[test]
    fn test_defaults_applied() {
        let manifest = Manifest::from_yaml(MINIMAL).unwrap();
        assert_eq!(manifest.category, "System");
        assert_eq!(manifest.description, "");
        assert_eq!(manifest.upstream.strategy, "latest_release");
        assert_eq!(manifest.build.archs, vec!["amd64", "arm64"]);

        let rpm = manifest.artifacts.rpm.as_ref().unwrap();
        assert_eq!(rpm.targets, vec!["el8", "el9", "el10"]);
        assert_eq!(
            manifest.artifacts.docker.as_ref().unwrap().base_image,
            DEFAULT_BASE_IMAGE
        );
        assert!(manifest.artifacts.deb.is_none());
    }

    #[test]
    fn test_normalized_version() {
        let manifest = Manifest::from_yaml(MINIMAL).unwrap();
        assert_eq!(manifest.normalized_version(), "1.8.2");
    }

    #[test]
    fn test_enabled_artifacts() {
        let manifest = Manifest::from_yaml(MINIMAL).unwrap();
        assert!(manifest.is_enabled(crate::ArtifactType::Rpm));
        assert!(!manifest.is_enabled(crate::ArtifactType::Deb));
        assert!(manifest.is_enabled(crate::ArtifactType::Docker));
    }

    #[test]
    fn test_github_requires_repo() {
        let yaml = "name: x\nversion: 1.0.0\nupstream:\n  type: github\n";
        let err = Manifest::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("upstream.repo"));
    }

    #[test]
    fn test_local_requires_exactly_one_source() {
        let both = "name: x\nversion: 1.0.0\nupstream:\n  type: local\n  local_binary: a\n  local_archive: b\n";
        assert!(Manifest::from_yaml(both).is_err());

        let one = "name: x\nversion: 1.0.0\nupstream:\n  type: local\n  local_binary: bin/x\n";
        assert!(Manifest::from_yaml(one).is_ok());
    }

    #[test]
    fn test_missing_version_is_parse_error() {
        let err = Manifest::from_yaml("name: x\n").unwrap_err();
        assert!(matches!(err, Error::Manifest(ManifestError::Parse { .. })));
    }

    #[test]
    fn test_set_manifest_version_keeps_other_lines() {
        let content = "# node exporter\nname: node_exporter\nversion: v1.8.2 # pinned\nupstream:\n  type: github\n  repo: prometheus/node_exporter\n  version: nested\n";
        let updated = set_manifest_version(content, "v1.9.0").unwrap();
        assert_eq!(
            updated,
            "# node exporter\nname: node_exporter\nversion: v1.9.0\nupstream:\n  type: github\n  repo: prometheus/node_exporter\n  version: nested\n"
        );
        assert_eq!(Manifest::from_yaml(&updated).unwrap().version, "v1.9.0");

        assert!(set_manifest_version("name: x\n  version: 1\n", "2").is_none());
    }
}
