//! Package records as listed in repository metadata

use mhub_errors::{PackageError, VersionError};
use mhub_hash::FileDigests;
use mhub_types::{ArtifactType, PackageVersion};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_MAINTAINER: &str = "Monitoring Hub <bot@monitoring-hub.local>";
pub const DEFAULT_SECTION: &str = "net";
pub const DEFAULT_PRIORITY: &str = "optional";

/// One package file and what its own header says about it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    pub kind: ArtifactType,
    pub name: String,
    pub version: String,
    /// RPM release; empty for DEB, whose revision is part of `version`
    #[serde(default)]
    pub release: String,
    pub arch: String,
    /// Size of the package file in bytes
    pub size: u64,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub license: String,
    /// Download URL; repositories point straight at the release host
    pub location: String,
    pub sha256: String,
    pub md5: String,
    /// DEB control fields that go into `Packages` verbatim
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub control: BTreeMap<String, String>,
}

impl PackageRecord {
    /// Build a record from inspector output
    ///
    /// RPM fields use the lowercase names of the query format, DEB fields
    /// use control-file names.
    ///
    /// # Errors
    ///
    /// Returns `PackageError::InvalidFormat` if an identifying field is
    /// missing.
    pub fn from_fields(
        kind: ArtifactType,
        fields: &BTreeMap<String, String>,
        location: &str,
        digests: &FileDigests,
    ) -> Result<Self, PackageError> {
        let get = |key: &str| fields.get(key).map(|v| v.trim().to_string());
        let require = |key: &str| {
            get(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| PackageError::InvalidFormat {
                    message: format!("{location}: missing {key}"),
                })
        };

        match kind {
            ArtifactType::Rpm => Ok(Self {
                kind,
                name: require("name")?,
                version: require("version")?,
                release: require("release")?,
                arch: require("arch")?,
                size: digests.size,
                summary: get("summary").unwrap_or_default(),
                license: get("license").unwrap_or_default(),
                location: location.to_string(),
                sha256: digests.sha256.clone(),
                md5: digests.md5.clone(),
                control: BTreeMap::new(),
            }),
            ArtifactType::Deb => {
                let mut control = BTreeMap::new();
                for (key, default) in [
                    ("Maintainer", DEFAULT_MAINTAINER),
                    ("Section", DEFAULT_SECTION),
                    ("Priority", DEFAULT_PRIORITY),
                ] {
                    control.insert(key.to_string(), get(key).unwrap_or_else(|| default.to_string()));
                }
                Ok(Self {
                    kind,
                    name: require("Package")?,
                    version: require("Version")?,
                    release: String::new(),
                    arch: require("Architecture")?,
                    size: digests.size,
                    summary: get("Description").unwrap_or_default(),
                    license: String::new(),
                    location: location.to_string(),
                    sha256: digests.sha256.clone(),
                    md5: digests.md5.clone(),
                    control,
                })
            }
            ArtifactType::Docker => Err(PackageError::InvalidFormat {
                message: format!("{location}: container images are not packages"),
            }),
        }
    }

    /// Ordering key used to keep the newest build of a package
    ///
    /// # Errors
    ///
    /// Returns `VersionError::InvalidVersion` if the version does not parse.
    pub fn version_key(&self) -> Result<PackageVersion, VersionError> {
        let mut key = PackageVersion::parse(&self.version)?;
        if key.revision == 0 {
            // rpm release `3.el9` orders by its leading number
            let digits: String = self
                .release
                .chars()
                .take_while(char::is_ascii_digit)
                .collect();
            key.revision = digits.parse().unwrap_or(0);
        }
        Ok(key)
    }

    /// `name-version[-release].arch` for log lines
    #[must_use]
    pub fn nevra(&self) -> String {
        if self.release.is_empty() {
            format!("{}-{}.{}", self.name, self.version, self.arch)
        } else {
            format!("{}-{}-{}.{}", self.name, self.version, self.release, self.arch)
        }
    }
}
