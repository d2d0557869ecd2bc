//! Version normalization and package version ordering
//!
//! Two different notions live here:
//! - `normalize_version` produces the comparison key used by the catalog and
//!   the reconciler. It is a plain string transform; no ordering is implied.
//! - `PackageVersion` orders package builds found in release history so the
//!   repository scanner can keep the newest one. It accepts the spellings
//!   that show up in RPM and DEB metadata:
//!   - `1.2.3`, `v1.2.3` - semantic version, optional leading `v`
//!   - `1.2` or `2` - missing components are treated as 0
//!   - `1:1.2.3` - a numeric epoch prefix is ignored
//!   - `1.2.3-4` - a purely numeric suffix is the package revision

use mhub_errors::VersionError;
use semver::Version;
use std::fmt;
use std::str::FromStr;

/// Strip one leading `v` from a version string.
///
/// `"v1.2.3"` and `"1.2.3"` both normalize to `"1.2.3"`.
#[must_use]
pub fn normalize_version(version: &str) -> &str {
    version.strip_prefix('v').unwrap_or(version)
}

/// A parsed package version: upstream semantic version plus package revision
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PackageVersion {
    pub version: Version,
    pub revision: u64,
}

impl PackageVersion {
    /// Parse a package version string leniently
    ///
    /// # Errors
    ///
    /// Returns `VersionError::InvalidVersion` if the upstream part is not a
    /// recognisable semantic version even after padding.
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let trimmed = input.trim();
        let invalid = || VersionError::InvalidVersion {
            input: input.to_string(),
        };

        let without_epoch = match trimmed.split_once(':') {
            Some((epoch, rest)) if !epoch.is_empty() && epoch.bytes().all(|b| b.is_ascii_digit()) => {
                rest
            }
            Some(_) => return Err(invalid()),
            None => trimmed,
        };

        let without_v = normalize_version(without_epoch);

        let (upstream, revision) = match without_v.rsplit_once('-') {
            Some((upstream, rev)) if !rev.is_empty() && rev.bytes().all(|b| b.is_ascii_digit()) => {
                (upstream, rev.parse::<u64>().map_err(|_| invalid())?)
            }
            _ => (without_v, 0),
        };

        let version = Version::parse(&pad_components(upstream)).map_err(|_| invalid())?;
        Ok(Self { version, revision })
    }
}

/// Pad `1` / `1.2` to `1.0.0` / `1.2.0`, leaving pre-release and build
/// suffixes untouched.
fn pad_components(upstream: &str) -> String {
    let split_at = upstream.find(['-', '+']).unwrap_or(upstream.len());
    let (core, suffix) = upstream.split_at(split_at);

    let parts: Vec<&str> = core.split('.').collect();
    let all_numeric = parts
        .iter()
        .all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()));

    if !all_numeric || parts.len() >= 3 {
        return upstream.to_string();
    }

    let mut padded = core.to_string();
    for _ in parts.len()..3 {
        padded.push_str(".0");
    }
    padded.push_str(suffix);
    padded
}

impl FromStr for PackageVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.revision == 0 {
            write!(f, "{}", self.version)
        } else {
            write!(f, "{}-{}", self.version, self.revision)
        }
    }
}
