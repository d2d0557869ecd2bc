//! Upstream release watching
//!
//! Compares the version each manifest declares with the latest release of its
//! upstream repository and, when asked, moves the manifest forward. Only
//! `github` upstreams have releases to watch; local sources are skipped.

use crate::local::{LocalExporter, LocalState};
use mhub_errors::{Error, ManifestError};
use mhub_net::UpstreamReleases;
use mhub_store::write_atomic;
use mhub_types::{set_manifest_version, PackageVersion, UpstreamKind};
use serde::Serialize;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct WatchOptions {
    /// Rewrite manifests that are behind their upstream
    pub update: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchStatus {
    UpToDate,
    UpdateAvailable,
    /// The manifest now declares the latest tag
    Updated,
    /// The latest release could not be fetched
    Unreachable,
    /// One side is not a version we can order
    Incomparable,
}

impl WatchStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UpToDate => "up to date",
            Self::UpdateAvailable => "update available",
            Self::Updated => "updated",
            Self::Unreachable => "unreachable",
            Self::Incomparable => "incomparable",
        }
    }
}

impl fmt::Display for WatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of checking one exporter
#[derive(Debug, Clone, Serialize)]
pub struct WatchCheck {
    pub name: String,
    pub repo: String,
    pub current: String,
    pub latest: Option<String>,
    pub status: WatchStatus,
}

#[derive(Debug, Default, Serialize)]
pub struct WatchReport {
    /// One entry per watched exporter, by name
    pub checks: Vec<WatchCheck>,
    /// Exporters without a GitHub upstream
    pub skipped: Vec<String>,
    /// Manifests that did not load
    pub invalid: usize,
}

impl WatchReport {
    /// Names whose manifest was rewritten, sorted
    #[must_use]
    pub fn updated(&self) -> Vec<String> {
        self.names_with(WatchStatus::Updated)
    }

    /// Names that are behind upstream but were left alone
    #[must_use]
    pub fn available(&self) -> Vec<String> {
        self.names_with(WatchStatus::UpdateAvailable)
    }

    fn names_with(&self, status: WatchStatus) -> Vec<String> {
        self.checks
            .iter()
            .filter(|c| c.status == status)
            .map(|c| c.name.clone())
            .collect()
    }
}

/// Check every manifest under `exporters_dir` against its upstream
///
/// A release lookup that fails marks that exporter unreachable and the watch
/// moves on.
///
/// # Errors
///
/// Returns an error if the exporters directory cannot be listed, or if an
/// update was requested and a manifest cannot be rewritten.
pub async fn watch<U>(
    source: &U,
    exporters_dir: &Path,
    options: &WatchOptions,
) -> Result<WatchReport, Error>
where
    U: UpstreamReleases + ?Sized,
{
    let local = LocalState::load(exporters_dir).await?;
    let mut report = WatchReport {
        invalid: local.invalid.len(),
        ..WatchReport::default()
    };

    for (name, exporter) in &local.exporters {
        let upstream = &exporter.manifest.upstream;
        let repo = match (upstream.kind, upstream.repo.as_deref()) {
            (UpstreamKind::Github, Some(repo)) => repo,
            _ => {
                tracing::debug!(exporter = %name, "no github upstream, skipping");
                report.skipped.push(name.clone());
                continue;
            }
        };

        let check = check_exporter(source, name, repo, exporter, options).await?;
        report.checks.push(check);
    }

    tracing::info!(
        checked = report.checks.len(),
        available = report.available().len(),
        updated = report.updated().len(),
        skipped = report.skipped.len(),
        "upstream watch done"
    );
    Ok(report)
}

async fn check_exporter<U>(
    source: &U,
    name: &str,
    repo: &str,
    exporter: &LocalExporter,
    options: &WatchOptions,
) -> Result<WatchCheck, Error>
where
    U: UpstreamReleases + ?Sized,
{
    let current = exporter.manifest.version.clone();
    let mut check = WatchCheck {
        name: name.to_string(),
        repo: repo.to_string(),
        current,
        latest: None,
        status: WatchStatus::Unreachable,
    };

    let latest = match source.latest_tag(repo).await {
        Ok(tag) => tag,
        Err(e) => {
            tracing::warn!(exporter = %name, repo, error = %e, "latest release lookup failed");
            return Ok(check);
        }
    };

    check.status = match is_newer(&latest, &check.current) {
        Some(true) if options.update => {
            update_manifest(&exporter.path, &latest).await?;
            tracing::info!(exporter = %name, from = %check.current, to = %latest, "manifest updated");
            WatchStatus::Updated
        }
        Some(true) => {
            tracing::info!(exporter = %name, current = %check.current, latest = %latest, "update available");
            WatchStatus::UpdateAvailable
        }
        Some(false) => WatchStatus::UpToDate,
        None => {
            tracing::warn!(exporter = %name, current = %check.current, latest = %latest, "versions cannot be compared");
            WatchStatus::Incomparable
        }
    };
    check.latest = Some(latest);
    Ok(check)
}

/// `Some(latest > current)`, or `None` if either side does not parse
fn is_newer(latest: &str, current: &str) -> Option<bool> {
    let latest = PackageVersion::parse(latest).ok()?;
    let current = PackageVersion::parse(current).ok()?;
    Some(latest > current)
}

/// Point the manifest at `tag`, leaving the rest of the file untouched
async fn update_manifest(path: &Path, tag: &str) -> Result<(), Error> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::io_with_path(&e, path))?;
    let updated = set_manifest_version(&content, tag).ok_or_else(|| ManifestError::MissingField {
        path: path.display().to_string(),
        field: "version".to_string(),
    })?;
    write_atomic(path, updated.as_bytes()).await
}
