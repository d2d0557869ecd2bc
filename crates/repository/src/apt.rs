//! APT repository metadata

use crate::record::{PackageRecord, DEFAULT_MAINTAINER, DEFAULT_PRIORITY, DEFAULT_SECTION};
use crate::write::{gzip, WriteOutcome};
use chrono::{DateTime, Utc};
use mhub_errors::{Error, PackageError};
use mhub_hash::FileDigests;
use mhub_store::write_atomic;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::{Path, PathBuf};

pub const ORIGIN: &str = "Monitoring Hub";
pub const COMPONENT: &str = "main";

/// Debian codename for a distribution name such as `debian-12`
///
/// # Errors
///
/// Returns `PackageError::UnknownDistribution` if the map has no entry.
pub fn resolve_codename<'a>(
    codenames: &'a BTreeMap<String, String>,
    dist: &str,
) -> Result<&'a str, PackageError> {
    codenames
        .get(dist)
        .map(String::as_str)
        .ok_or_else(|| PackageError::UnknownDistribution {
            dist: dist.to_string(),
        })
}

/// Render a `Packages` index; entries are separated by a blank line
#[must_use]
pub fn packages_file(records: &[PackageRecord]) -> String {
    let mut out = String::new();
    for r in records {
        let control = |key: &str, default: &'static str| {
            r.control.get(key).map_or(default.to_string(), Clone::clone)
        };
        let _ = writeln!(out, "Package: {}", r.name);
        let _ = writeln!(out, "Version: {}", r.version);
        let _ = writeln!(out, "Architecture: {}", r.arch);
        let _ = writeln!(out, "Maintainer: {}", control("Maintainer", DEFAULT_MAINTAINER));
        let _ = writeln!(out, "Filename: {}", r.location);
        let _ = writeln!(out, "Size: {}", r.size);
        let _ = writeln!(out, "MD5sum: {}", r.md5);
        let _ = writeln!(out, "SHA256: {}", r.sha256);
        let _ = writeln!(out, "Section: {}", control("Section", DEFAULT_SECTION));
        let _ = writeln!(out, "Priority: {}", control("Priority", DEFAULT_PRIORITY));
        let _ = writeln!(out, "Description: {}", r.summary);
        out.push('\n');
    }
    out
}

/// Render the `Release` file for one codename and architecture
///
/// `indices` pairs each path relative to `dists/<codename>` with its digests.
#[must_use]
pub fn release_file(
    codename: &str,
    arch: &str,
    date: DateTime<Utc>,
    indices: &[(String, FileDigests)],
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Origin: {ORIGIN}");
    let _ = writeln!(out, "Label: {ORIGIN}");
    let _ = writeln!(out, "Suite: {codename}");
    let _ = writeln!(out, "Codename: {codename}");
    let _ = writeln!(out, "Date: {}", date.format("%a, %d %b %Y %H:%M:%S UTC"));
    let _ = writeln!(out, "Architectures: {arch}");
    let _ = writeln!(out, "Components: {COMPONENT}");
    let _ = writeln!(out, "Description: {ORIGIN} APT Repository");

    out.push_str("MD5Sum:\n");
    for (path, digests) in indices {
        let _ = writeln!(out, " {} {} {path}", digests.md5, digests.size);
    }
    out.push_str("SHA256:\n");
    for (path, digests) in indices {
        let _ = writeln!(out, " {} {} {path}", digests.sha256, digests.size);
    }
    out
}

/// `<out>/dists/<codename>`
#[must_use]
pub fn dist_dir(output_dir: &Path, codename: &str) -> PathBuf {
    output_dir.join("dists").join(codename)
}

/// Write APT metadata for one `(codename, arch)` slice
///
/// # Errors
///
/// Returns an error if compression or any file write fails.
pub async fn write_apt_repo(
    output_dir: &Path,
    codename: &str,
    arch: &str,
    records: &[PackageRecord],
) -> Result<WriteOutcome, Error> {
    if records.is_empty() {
        tracing::info!(codename, arch, "no packages, skipping APT metadata");
        return Ok(WriteOutcome::Skipped);
    }

    let dist = dist_dir(output_dir, codename);
    let binary_rel = format!("{COMPONENT}/binary-{arch}");
    let binary_dir = dist.join(&binary_rel);

    let plain = packages_file(records);
    let compressed = gzip(plain.as_bytes())?;

    let packages_path = binary_dir.join("Packages");
    write_atomic(&packages_path, plain.as_bytes()).await?;
    let gz_path = binary_dir.join("Packages.gz");
    write_atomic(&gz_path, &compressed).await?;

    let indices = vec![
        (
            format!("{binary_rel}/Packages"),
            FileDigests::from_data(plain.as_bytes()),
        ),
        (
            format!("{binary_rel}/Packages.gz"),
            FileDigests::from_data(&compressed),
        ),
    ];
    let release_path = dist.join("Release");
    let release = release_file(codename, arch, Utc::now(), &indices);
    write_atomic(&release_path, release.as_bytes()).await?;

    tracing::info!(
        codename,
        arch,
        packages = records.len(),
        path = %dist.display(),
        "wrote APT metadata"
    );
    Ok(WriteOutcome::Written {
        files: vec![packages_path, gz_path, release_path],
        packages: records.len(),
    })
}
