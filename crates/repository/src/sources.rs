//! Where package assets come from: release history and the current build

use mhub_errors::{Error, StorageError};
use mhub_net::ReleaseAsset;
use mhub_store::{ArtifactFact, ROLLUP_FILE};
use mhub_types::ArtifactType;
use serde::Deserialize;
use std::path::Path;
use walkdir::WalkDir;

/// Upload record written by the release job
pub const RELEASE_URLS_FILE: &str = "release_urls.json";

/// Which assets belong to one repository slice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetFilter {
    pub kind: ArtifactType,
    pub dist: String,
    /// Arch as spelled in file names (`x86_64` for rpm, `amd64` for deb)
    pub arch: String,
}

impl AssetFilter {
    #[must_use]
    pub fn rpm(dist: &str, arch: &str) -> Self {
        Self {
            kind: ArtifactType::Rpm,
            dist: dist.to_string(),
            arch: arch.to_string(),
        }
    }

    #[must_use]
    pub fn deb(dist: &str, arch: &str) -> Self {
        Self {
            kind: ArtifactType::Deb,
            dist: dist.to_string(),
            arch: arch.to_string(),
        }
    }

    /// Whether a file name follows this slice's naming convention
    #[must_use]
    pub fn matches(&self, filename: &str) -> bool {
        match self.kind {
            ArtifactType::Rpm => {
                filename.ends_with(".rpm")
                    && filename.contains(&format!(".{}.", self.dist))
                    && filename.contains(&self.arch)
            }
            ArtifactType::Deb => filename.ends_with(&format!("_{}.deb", self.arch)),
            ArtifactType::Docker => false,
        }
    }
}

#[derive(Deserialize)]
struct ReleaseUrls {
    #[serde(default)]
    assets: Vec<UploadedAsset>,
}

#[derive(Deserialize)]
struct UploadedAsset {
    file: String,
    url: String,
}

/// Assets produced by the current build, read from fact files and upload
/// records anywhere below `dir`
///
/// Files that are neither are ignored; a missing directory yields nothing.
///
/// # Errors
///
/// Returns an error if the directory exists but cannot be traversed.
pub async fn new_build_assets(dir: &Path) -> Result<Vec<ReleaseAsset>, Error> {
    if !dir.exists() {
        tracing::info!(dir = %dir.display(), "no new builds directory, using release history only");
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| StorageError::IoError {
            message: format!("{}: {e}", dir.display()),
        })?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type().is_file()
            && name.ends_with(".json")
            && name != ROLLUP_FILE
            && !name.starts_with('.')
        {
            files.push(entry.into_path());
        }
    }

    let mut assets = Vec::new();
    for path in files {
        let Ok(content) = tokio::fs::read_to_string(&path).await else {
            tracing::warn!(path = %path.display(), "unreadable new-build record");
            continue;
        };

        if path.file_name().is_some_and(|n| n == RELEASE_URLS_FILE) {
            match serde_json::from_str::<ReleaseUrls>(&content) {
                Ok(urls) => assets.extend(urls.assets.into_iter().map(|a| ReleaseAsset {
                    name: a.file,
                    browser_download_url: a.url,
                })),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "bad upload record"),
            }
            continue;
        }

        if let Ok(fact) = ArtifactFact::from_json(&path.display().to_string(), &content) {
            if let Some(package) = fact.package {
                assets.push(ReleaseAsset {
                    name: package.filename,
                    browser_download_url: package.url,
                });
            }
        }
    }

    tracing::debug!(dir = %dir.display(), assets = assets.len(), "new-build assets");
    Ok(assets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rpm_matching() {
        let filter = AssetFilter::rpm("el9", "x86_64");
        assert!(filter.matches("node_exporter-1.8.2-1.el9.x86_64.rpm"));
        assert!(!filter.matches("node_exporter-1.8.2-1.el8.x86_64.rpm"));
        assert!(!filter.matches("node_exporter-1.8.2-1.el9.aarch64.rpm"));
        assert!(!filter.matches("node_exporter-1.8.2-1.el9.x86_64.rpm.sha256"));
        // el10 must not match el1
        assert!(!AssetFilter::rpm("el1", "x86_64").matches("n-1-1.el10.x86_64.rpm"));
    }

    #[test]
    fn test_deb_matching() {
        let filter = AssetFilter::deb("debian-12", "arm64");
        assert!(filter.matches("node-exporter_1.8.2-1_arm64.deb"));
        assert!(!filter.matches("node-exporter_1.8.2-1_amd64.deb"));
        assert!(!filter.matches("node-exporter_1.8.2-1_arm64.deb.asc"));
    }

    #[tokio::test]
    async fn test_new_build_assets_from_both_record_kinds() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("artifacts-el9").join("node_exporter");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(
            nested.join(RELEASE_URLS_FILE),
            r#"{"assets": [{"file": "a-1-1.el9.x86_64.rpm", "url": "https://dl/a", "size": 3}]}"#,
        )
        .unwrap();
        std::fs::write(
            nested.join("rpm_amd64_el9.json"),
            r#"{"format_version": "3.0", "artifact_type": "rpm", "exporter": "b",
                "version": "2.0.0", "arch": "amd64", "dist": "el9",
                "build_date": "2024-01-01T00:00:00Z", "status": "success",
                "package": {"filename": "b-2.0.0-1.el9.x86_64.rpm", "url": "https://dl/b",
                            "sha256": "00", "size_bytes": 1}}"#,
        )
        .unwrap();
        std::fs::write(nested.join(ROLLUP_FILE), "{}").unwrap();
        std::fs::write(nested.join("notes.json"), "[1, 2]").unwrap();

        let assets = new_build_assets(dir.path()).await.unwrap();
        let names: Vec<_> = assets.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["a-1-1.el9.x86_64.rpm", "b-2.0.0-1.el9.x86_64.rpm"]);

        assert!(new_build_assets(&dir.path().join("missing"))
            .await
            .unwrap()
            .is_empty());
    }
}
