//! Fact aggregation
//!
//! [`aggregate`] is a pure function of a fact list and an optional manifest.
//! Feeding it the same inputs always produces the same rollup, so rollups can
//! be regenerated on every portal build without coordination.

use crate::rollup::{DockerSummary, Leaf, Rollup, RollupArtifacts, StatusSummary, TargetMap};
use mhub_errors::Error;
use mhub_store::{write_atomic, ArtifactFact, FactStore};
use mhub_types::{AggregateStatus, ArtifactType, Manifest};
use std::path::{Path, PathBuf};

/// Version reported when no manifest is available
pub const UNKNOWN_VERSION: &str = "unknown";

/// Category reported when no manifest is available
pub const DEFAULT_CATEGORY: &str = "System";

/// Rollup plus what the store refused to read
#[derive(Debug)]
pub struct AggregateOutcome {
    pub rollup: Rollup,
    pub facts: usize,
    pub skipped: usize,
}

/// Merge one exporter's facts into a rollup
///
/// Facts are applied in the order given; when two package facts land on the
/// same `(dist, arch)` the later one wins. Docker uses the first docker fact.
#[must_use]
pub fn aggregate(exporter: &str, facts: &[ArtifactFact], manifest: Option<&Manifest>) -> Rollup {
    let mut rpm = TargetMap::new();
    let mut deb = TargetMap::new();
    let mut docker: Option<DockerSummary> = None;

    for fact in facts {
        match fact.artifact_type {
            ArtifactType::Rpm => insert_leaf(&mut rpm, fact),
            ArtifactType::Deb => insert_leaf(&mut deb, fact),
            ArtifactType::Docker => {
                if docker.is_none() {
                    docker = Some(DockerSummary {
                        status: fact.status.into(),
                        images: fact.images.clone().unwrap_or_default(),
                        build_date: fact.build_date.clone(),
                    });
                }
            }
        }
    }

    let docker = docker.unwrap_or_default();
    let status = StatusSummary {
        rpm: fold_status(&rpm),
        deb: fold_status(&deb),
        docker: docker.status,
    };

    let (version, category, description) = manifest.map_or_else(
        || {
            (
                UNKNOWN_VERSION.to_string(),
                DEFAULT_CATEGORY.to_string(),
                String::new(),
            )
        },
        |m| {
            (
                m.normalized_version().to_string(),
                m.category.clone(),
                m.description.clone(),
            )
        },
    );

    Rollup {
        exporter: exporter.to_string(),
        version,
        category,
        description,
        last_updated: last_updated(facts),
        artifacts: RollupArtifacts { rpm, deb, docker },
        status,
    }
}

/// Latest build date; ISO-8601 UTC strings order lexicographically
#[must_use]
pub fn last_updated(facts: &[ArtifactFact]) -> Option<String> {
    facts
        .iter()
        .filter_map(|f| f.build_date.as_deref())
        .filter(|d| !d.is_empty())
        .max()
        .map(ToString::to_string)
}

fn insert_leaf(map: &mut TargetMap, fact: &ArtifactFact) {
    let (Some(dist), Some(arch)) = (&fact.dist, &fact.arch) else {
        tracing::warn!(
            exporter = %fact.exporter,
            artifact = %fact.artifact_type,
            "package fact without arch/dist ignored"
        );
        return;
    };

    let package = fact.package.as_ref();
    map.entry(dist.clone()).or_default().insert(
        arch.clone(),
        Leaf {
            status: fact.status,
            url: package.map(|p| p.url.clone()),
            size_bytes: package.map(|p| p.size_bytes),
            sha256: package.map(|p| p.sha256.clone()),
            build_date: fact.build_date.clone(),
        },
    );
}

fn fold_status(map: &TargetMap) -> AggregateStatus {
    AggregateStatus::from_leaves(map.values().flat_map(|archs| archs.values().map(|l| l.status)))
}

/// Load an exporter's facts from the store and aggregate them
///
/// # Errors
///
/// Returns an error only if the exporter directory cannot be traversed;
/// individual unreadable facts are skipped and counted.
pub async fn aggregate_exporter(
    store: &FactStore,
    exporter: &str,
    manifest: Option<&Manifest>,
) -> Result<AggregateOutcome, Error> {
    let loaded = store.load_exporter(exporter).await?;
    let rollup = aggregate(exporter, &loaded.facts, manifest);

    tracing::info!(
        exporter,
        facts = loaded.facts.len(),
        skipped = loaded.skipped.len(),
        rpm = %rollup.status.rpm,
        deb = %rollup.status.deb,
        docker = %rollup.status.docker,
        "aggregated"
    );

    Ok(AggregateOutcome {
        facts: loaded.facts.len(),
        skipped: loaded.skipped.len(),
        rollup,
    })
}

/// Write a rollup to `dest`, or to the exporter's `metadata.json`
///
/// # Errors
///
/// Returns an error if serialization or the atomic write fails.
pub async fn write_rollup(
    store: &FactStore,
    rollup: &Rollup,
    dest: Option<&Path>,
) -> Result<PathBuf, Error> {
    let path = dest.map_or_else(|| store.rollup_path(&rollup.exporter), Path::to_path_buf);
    let json = rollup.to_json()?;
    write_atomic(&path, json.as_bytes()).await?;
    tracing::debug!(exporter = %rollup.exporter, path = %path.display(), "rollup written");
    Ok(path)
}

/// Read a stored rollup; `None` if the file does not exist
///
/// # Errors
///
/// Returns a `CatalogError` if the document is of an unknown format or
/// malformed, and an I/O error if it cannot be read.
pub async fn read_rollup(path: &Path) -> Result<Option<Rollup>, Error> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(Error::io_with_path(&e, path)),
    };
    let doc = crate::rollup::RollupDocument::from_json(&content)?;
    Ok(Some(doc.into_rollup()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mhub_store::{ImageRef, PackagePayload, FACT_FORMAT_VERSION};
    use mhub_types::BuildStatus;

    fn package(artifact_type: ArtifactType, arch: &str, dist: &str, status: BuildStatus) -> ArtifactFact {
        ArtifactFact {
            format_version: FACT_FORMAT_VERSION.to_string(),
            artifact_type,
            exporter: "node_exporter".to_string(),
            version: "1.8.2".to_string(),
            arch: Some(arch.to_string()),
            dist: Some(dist.to_string()),
            build_date: Some("2024-01-01T00:00:00Z".to_string()),
            status,
            package: Some(PackagePayload {
                filename: format!("pkg-{arch}-{dist}"),
                url: format!("https://dl/{arch}/{dist}"),
                sha256: "00".repeat(32),
                size_bytes: 10,
            }),
            images: None,
            rpm_metadata: None,
            deb_metadata: None,
        }
    }

    fn docker(status: BuildStatus, tag: &str) -> ArtifactFact {
        ArtifactFact {
            arch: None,
            dist: None,
            package: None,
            images: Some(vec![ImageRef {
                registry: "ghcr.io".to_string(),
                repository: None,
                tag: tag.to_string(),
                digest: None,
                platforms: vec!["linux/amd64".to_string()],
            }]),
            ..package(ArtifactType::Docker, "", "", status)
        }
    }

    #[test]
    fn test_later_fact_wins_collision() {
        let mut second = package(ArtifactType::Rpm, "amd64", "el9", BuildStatus::Failed);
        second.package.as_mut().unwrap().url = "https://dl/second".to_string();
        let facts = vec![
            package(ArtifactType::Rpm, "amd64", "el9", BuildStatus::Success),
            second,
        ];

        let rollup = aggregate("node_exporter", &facts, None);
        let leaf = &rollup.artifacts.rpm["el9"]["amd64"];
        assert_eq!(leaf.status, BuildStatus::Failed);
        assert_eq!(leaf.url.as_deref(), Some("https://dl/second"));
        assert_eq!(rollup.status.rpm, AggregateStatus::Failed);
    }

    #[test]
    fn test_first_docker_fact_is_used() {
        let facts = vec![
            docker(BuildStatus::Pending, "first"),
            docker(BuildStatus::Success, "second"),
        ];
        let rollup = aggregate("node_exporter", &facts, None);
        assert_eq!(rollup.status.docker, AggregateStatus::Pending);
        assert_eq!(rollup.artifacts.docker.images[0].tag, "first");
    }

    #[test]
    fn test_missing_manifest_uses_sentinels() {
        let rollup = aggregate("ghost", &[], None);
        assert_eq!(rollup.version, UNKNOWN_VERSION);
        assert_eq!(rollup.category, DEFAULT_CATEGORY);
        assert_eq!(rollup.status, StatusSummary::default());
        assert_eq!(rollup.artifacts.docker, DockerSummary::default());
        assert!(rollup.last_updated.is_none());
    }

    #[test]
    fn test_types_are_partitioned() {
        let facts = vec![
            package(ArtifactType::Deb, "amd64", "ubuntu-24.04", BuildStatus::Pending),
            package(ArtifactType::Rpm, "arm64", "el8", BuildStatus::Failed),
        ];
        let rollup = aggregate("node_exporter", &facts, None);
        assert_eq!(rollup.status.rpm, AggregateStatus::Failed);
        assert_eq!(rollup.status.deb, AggregateStatus::Pending);
        assert_eq!(rollup.status.docker, AggregateStatus::Na);
        assert!(rollup.artifacts.deb.contains_key("ubuntu-24.04"));
        assert!(!rollup.artifacts.rpm.contains_key("ubuntu-24.04"));
    }

    #[test]
    fn test_package_fact_without_target_is_ignored() {
        let mut fact = package(ArtifactType::Rpm, "amd64", "el9", BuildStatus::Success);
        fact.dist = None;
        let rollup = aggregate("node_exporter", &[fact], None);
        assert!(rollup.artifacts.rpm.is_empty());
        assert_eq!(rollup.status.rpm, AggregateStatus::Na);
        // the date still counts toward last_updated
        assert!(rollup.last_updated.is_some());
    }
}
