//! Catalog publishing
//!
//! Walks every exporter manifest, refreshes its rollup from the fact store,
//! and writes the machine-readable catalog files consumed by the portal and
//! by the reconciler of the next build cycle.

use crate::aggregate::{aggregate_exporter, read_rollup, write_rollup};
use crate::index::{CatalogIndex, IndexEntry};
use crate::legacy::{manifest_only, LegacyCatalog, LegacyEntry};
use crate::rollup::{Rollup, RollupDocument};
use mhub_errors::{CatalogError, Error, StorageError};
use mhub_store::{write_atomic, FactStore};
use mhub_types::{Manifest, MANIFEST_FILE};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Directory under the output dir holding the index and per-exporter copies
pub const CATALOG_SUBDIR: &str = "catalog";
pub const INDEX_FILE: &str = "index.json";
pub const LEGACY_CATALOG_FILE: &str = "catalog.json";

#[derive(Debug, Clone)]
pub struct PublishOptions {
    pub exporters_dir: PathBuf,
    pub catalog_dir: PathBuf,
    pub output_dir: PathBuf,
    pub arch_map: BTreeMap<String, String>,
}

/// What one publish pass did
#[derive(Debug, Default)]
pub struct PublishReport {
    /// Exporter names present in the written catalog, sorted
    pub published: Vec<String>,
    /// Exporters whose rollup was regenerated from facts
    pub aggregated: usize,
    /// Exporters listed from their manifest alone
    pub manifest_only: usize,
    /// Manifests that could not be processed, with the reason
    pub failed: Vec<(PathBuf, String)>,
    pub index_path: PathBuf,
    pub legacy_path: PathBuf,
}

struct Published {
    entry: LegacyEntry,
    rollup: Option<Rollup>,
    aggregated: bool,
}

/// Regenerate rollups and write `catalog/index.json`, `catalog/<name>.json`
/// and the legacy `catalog.json`
///
/// # Errors
///
/// Returns an error if the exporters directory cannot be listed or an output
/// file cannot be written. Per-exporter failures are reported, not returned.
pub async fn publish(options: &PublishOptions) -> Result<PublishReport, Error> {
    let store = FactStore::new(&options.catalog_dir);
    let manifests = manifest_paths(&options.exporters_dir).await?;
    tracing::info!(count = manifests.len(), dir = %options.exporters_dir.display(), "publishing catalog");

    let catalog_out = options.output_dir.join(CATALOG_SUBDIR);
    let mut report = PublishReport::default();
    let mut entries = Vec::new();

    for manifest_path in manifests {
        match publish_one(&store, &manifest_path, &options.arch_map).await {
            Ok(published) => {
                if let Some(rollup) = &published.rollup {
                    let copy = catalog_out.join(format!("{}.json", rollup.exporter));
                    write_atomic(&copy, rollup.to_json()?.as_bytes()).await?;
                }
                if published.aggregated {
                    report.aggregated += 1;
                } else if published.rollup.is_none() {
                    report.manifest_only += 1;
                }
                entries.push(published.entry);
            }
            Err(e) => {
                tracing::error!(path = %manifest_path.display(), error = %e, "exporter skipped");
                report.failed.push((manifest_path, e.to_string()));
            }
        }
    }

    let index = CatalogIndex::new(entries.iter().map(IndexEntry::from).collect());
    report.index_path = catalog_out.join(INDEX_FILE);
    write_atomic(&report.index_path, index.to_json()?.as_bytes()).await?;

    let legacy = LegacyCatalog::new(entries);
    report.legacy_path = options.output_dir.join(LEGACY_CATALOG_FILE);
    write_atomic(&report.legacy_path, legacy.to_json()?.as_bytes()).await?;

    report.published = legacy.exporters.iter().map(|e| e.name.clone()).collect();
    tracing::info!(
        published = report.published.len(),
        aggregated = report.aggregated,
        manifest_only = report.manifest_only,
        failed = report.failed.len(),
        "catalog published"
    );
    Ok(report)
}

async fn publish_one(
    store: &FactStore,
    manifest_path: &Path,
    arch_map: &BTreeMap<String, String>,
) -> Result<Published, Error> {
    let manifest = Manifest::load(manifest_path).await?;
    let readme = read_readme(manifest_path).await;

    let (rollup, aggregated) = if store.has_facts(&manifest.name).await {
        let outcome = aggregate_exporter(store, &manifest.name, Some(&manifest)).await?;
        write_rollup(store, &outcome.rollup, None).await?;
        (Some(outcome.rollup), true)
    } else {
        (stored_rollup(store, &manifest.name).await?, false)
    };

    let entry = match &rollup {
        Some(rollup) => {
            RollupDocument::V3(rollup.clone()).to_legacy(readme.as_deref(), arch_map)
        }
        None => manifest_only(&manifest, readme.as_deref()),
    };

    Ok(Published {
        entry,
        rollup,
        aggregated,
    })
}

/// A rollup left by an earlier run, if it is still in the current format
async fn stored_rollup(store: &FactStore, exporter: &str) -> Result<Option<Rollup>, Error> {
    let path = store.rollup_path(exporter);
    match read_rollup(&path).await {
        Ok(rollup) => Ok(rollup),
        Err(Error::Catalog(
            e @ (CatalogError::UnsupportedFormat { .. } | CatalogError::InvalidDocument { .. }),
        )) => {
            tracing::warn!(
                exporter,
                path = %path.display(),
                error = %e,
                "stored rollup unusable and no facts to rebuild it from"
            );
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

async fn read_readme(manifest_path: &Path) -> Option<String> {
    let path = manifest_path.parent()?.join("README.md");
    fs::read_to_string(path).await.ok()
}

/// `<dir>/*/manifest.yaml`, sorted by exporter directory name
async fn manifest_paths(dir: &Path) -> Result<Vec<PathBuf>, Error> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(StorageError::DirectoryNotFound {
                path: dir.to_path_buf(),
            }
            .into())
        }
        Err(e) => return Err(StorageError::from_io_with_path(&e, dir).into()),
    };

    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let manifest = entry.path().join(MANIFEST_FILE);
        if fs::try_exists(&manifest).await.unwrap_or(false) {
            paths.push(manifest);
        }
    }
    paths.sort();
    Ok(paths)
}
