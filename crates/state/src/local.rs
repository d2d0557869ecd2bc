//! Locally declared desired state

use mhub_errors::{Error, StorageError};
use mhub_types::{Manifest, MANIFEST_FILE};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;

/// A manifest that loaded, and where it was read from
#[derive(Debug, Clone)]
pub struct LocalExporter {
    pub path: PathBuf,
    pub manifest: Manifest,
}

/// Desired versions keyed by exporter directory name
#[derive(Debug, Default)]
pub struct LocalState {
    /// Normalized version per exporter
    pub versions: BTreeMap<String, String>,
    /// The loaded manifests, under the same keys as `versions`
    pub exporters: BTreeMap<String, LocalExporter>,
    /// Manifests that failed to load, with the reason
    pub invalid: Vec<(PathBuf, String)>,
}

impl LocalState {
    /// Read every `<dir>/*/manifest.yaml`
    ///
    /// A missing directory yields an empty state. A manifest that does not
    /// load is recorded in `invalid` and left out.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory exists but cannot be listed.
    pub async fn load(exporters_dir: &Path) -> Result<Self, Error> {
        let mut state = Self::default();
        let mut entries = match fs::read_dir(exporters_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(dir = %exporters_dir.display(), "exporters directory missing");
                return Ok(state);
            }
            Err(e) => return Err(StorageError::from_io_with_path(&e, exporters_dir).into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let manifest_path = entry.path().join(MANIFEST_FILE);
            if !fs::try_exists(&manifest_path).await.unwrap_or(false) {
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            match Manifest::load(&manifest_path).await {
                Ok(manifest) => {
                    state
                        .versions
                        .insert(name.clone(), manifest.normalized_version().to_string());
                    state.exporters.insert(
                        name,
                        LocalExporter {
                            path: manifest_path,
                            manifest,
                        },
                    );
                }
                Err(e) => {
                    tracing::error!(path = %manifest_path.display(), error = %e, "skipping manifest");
                    state.invalid.push((manifest_path, e.to_string()));
                }
            }
        }

        state.invalid.sort();
        tracing::debug!(
            exporters = state.versions.len(),
            invalid = state.invalid.len(),
            "local state loaded"
        );
        Ok(state)
    }
}
