//! One-file-per-key fact store
//!
//! Layout: `<root>/<exporter>/<artifact>_<arch>_<dist>.json` for packages and
//! `<root>/<exporter>/docker.json` for images. Writers never share a file, so
//! concurrent build jobs need no coordination beyond distinct keys.

use crate::fact::{ArtifactFact, FactKey, ROLLUP_FILE};
use mhub_errors::{Error, FactError, StorageError};
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;
use walkdir::WalkDir;

/// Facts read for one exporter, in stable file-name order
#[derive(Debug, Default)]
pub struct LoadedFacts {
    pub facts: Vec<ArtifactFact>,
    /// Files that could not be read as facts, with the reason
    pub skipped: Vec<(PathBuf, String)>,
}

/// Fact store rooted at a catalog directory
#[derive(Clone, Debug)]
pub struct FactStore {
    root: PathBuf,
}

impl FactStore {
    /// Create a new store instance
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn exporter_dir(&self, exporter: &str) -> PathBuf {
        self.root.join(exporter)
    }

    /// Where a fact with this key lives when no explicit path is given
    #[must_use]
    pub fn canonical_path(&self, key: &FactKey) -> PathBuf {
        self.exporter_dir(&key.exporter).join(key.file_name())
    }

    #[must_use]
    pub fn rollup_path(&self, exporter: &str) -> PathBuf {
        self.exporter_dir(exporter).join(ROLLUP_FILE)
    }

    /// Write a fact to `dest` (or its canonical path) atomically
    ///
    /// An existing file at the destination is only replaced if it holds a fact
    /// with the same key.
    ///
    /// # Errors
    ///
    /// Returns `FactError::KeyConflict` if the destination holds a different
    /// fact or something that is not a fact, and a storage error if the write
    /// or rename fails. Nothing is left at the destination on failure.
    pub async fn write(&self, fact: &ArtifactFact, dest: Option<&Path>) -> Result<PathBuf, Error> {
        let key = fact.key()?;
        let path = dest.map_or_else(|| self.canonical_path(&key), Path::to_path_buf);

        check_slot(&path, &key).await?;

        let json = fact.to_json()?;
        write_atomic(&path, json.as_bytes()).await?;

        tracing::info!(key = %key, path = %path.display(), status = %fact.status, "fact written");
        Ok(path)
    }

    /// Read every fact under one exporter's directory
    ///
    /// The rollup file is excluded. Files are visited in lexicographic order
    /// of their path relative to the exporter directory, so later files win
    /// key collisions deterministically. Unreadable files are reported in
    /// `skipped` and never abort the load.
    ///
    /// # Errors
    ///
    /// Returns an error only if the exporter directory exists but cannot be
    /// traversed at all.
    pub async fn load_exporter(&self, exporter: &str) -> Result<LoadedFacts, Error> {
        let dir = self.exporter_dir(exporter);
        if !fs::try_exists(&dir).await.unwrap_or(false) {
            tracing::debug!(exporter, path = %dir.display(), "no fact directory");
            return Ok(LoadedFacts::default());
        }

        let mut files = fact_files(&dir)?;
        files.sort_by(|a, b| a.0.cmp(&b.0));

        let mut loaded = LoadedFacts::default();
        for (_, path) in files {
            let content = match fs::read_to_string(&path).await {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "unreadable fact file");
                    loaded.skipped.push((path, e.to_string()));
                    continue;
                }
            };

            match ArtifactFact::from_json(&path.display().to_string(), &content) {
                Ok(fact) => loaded.facts.push(fact),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping malformed fact");
                    loaded.skipped.push((path, e.to_string()));
                }
            }
        }

        tracing::debug!(
            exporter,
            facts = loaded.facts.len(),
            skipped = loaded.skipped.len(),
            "loaded facts"
        );
        Ok(loaded)
    }

    /// Whether an exporter has at least one candidate fact file
    pub async fn has_facts(&self, exporter: &str) -> bool {
        let dir = self.exporter_dir(exporter);
        if !fs::try_exists(&dir).await.unwrap_or(false) {
            return false;
        }
        fact_files(&dir).is_ok_and(|files| !files.is_empty())
    }

    /// Names of every exporter directory under the root, sorted
    ///
    /// # Errors
    ///
    /// Returns an error if the root exists but cannot be listed.
    pub async fn exporters(&self) -> Result<Vec<String>, Error> {
        let mut names = Vec::new();
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(names),
            Err(e) => return Err(StorageError::from_io_with_path(&e, &self.root).into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}

/// Candidate fact files below `dir` as `(relative path, absolute path)`
fn fact_files(dir: &Path) -> Result<Vec<(String, PathBuf)>, Error> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(false) {
        let entry = entry.map_err(|e| StorageError::IoError {
            message: format!("{}: {e}", dir.display()),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        // dotfiles are in-flight temp writes
        if name == ROLLUP_FILE || name.starts_with('.') || !name.ends_with(".json") {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(dir)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .into_owned();
        files.push((relative, entry.path().to_path_buf()));
    }
    Ok(files)
}

/// Refuse to replace a file that belongs to another key
async fn check_slot(path: &Path, key: &FactKey) -> Result<(), Error> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(StorageError::from_io_with_path(&e, path).into()),
    };

    let existing = ArtifactFact::from_json(&path.display().to_string(), &content)
        .ok()
        .and_then(|fact| fact.key().ok());

    match existing {
        Some(existing) if existing == *key => Ok(()),
        Some(existing) => Err(FactError::KeyConflict {
            path: path.display().to_string(),
            existing: existing.to_string(),
            requested: key.to_string(),
        }
        .into()),
        None => Err(FactError::KeyConflict {
            path: path.display().to_string(),
            existing: "a file that is not a fact".to_string(),
            requested: key.to_string(),
        }
        .into()),
    }
}

/// Write through a hidden sibling temp file and rename into place
///
/// # Errors
///
/// Returns a storage error if the directory cannot be created, the temp file
/// cannot be written, or the rename fails.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), Error> {
    let parent = path.parent().ok_or_else(|| StorageError::InvalidPath {
        path: path.display().to_string(),
    })?;
    let file_name = path
        .file_name()
        .ok_or_else(|| StorageError::InvalidPath {
            path: path.display().to_string(),
        })?
        .to_string_lossy();

    if !parent.as_os_str().is_empty() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| StorageError::from_io_with_path(&e, parent))?;
    }

    let temp_path = parent.join(format!(".{file_name}.{}.tmp", Uuid::new_v4().simple()));
    fs::write(&temp_path, contents)
        .await
        .map_err(|e| StorageError::from_io_with_path(&e, &temp_path))?;

    if let Err(e) = fs::rename(&temp_path, path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(StorageError::AtomicRenameFailed {
            message: format!("{} -> {}: {e}", temp_path.display(), path.display()),
        }
        .into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fact::FACT_FORMAT_VERSION;
    use mhub_types::{ArtifactType, BuildStatus};
    use tempfile::tempdir;

    fn docker_fact(exporter: &str) -> ArtifactFact {
        ArtifactFact {
            format_version: FACT_FORMAT_VERSION.to_string(),
            artifact_type: ArtifactType::Docker,
            exporter: exporter.to_string(),
            version: "1.0.0".to_string(),
            arch: None,
            dist: None,
            build_date: Some("2024-01-01T00:00:00Z".to_string()),
            status: BuildStatus::Success,
            package: None,
            images: Some(Vec::new()),
            rpm_metadata: None,
            deb_metadata: None,
        }
    }

    #[tokio::test]
    async fn test_write_atomic_creates_parents_and_leaves_no_temp() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("file.json");
        write_atomic(&path, b"{}").await.unwrap();

        assert_eq!(fs::read(&path).await.unwrap(), b"{}");
        let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().starts_with('.'))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_exporters_sorted_and_missing_root_empty() {
        let dir = tempdir().unwrap();
        let store = FactStore::new(dir.path().join("catalog"));
        assert!(store.exporters().await.unwrap().is_empty());

        store.write(&docker_fact("zeta"), None).await.unwrap();
        store.write(&docker_fact("alpha"), None).await.unwrap();
        assert_eq!(store.exporters().await.unwrap(), vec!["alpha", "zeta"]);
        assert!(store.has_facts("alpha").await);
        assert!(!store.has_facts("missing").await);
    }
}
