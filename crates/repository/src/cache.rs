//! Download and record cache
//!
//! Layout: `<cache>/<md5(url)>` holds the package file and
//! `<cache>/<md5(url)>.json` the parsed record. Release assets are immutable
//! once published, so entries never expire.

use crate::inspect::PackageInspector;
use crate::record::PackageRecord;
use mhub_errors::{Error, StorageError};
use mhub_hash::{cache_key, FileDigests};
use mhub_net::NetClient;
use mhub_store::write_atomic;
use mhub_types::ArtifactType;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;

pub struct PackageCache<I> {
    client: NetClient,
    dir: PathBuf,
    inspector: I,
}

impl<I: PackageInspector> PackageCache<I> {
    #[must_use]
    pub fn new(client: NetClient, dir: impl Into<PathBuf>, inspector: I) -> Self {
        Self {
            client,
            dir: dir.into(),
            inspector,
        }
    }

    #[must_use]
    pub fn package_path(&self, url: &str) -> PathBuf {
        self.dir.join(cache_key(url))
    }

    #[must_use]
    pub fn record_path(&self, url: &str) -> PathBuf {
        self.dir.join(format!("{}.json", cache_key(url)))
    }

    /// Local copy of the package at `url`, downloading it if needed
    ///
    /// # Errors
    ///
    /// Returns an error if the cache directory cannot be created or the
    /// download fails.
    pub async fn fetch(&self, url: &str) -> Result<PathBuf, Error> {
        let path = self.package_path(url);
        if fs::try_exists(&path).await.unwrap_or(false) {
            tracing::debug!(url, path = %path.display(), "using cached package");
            return Ok(path);
        }

        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| StorageError::from_io_with_path(&e, &self.dir))?;
        let size = self.client.download_to_file(url, &path).await?;
        tracing::info!(url, size, "downloaded package");
        Ok(path)
    }

    /// Raw header fields of the package at `url`
    ///
    /// # Errors
    ///
    /// Returns an error if the download or the inspection fails.
    pub async fn metadata(
        &self,
        url: &str,
        kind: ArtifactType,
    ) -> Result<BTreeMap<String, String>, Error> {
        let path = self.fetch(url).await?;
        self.inspector.inspect(&path, kind).await
    }

    /// Repository record for the package at `url`, cached after first use
    ///
    /// # Errors
    ///
    /// Returns an error if the package cannot be fetched, inspected or
    /// hashed, or if its header lacks identifying fields.
    pub async fn record(&self, url: &str, kind: ArtifactType) -> Result<PackageRecord, Error> {
        let record_path = self.record_path(url);
        if let Some(record) = read_cached(&record_path, kind).await {
            return Ok(record);
        }

        let path = self.fetch(url).await?;
        let fields = self.inspector.inspect(&path, kind).await?;
        let digests = FileDigests::from_file(&path).await?;
        let record = PackageRecord::from_fields(kind, &fields, url, &digests)?;

        let json = serde_json::to_string_pretty(&record)?;
        write_atomic(&record_path, json.as_bytes()).await?;
        Ok(record)
    }
}

async fn read_cached(path: &Path, kind: ArtifactType) -> Option<PackageRecord> {
    let content = fs::read_to_string(path).await.ok()?;
    match serde_json::from_str::<PackageRecord>(&content) {
        Ok(record) if record.kind == kind => Some(record),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "ignoring stale cache record");
            None
        }
    }
}
