#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Digests for package files and cache keys
//!
//! Repository metadata needs SHA-256 (YUM checksums, APT `SHA256`) and MD5
//! (APT `MD5sum`, cache keys derived from download URLs). Files are hashed in
//! a single streaming pass so large packages are never held in memory.

use md5::Md5;
use mhub_errors::{Error, StorageError};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

/// Size of chunks for streaming hash computation
const CHUNK_SIZE: usize = 64 * 1024; // 64KB

/// A raw digest value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Hash {
    bytes: Vec<u8>,
}

impl Hash {
    /// Convert to hex string
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// SHA-256 of a byte slice
    #[must_use]
    pub fn sha256(data: &[u8]) -> Self {
        Self {
            bytes: Sha256::digest(data).to_vec(),
        }
    }

    /// MD5 of a byte slice
    #[must_use]
    pub fn md5(data: &[u8]) -> Self {
        Self {
            bytes: Md5::digest(data).to_vec(),
        }
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Everything repository metadata needs to know about one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDigests {
    pub sha256: String,
    pub md5: String,
    pub size: u64,
}

impl FileDigests {
    /// Digest an in-memory buffer
    #[must_use]
    pub fn from_data(data: &[u8]) -> Self {
        Self {
            sha256: Hash::sha256(data).to_hex(),
            md5: Hash::md5(data).to_hex(),
            size: data.len() as u64,
        }
    }

    /// Digest a file in one streaming pass
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or read.
    pub async fn from_file(path: &Path) -> Result<Self, Error> {
        let file = File::open(path)
            .await
            .map_err(|e| StorageError::from_io_with_path(&e, path))?;
        Self::from_reader(file).await
    }

    /// Digest everything a reader yields
    ///
    /// # Errors
    /// Returns an error if reading fails.
    pub async fn from_reader<R>(mut reader: R) -> Result<Self, Error>
    where
        R: AsyncReadExt + Unpin,
    {
        let mut digests = DualHasher::default();
        let mut buffer = vec![0; CHUNK_SIZE];

        loop {
            let n = reader.read(&mut buffer).await?;
            if n == 0 {
                break;
            }
            digests.update(&buffer[..n]);
        }

        Ok(digests.finish())
    }
}

#[derive(Default)]
struct DualHasher {
    sha256: Sha256,
    md5: Md5,
    size: u64,
}

impl DualHasher {
    fn update(&mut self, chunk: &[u8]) {
        self.sha256.update(chunk);
        self.md5.update(chunk);
        self.size += chunk.len() as u64;
    }

    fn finish(self) -> FileDigests {
        FileDigests {
            sha256: hex::encode(self.sha256.finalize()),
            md5: hex::encode(self.md5.finalize()),
            size: self.size,
        }
    }
}

/// Stable cache key for a download URL: hex MD5 of the URL string
#[must_use]
pub fn cache_key(url: &str) -> String {
    Hash::md5(url.as_bytes()).to_hex()
}
