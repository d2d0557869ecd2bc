use flate2::write::GzEncoder;
use flate2::Compression;
use mhub_errors::Error;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;

/// What a metadata writer did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum WriteOutcome {
    Written { files: Vec<PathBuf>, packages: usize },
    /// No packages; nothing was touched
    Skipped,
}

impl WriteOutcome {
    #[must_use]
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }
}

/// Gzip in memory; the header carries no timestamp so output is reproducible
pub(crate) fn gzip(data: &[u8]) -> Result<Vec<u8>, Error> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;

    #[test]
    fn test_gzip_is_stable() {
        let a = gzip(b"Package: x\n").unwrap();
        let b = gzip(b"Package: x\n").unwrap();
        assert_eq!(a, b);

        let mut out = String::new();
        GzDecoder::new(a.as_slice()).read_to_string(&mut out).unwrap();
        assert_eq!(out, "Package: x\n");
    }
}
