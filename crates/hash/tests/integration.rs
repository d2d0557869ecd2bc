//! Integration tests for hash crate

#[cfg(test)]
mod tests {
    use mhub_hash::*;
    use tempfile::tempdir;
    use tokio::fs;

    #[tokio::test]
    async fn test_file_digests_of_package() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("node_exporter-1.8.2-1.el9.x86_64.rpm");

        let data = b"verify this content";
        fs::write(&file_path, data).await.unwrap();

        let digests = FileDigests::from_file(&file_path).await.unwrap();
        assert_eq!(digests.sha256, Hash::sha256(data).to_hex());
        assert_eq!(digests.md5, Hash::md5(data).to_hex());
        assert_eq!(digests.size, data.len() as u64);
        assert_ne!(digests.sha256, Hash::sha256(b"different content").to_hex());
    }

    #[tokio::test]
    async fn test_missing_file_is_storage_error() {
        let dir = tempdir().unwrap();
        let err = FileDigests::from_file(&dir.path().join("absent.deb"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            mhub_errors::Error::Storage(mhub_errors::StorageError::PathNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_reader_matches_file_digest() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("large.bin");
        let payload: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        fs::write(&target, &payload).await.unwrap();

        let streamed = FileDigests::from_reader(payload.as_slice()).await.unwrap();
        let on_disk = FileDigests::from_file(&target).await.unwrap();

        assert_eq!(streamed, on_disk);
        assert_eq!(on_disk.size, 200_000);
    }
}
