//! Integration tests for error types

#[cfg(test)]
mod tests {
    use mhub_errors::*;

    #[test]
    fn test_error_conversion() {
        let net_err = NetworkError::Timeout {
            url: "https://example.com".into(),
        };
        let err: Error = net_err.into();
        assert!(matches!(err, Error::Network(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_missing_fields_display() {
        let err = FactError::MissingFields {
            artifact_type: "rpm".into(),
            fields: vec!["arch".into(), "sha256".into()],
        };
        assert_eq!(
            err.to_string(),
            "missing required fields for rpm: arch, sha256"
        );
        assert_eq!(err.user_code(), Some("fact.missing_field"));
    }

    #[test]
    fn test_invalid_key_display() {
        let err = FactError::InvalidKey {
            field: "dist".into(),
            value: "64_el9".into(),
            reason: "'_' separates the file name segments".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid dist \"64_el9\": '_' separates the file name segments"
        );
        assert_eq!(err.user_code(), Some("fact.invalid_key"));
        assert!(err.user_hint().is_some());
    }

    #[test]
    fn test_fact_errors_are_not_retryable() {
        let err: Error = FactError::KeyConflict {
            path: "catalog/x/rpm_amd64_el9.json".into(),
            existing: "x/deb/amd64/debian-12".into(),
            requested: "x/rpm/amd64/el9".into(),
        }
        .into();
        assert!(!err.is_retryable());
        assert!(err.user_hint().is_some());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "test");
        let storage_err: StorageError = io_err.into();
        assert!(matches!(storage_err, StorageError::IoError { .. }));

        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let storage_err =
            StorageError::from_io_with_path(&io_err, std::path::Path::new("/tmp/catalog"));
        assert!(matches!(storage_err, StorageError::PathNotFound { .. }));
    }

    #[test]
    fn test_http_status_retryability() {
        let server_err = NetworkError::HttpError {
            status: 503,
            message: "unavailable".into(),
        };
        let not_found = NetworkError::HttpError {
            status: 404,
            message: "not found".into(),
        };
        assert!(server_err.is_retryable());
        assert!(!not_found.is_retryable());
    }
}
