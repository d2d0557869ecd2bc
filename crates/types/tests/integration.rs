//! Integration tests for types

#[cfg(test)]
mod tests {
    use mhub_errors::{Error, ManifestError};
    use mhub_types::*;
    use proptest::prelude::*;

    const MANIFEST: &str = r"
name: blackbox_exporter
description: Probe endpoints over HTTP, DNS, TCP and ICMP
version: v0.25.0
category: Network
upstream:
  type: github
  repo: prometheus/blackbox_exporter
build:
  method: binary_repack
  binary_name: blackbox_exporter
  archs: [amd64]
artifacts:
  rpm:
    enabled: true
    targets: [el9]
  deb:
    enabled: true
    targets: [ubuntu-24.04, debian-12]
";

    #[tokio::test]
    async fn test_manifest_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.yaml");
        tokio::fs::write(&path, MANIFEST).await.unwrap();

        let manifest = Manifest::load(&path).await.unwrap();
        assert_eq!(manifest.name, "blackbox_exporter");
        assert_eq!(manifest.category, "Network");
        assert_eq!(manifest.normalized_version(), "0.25.0");
        assert_eq!(manifest.build.archs, vec!["amd64"]);
        assert_eq!(
            manifest.artifacts.deb.as_ref().unwrap().targets,
            vec!["ubuntu-24.04", "debian-12"]
        );
        assert!(!manifest.is_enabled(ArtifactType::Docker));
    }

    #[tokio::test]
    async fn test_manifest_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Manifest::load(&dir.path().join("manifest.yaml"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Manifest(ManifestError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_manifest_parse_error_carries_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.yaml");
        tokio::fs::write(&path, "name: [unterminated").await.unwrap();

        match Manifest::load(&path).await.unwrap_err() {
            Error::Manifest(ManifestError::Parse { path: p, .. }) => {
                assert_eq!(p, path.display().to_string());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_artifact_type_roundtrip_names() {
        for artifact in ArtifactType::ALL {
            let parsed: ArtifactType = artifact.as_str().parse().unwrap();
            assert_eq!(parsed, artifact);
        }
        assert!("snap".parse::<ArtifactType>().is_err());
        assert_eq!(
            serde_json::to_string(&AggregateStatus::Na).unwrap(),
            "\"na\""
        );
    }

    #[test]
    fn test_dedup_ordering_example() {
        let a = PackageVersion::parse("1.0.0").unwrap();
        let b = PackageVersion::parse("1.2.0").unwrap();
        assert_eq!(std::cmp::max(a, b.clone()), b);
    }

    proptest! {
        #[test]
        fn normalization_strips_exactly_one_v(
            major in 0u64..100, minor in 0u64..100, patch in 0u64..100
        ) {
            let plain = format!("{major}.{minor}.{patch}");
            let prefixed = format!("v{plain}");
            prop_assert_eq!(normalize_version(&plain), plain.as_str());
            prop_assert_eq!(normalize_version(&prefixed), plain.as_str());
        }

        #[test]
        fn package_version_orders_like_semver(
            a in (0u64..50, 0u64..50, 0u64..50),
            b in (0u64..50, 0u64..50, 0u64..50),
        ) {
            let va = PackageVersion::parse(&format!("{}.{}.{}", a.0, a.1, a.2)).unwrap();
            let vb = PackageVersion::parse(&format!("v{}.{}.{}", b.0, b.1, b.2)).unwrap();
            prop_assert_eq!(va.cmp(&vb), a.cmp(&b));
        }

        #[test]
        fn success_leaf_always_dominates(
            others in proptest::collection::vec(
                prop_oneof![Just(BuildStatus::Failed), Just(BuildStatus::Pending)],
                0..8,
            ),
            position in 0usize..8,
        ) {
            let mut leaves = others;
            let at = position.min(leaves.len());
            leaves.insert(at, BuildStatus::Success);
            prop_assert_eq!(AggregateStatus::from_leaves(leaves), AggregateStatus::Success);
        }
    }
}
