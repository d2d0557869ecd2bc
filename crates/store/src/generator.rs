//! Fact generation from build-job inputs
//!
//! Validation happens before anything touches the filesystem: a request that
//! is missing a field required by its artifact type produces no fact at all.

use crate::fact::{ArtifactFact, ImageRef, PackagePayload, FACT_FORMAT_VERSION};
use chrono::{DateTime, SecondsFormat, Utc};
use mhub_errors::FactError;
use mhub_types::{normalize_version, ArtifactType, BuildStatus};
use std::collections::BTreeMap;

/// Inputs of one build job, as received from the CLI
#[derive(Debug, Clone, Default)]
pub struct FactRequest {
    pub artifact_type: Option<ArtifactType>,
    pub exporter: String,
    pub version: String,
    pub status: BuildStatus,
    pub arch: Option<String>,
    pub dist: Option<String>,
    pub filename: Option<String>,
    pub url: Option<String>,
    pub sha256: Option<String>,
    pub size: Option<u64>,
    /// Raw JSON array of image descriptors
    pub docker_images: Option<String>,
}

/// Format a timestamp the way facts store it: `2024-01-02T03:04:05Z`
#[must_use]
pub fn format_build_date(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Build a fact stamped with the current time
///
/// # Errors
///
/// See [`generate_fact_at`].
pub fn generate_fact(request: &FactRequest) -> Result<ArtifactFact, FactError> {
    generate_fact_at(request, Utc::now())
}

/// Build a fact stamped with `at`
///
/// # Errors
///
/// Returns `FactError::MissingFields` if a field required by the artifact
/// type is absent or empty, `FactError::InvalidKey` if the exporter, arch or
/// dist cannot name a fact file unambiguously, and `FactError::InvalidImages`
/// if the docker image list does not parse.
pub fn generate_fact_at(
    request: &FactRequest,
    at: DateTime<Utc>,
) -> Result<ArtifactFact, FactError> {
    let artifact_type = request
        .artifact_type
        .ok_or_else(|| missing("artifact", &["type"]))?;

    let mut absent = Vec::new();
    if request.exporter.trim().is_empty() {
        absent.push("exporter");
    } else {
        check_key("exporter", &request.exporter, true)?;
    }
    if request.version.trim().is_empty() {
        absent.push("version");
    }

    let mut fact = ArtifactFact {
        format_version: FACT_FORMAT_VERSION.to_string(),
        artifact_type,
        exporter: request.exporter.clone(),
        version: normalize_version(&request.version).to_string(),
        arch: None,
        dist: None,
        build_date: Some(format_build_date(at)),
        status: request.status,
        package: None,
        images: None,
        rpm_metadata: None,
        deb_metadata: None,
    };

    if artifact_type.is_package() {
        let arch = present(request.arch.as_deref(), "arch", &mut absent);
        let dist = present(request.dist.as_deref(), "dist", &mut absent);
        let filename = present(request.filename.as_deref(), "filename", &mut absent);
        let url = present(request.url.as_deref(), "url", &mut absent);
        let sha256 = present(request.sha256.as_deref(), "sha256", &mut absent);
        if request.size.is_none() {
            absent.push("size");
        }

        if !absent.is_empty() {
            return Err(missing(artifact_type.as_str(), &absent));
        }
        if let (Some(arch), Some(dist)) = (&arch, &dist) {
            check_key("arch", arch, true)?;
            // the file name is `<type>_<arch>_<dist>.json`; dist is the last segment
            check_key("dist", dist, false)?;
        }

        fact.arch = arch;
        fact.dist = dist;
        fact.package = Some(PackagePayload {
            filename: filename.unwrap_or_default(),
            url: url.unwrap_or_default(),
            sha256: sha256.unwrap_or_default(),
            size_bytes: request.size.unwrap_or_default(),
        });
    } else {
        let images = match request.docker_images.as_deref().map(str::trim) {
            None | Some("") => {
                absent.push("docker_images");
                Vec::new()
            }
            Some(raw) => parse_images(raw)?,
        };
        if images.is_empty() && !absent.contains(&"docker_images") {
            absent.push("docker_images");
        }
        if !absent.is_empty() {
            return Err(missing(artifact_type.as_str(), &absent));
        }
        fact.images = Some(images);
    }

    Ok(fact)
}

/// Attach metadata read from the package file itself
pub fn attach_package_metadata(fact: &mut ArtifactFact, metadata: BTreeMap<String, String>) {
    match fact.artifact_type {
        ArtifactType::Rpm => fact.rpm_metadata = Some(metadata),
        ArtifactType::Deb => fact.deb_metadata = Some(metadata),
        ArtifactType::Docker => {}
    }
}

fn parse_images(raw: &str) -> Result<Vec<ImageRef>, FactError> {
    let images: Vec<ImageRef> =
        serde_json::from_str(raw).map_err(|e| FactError::InvalidImages {
            message: e.to_string(),
        })?;

    if let Some(bad) = images
        .iter()
        .find(|i| i.registry.trim().is_empty() || i.tag.trim().is_empty())
    {
        return Err(FactError::InvalidImages {
            message: format!("image entry needs registry and tag: {bad:?}"),
        });
    }
    Ok(images)
}

/// A key component must stay one path segment inside the exporter directory
fn check_key(field: &str, value: &str, allow_underscore: bool) -> Result<(), FactError> {
    let invalid = |reason: &str| FactError::InvalidKey {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    };

    if value.contains(['/', '\\']) {
        return Err(invalid("contains a path separator"));
    }
    if value.contains("..") || value == "." {
        return Err(invalid("contains a relative path component"));
    }
    if !allow_underscore && value.contains('_') {
        return Err(invalid("'_' separates the file name segments"));
    }
    Ok(())
}

fn present(
    value: Option<&str>,
    field: &'static str,
    absent: &mut Vec<&'static str>,
) -> Option<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Some(v.to_string()),
        _ => {
            absent.push(field);
            None
        }
    }
}

fn missing(artifact_type: &str, fields: &[&str]) -> FactError {
    FactError::MissingFields {
        artifact_type: artifact_type.to_string(),
        fields: fields.iter().map(ToString::to_string).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
    }

    fn rpm_request() -> FactRequest {
        FactRequest {
            artifact_type: Some(ArtifactType::Rpm),
            exporter: "node_exporter".to_string(),
            version: "v1.8.2".to_string(),
            arch: Some("amd64".to_string()),
            dist: Some("el9".to_string()),
            filename: Some("node_exporter-1.8.2-1.el9.x86_64.rpm".to_string()),
            url: Some("https://example.com/n.rpm".to_string()),
            sha256: Some("cd".repeat(32)),
            size: Some(1024),
            ..FactRequest::default()
        }
    }

    #[test]
    fn test_rpm_fact() {
        let fact = generate_fact_at(&rpm_request(), at()).unwrap();
        assert_eq!(fact.build_date.as_deref(), Some("2024-01-02T03:04:05Z"));
        assert_eq!(fact.version, "1.8.2");
        assert_eq!(fact.status, BuildStatus::Success);
        assert_eq!(fact.package.unwrap().size_bytes, 1024);
        assert!(fact.images.is_none());
    }

    #[test]
    fn test_missing_fields_are_all_reported() {
        let request = FactRequest {
            sha256: None,
            size: None,
            dist: Some("  ".to_string()),
            ..rpm_request()
        };
        match generate_fact_at(&request, at()).unwrap_err() {
            FactError::MissingFields { artifact_type, fields } => {
                assert_eq!(artifact_type, "rpm");
                assert_eq!(fields, vec!["dist", "sha256", "size"]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_key_components_stay_in_exporter_dir() {
        let cases = [
            FactRequest {
                exporter: "../escape".to_string(),
                ..rpm_request()
            },
            FactRequest {
                arch: Some("amd64/../../x".to_string()),
                ..rpm_request()
            },
            FactRequest {
                dist: Some("..".to_string()),
                ..rpm_request()
            },
            // x86 + 64_el9 would share rpm_x86_64_el9.json with x86_64 + el9
            FactRequest {
                arch: Some("x86".to_string()),
                dist: Some("64_el9".to_string()),
                ..rpm_request()
            },
        ];
        for request in cases {
            assert!(
                matches!(
                    generate_fact_at(&request, at()),
                    Err(FactError::InvalidKey { .. })
                ),
                "{request:?}"
            );
        }

        let underscore_arch = FactRequest {
            arch: Some("x86_64".to_string()),
            ..rpm_request()
        };
        let fact = generate_fact_at(&underscore_arch, at()).unwrap();
        assert_eq!(fact.key().unwrap().file_name(), "rpm_x86_64_el9.json");
    }

    #[test]
    fn test_docker_requires_images() {
        let base = FactRequest {
            artifact_type: Some(ArtifactType::Docker),
            exporter: "node_exporter".to_string(),
            version: "1.8.2".to_string(),
            ..FactRequest::default()
        };
        assert!(matches!(
            generate_fact_at(&base, at()),
            Err(FactError::MissingFields { .. })
        ));

        let empty = FactRequest {
            docker_images: Some("[]".to_string()),
            ..base.clone()
        };
        assert!(matches!(
            generate_fact_at(&empty, at()),
            Err(FactError::MissingFields { .. })
        ));

        let garbage = FactRequest {
            docker_images: Some("{oops".to_string()),
            ..base.clone()
        };
        assert!(matches!(
            generate_fact_at(&garbage, at()),
            Err(FactError::InvalidImages { .. })
        ));

        let ok = FactRequest {
            docker_images: Some(
                r#"[{"registry":"ghcr.io","repository":"acme/node_exporter","tag":"1.8.2","platforms":["linux/amd64","linux/arm64"]}]"#
                    .to_string(),
            ),
            ..base
        };
        let fact = generate_fact_at(&ok, at()).unwrap();
        let images = fact.images.unwrap();
        assert_eq!(images[0].platforms.len(), 2);
        assert!(fact.arch.is_none());
    }

    #[test]
    fn test_image_without_tag_rejected() {
        let request = FactRequest {
            artifact_type: Some(ArtifactType::Docker),
            exporter: "x".to_string(),
            version: "1".to_string(),
            docker_images: Some(r#"[{"registry":"ghcr.io","tag":""}]"#.to_string()),
            ..FactRequest::default()
        };
        assert!(matches!(
            generate_fact_at(&request, at()),
            Err(FactError::InvalidImages { .. })
        ));
    }

    #[test]
    fn test_attach_metadata_by_type() {
        let mut fact = generate_fact_at(&rpm_request(), at()).unwrap();
        attach_package_metadata(
            &mut fact,
            BTreeMap::from([("license".to_string(), "Apache-2.0".to_string())]),
        );
        assert!(fact.rpm_metadata.is_some());
        assert!(fact.deb_metadata.is_none());
    }
}
