//! Reading metadata out of package files
//!
//! The system `rpm` and `dpkg-deb` tools are the authority on their own
//! formats; [`CommandInspector`] shells out to them. Tests substitute their
//! own [`PackageInspector`].

use async_trait::async_trait;
use mhub_errors::{Error, PackageError};
use mhub_types::ArtifactType;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;
use tokio::process::Command;

/// Fields requested from `rpm -qp`, in output order
pub const RPM_QUERY_FIELDS: &[&str] = &[
    "name", "version", "release", "arch", "size", "summary", "license",
];

const RPM_QUERY_FORMAT: &str =
    "%{NAME}|%{VERSION}|%{RELEASE}|%{ARCH}|%{SIZE}|%{SUMMARY}|%{LICENSE}";

static CONTROL_LINE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z0-9][A-Za-z0-9-]*):\s?(.*)$").ok());

/// Extracts header fields from a package file
#[async_trait]
pub trait PackageInspector: Send + Sync {
    /// # Errors
    ///
    /// Returns a `PackageError` if the file cannot be inspected.
    async fn inspect(
        &self,
        path: &Path,
        kind: ArtifactType,
    ) -> Result<BTreeMap<String, String>, Error>;
}

/// Inspector backed by the `rpm` and `dpkg-deb` binaries
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandInspector;

#[async_trait]
impl PackageInspector for CommandInspector {
    async fn inspect(
        &self,
        path: &Path,
        kind: ArtifactType,
    ) -> Result<BTreeMap<String, String>, Error> {
        match kind {
            ArtifactType::Rpm => {
                let out = run("rpm", &["-qp", "--queryformat", RPM_QUERY_FORMAT], path).await?;
                parse_rpm_query(&out).ok_or_else(|| {
                    PackageError::InspectFailed {
                        path: path.display().to_string(),
                        message: format!("unexpected rpm output: {}", out.trim()),
                    }
                    .into()
                })
            }
            ArtifactType::Deb => {
                let out = run("dpkg-deb", &["--field"], path).await?;
                Ok(parse_control(&out))
            }
            ArtifactType::Docker => Err(PackageError::InvalidFormat {
                message: "container images have no package header".to_string(),
            }
            .into()),
        }
    }
}

async fn run(tool: &str, args: &[&str], path: &Path) -> Result<String, Error> {
    tracing::debug!(tool, path = %path.display(), "inspecting package");
    let output = Command::new(tool)
        .args(args)
        .arg(path)
        .output()
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::from(PackageError::ToolUnavailable {
                    tool: tool.to_string(),
                })
            } else {
                Error::io_with_path(&e, path)
            }
        })?;

    if !output.status.success() {
        return Err(PackageError::InspectFailed {
            path: path.display().to_string(),
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
        .into());
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Split `rpm --queryformat` output into named fields
#[must_use]
pub fn parse_rpm_query(output: &str) -> Option<BTreeMap<String, String>> {
    let values: Vec<&str> = output
        .trim_end_matches('\n')
        .splitn(RPM_QUERY_FIELDS.len(), '|')
        .collect();
    if values.len() != RPM_QUERY_FIELDS.len() {
        return None;
    }
    Some(
        RPM_QUERY_FIELDS
            .iter()
            .zip(values)
            .map(|(k, v)| ((*k).to_string(), v.to_string()))
            .collect(),
    )
}

/// Parse a Debian control paragraph; continuation lines extend the previous field
#[must_use]
pub fn parse_control(output: &str) -> BTreeMap<String, String> {
    let mut fields: BTreeMap<String, String> = BTreeMap::new();
    let mut current: Option<String> = None;

    for line in output.lines() {
        if line.starts_with([' ', '\t']) {
            if let Some(value) = current.as_ref().and_then(|key| fields.get_mut(key)) {
                value.push('\n');
                value.push_str(line);
            }
            continue;
        }

        let captures = CONTROL_LINE.as_ref().and_then(|re| re.captures(line));
        if let Some(caps) = captures {
            let key = caps[1].to_string();
            fields.insert(key.clone(), caps[2].to_string());
            current = Some(key);
        } else {
            current = None;
        }
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rpm_query() {
        let fields =
            parse_rpm_query("node_exporter|1.8.2|1.el9|x86_64|20480|Host metrics|ASL 2.0\n")
                .unwrap();
        assert_eq!(fields["release"], "1.el9");
        assert_eq!(fields["size"], "20480");
        assert_eq!(fields["license"], "ASL 2.0");

        assert!(parse_rpm_query("too|few").is_none());
    }

    #[test]
    fn test_parse_control() {
        let fields = parse_control(
            "Package: node-exporter\nVersion: 1.8.2-1\nArchitecture: amd64\nDescription: Host metrics\n exporter for Prometheus\n",
        );
        assert_eq!(fields["Package"], "node-exporter");
        assert_eq!(fields["Architecture"], "amd64");
        assert_eq!(
            fields["Description"],
            "Host metrics\n exporter for Prometheus"
        );
    }
}
