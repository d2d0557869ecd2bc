//! YUM repository metadata
//!
//! Only `primary.xml.gz` and `repomd.xml` are produced. That is enough for
//! dnf to resolve and install packages whose `location` points at the
//! release host.

use crate::record::PackageRecord;
use crate::write::{gzip, WriteOutcome};
use mhub_errors::Error;
use mhub_hash::FileDigests;
use mhub_store::write_atomic;
use std::fmt::Write;
use std::path::{Path, PathBuf};

pub const PACKAGER: &str = "Monitoring Hub";
pub const SITE_URL: &str = "https://sckyzo.github.io/monitoring-hub";

const COMMON_NS: &str = "http://linux.duke.edu/metadata/common";
const REPO_NS: &str = "http://linux.duke.edu/metadata/repo";
const RPM_NS: &str = "http://linux.duke.edu/metadata/rpm";
const PRIMARY_FILE: &str = "primary.xml.gz";

/// Escape text for use in XML content and attribute values
#[must_use]
pub fn escape_xml(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render `primary.xml` for the given records
#[must_use]
pub fn primary_xml(records: &[PackageRecord]) -> String {
    let mut xml = String::new();
    xml.push_str("<?xml version='1.0' encoding='utf-8'?>\n");
    let _ = writeln!(
        xml,
        "<metadata xmlns=\"{COMMON_NS}\" xmlns:rpm=\"{RPM_NS}\" packages=\"{}\">",
        records.len()
    );

    for r in records {
        let _ = write!(
            xml,
            concat!(
                "  <package type=\"rpm\">\n",
                "    <name>{name}</name>\n",
                "    <arch>{arch}</arch>\n",
                "    <version epoch=\"0\" ver=\"{ver}\" rel=\"{rel}\" />\n",
                "    <checksum type=\"sha256\" pkgid=\"YES\">{sha}</checksum>\n",
                "    <summary>{summary}</summary>\n",
                "    <packager>{packager}</packager>\n",
                "    <url>{site}</url>\n",
                "    <time file=\"0\" build=\"0\" />\n",
                "    <size package=\"{size}\" installed=\"0\" archive=\"0\" />\n",
                "    <location href=\"{href}\" />\n",
                "    <format>\n",
                "      <rpm:license>{license}</rpm:license>\n",
                "    </format>\n",
                "  </package>\n",
            ),
            name = escape_xml(&r.name),
            arch = escape_xml(&r.arch),
            ver = escape_xml(&r.version),
            rel = escape_xml(&r.release),
            sha = r.sha256,
            summary = escape_xml(&r.summary),
            packager = PACKAGER,
            site = SITE_URL,
            size = r.size,
            href = escape_xml(&r.location),
            license = escape_xml(&r.license),
        );
    }

    xml.push_str("</metadata>\n");
    xml
}

/// Render `repomd.xml` pointing at a primary file with the given digests
#[must_use]
pub fn repomd_xml(primary_gz: &FileDigests) -> String {
    format!(
        concat!(
            "<?xml version='1.0' encoding='utf-8'?>\n",
            "<repomd xmlns=\"{ns}\">\n",
            "  <data type=\"primary\">\n",
            "    <location href=\"repodata/{file}\" />\n",
            "    <checksum type=\"sha256\">{sha}</checksum>\n",
            "    <size>{size}</size>\n",
            "  </data>\n",
            "</repomd>\n",
        ),
        ns = REPO_NS,
        file = PRIMARY_FILE,
        sha = primary_gz.sha256,
        size = primary_gz.size,
    )
}

/// `<out>/<dist>/<arch>/repodata`
#[must_use]
pub fn repodata_dir(output_dir: &Path, dist: &str, arch: &str) -> PathBuf {
    output_dir.join(dist).join(arch).join("repodata")
}

/// Write YUM metadata for one `(dist, arch)` slice
///
/// # Errors
///
/// Returns an error if compression or any file write fails.
pub async fn write_yum_repo(
    output_dir: &Path,
    dist: &str,
    arch: &str,
    records: &[PackageRecord],
) -> Result<WriteOutcome, Error> {
    if records.is_empty() {
        tracing::info!(dist, arch, "no packages, skipping YUM metadata");
        return Ok(WriteOutcome::Skipped);
    }

    let dir = repodata_dir(output_dir, dist, arch);
    let primary = gzip(primary_xml(records).as_bytes())?;
    let digests = FileDigests::from_data(&primary);

    let primary_path = dir.join(PRIMARY_FILE);
    write_atomic(&primary_path, &primary).await?;
    let repomd_path = dir.join("repomd.xml");
    write_atomic(&repomd_path, repomd_xml(&digests).as_bytes()).await?;

    tracing::info!(
        dist,
        arch,
        packages = records.len(),
        path = %dir.display(),
        "wrote YUM metadata"
    );
    Ok(WriteOutcome::Written {
        files: vec![primary_path, repomd_path],
        packages: records.len(),
    })
}
