#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Cumulative package repository metadata for mhub
//!
//! Every run rebuilds YUM or APT metadata for one `(dist, arch)` slice from
//! the complete release history plus the packages of the current build, so
//! no package ever drops out of the repository. Package files are downloaded
//! once and their parsed records cached by URL.

mod apt;
mod cache;
mod dedup;
mod inspect;
mod record;
mod scan;
mod sources;
mod write;
mod yum;

pub use apt::{dist_dir, packages_file, release_file, resolve_codename, write_apt_repo};
pub use cache::PackageCache;
pub use dedup::deduplicate;
pub use inspect::{
    parse_control, parse_rpm_query, CommandInspector, PackageInspector, RPM_QUERY_FIELDS,
};
pub use record::{PackageRecord, DEFAULT_MAINTAINER, DEFAULT_PRIORITY, DEFAULT_SECTION};
pub use scan::{scan, ScanOutcome};
pub use sources::{new_build_assets, AssetFilter, RELEASE_URLS_FILE};
pub use write::WriteOutcome;
pub use yum::{escape_xml, primary_xml, repodata_dir, repomd_xml, write_yum_repo, PACKAGER, SITE_URL};
