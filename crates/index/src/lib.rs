#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Exporter rollups and the published catalog for mhub
//!
//! This crate turns the per-job artifact facts of one exporter into a single
//! rollup document, and assembles every rollup into the catalog files the
//! portal and the next build cycle read: a lightweight index, per-exporter
//! copies, and the deprecated flat catalog.

mod aggregate;
mod index;
mod legacy;
mod publish;
mod rollup;

pub use aggregate::{
    aggregate, aggregate_exporter, last_updated, read_rollup, write_rollup, AggregateOutcome,
    DEFAULT_CATEGORY, UNKNOWN_VERSION,
};
pub use index::{
    CatalogIndex, IndexEntry, PublishedCatalog, INDEX_FORMAT_VERSION, SUPPORTED_INDEX_VERSIONS,
};
pub use legacy::{
    manifest_only, Availability, AvailabilitySlot, LegacyCatalog, LegacyEntry, DEFAULT_README,
    DEPRECATION_NOTE,
};
pub use publish::{
    publish, PublishOptions, PublishReport, CATALOG_SUBDIR, INDEX_FILE, LEGACY_CATALOG_FILE,
};
pub use rollup::{
    DockerSummary, Leaf, Rollup, RollupArtifacts, RollupDocument, StatusSummary, TargetMap,
};
