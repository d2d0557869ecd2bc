#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Artifact fact store for mhub
//!
//! This crate owns the per-build-job records ("facts") and the directory
//! tree they live in. Each build job writes exactly one file, keyed by
//! exporter, artifact type and target, so many jobs can run in parallel
//! without locks. Everything downstream (aggregation, publishing, scanning)
//! reads this tree.

mod fact;
mod generator;
mod store;

pub use fact::{ArtifactFact, FactKey, ImageRef, PackagePayload, FACT_FORMAT_VERSION, ROLLUP_FILE};
pub use generator::{
    attach_package_metadata, format_build_date, generate_fact, generate_fact_at, FactRequest,
};
pub use store::{write_atomic, FactStore, LoadedFacts};
