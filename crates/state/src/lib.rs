#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Build-state reconciliation for mhub
//!
//! This crate compares the versions declared by local manifests with the
//! versions of the last published catalog and decides which exporters the
//! next build cycle has to rebuild. It also watches upstream repositories
//! for releases newer than what the manifests declare.

mod local;
mod output;
mod published;
mod reconcile;
mod watch;

pub use local::{LocalExporter, LocalState};
pub use output::{
    append_github_output, append_updated_names, github_output_lines, selection_json,
};
pub use published::fetch_published;
pub use reconcile::{reconcile, BuildPlan, Decision, Reason, ReconcileOptions};
pub use watch::{watch, WatchCheck, WatchOptions, WatchReport, WatchStatus};

use mhub_errors::Error;
use mhub_net::NetClient;
use std::path::Path;

/// Outcome of a full reconciliation pass
#[derive(Debug)]
pub struct ReconcileReport {
    pub plan: BuildPlan,
    /// Exporters listed by the published catalog
    pub published: usize,
    /// Manifests skipped because they did not load
    pub invalid: usize,
}

/// Load local manifests, fetch the published catalog and decide
///
/// # Errors
///
/// Returns an error only if the exporters directory cannot be listed; an
/// unreachable catalog and bad manifests are logged and absorbed.
pub async fn reconcile_from(
    client: &NetClient,
    exporters_dir: &Path,
    catalog_url: &str,
    options: &ReconcileOptions,
) -> Result<ReconcileReport, Error> {
    let published = fetch_published(client, catalog_url).await;
    let local = LocalState::load(exporters_dir).await?;
    let plan = reconcile(&local.versions, &published, options);

    tracing::info!(
        selected = plan.selected().len(),
        skipped = plan.skipped(),
        invalid = local.invalid.len(),
        "reconciliation done"
    );

    Ok(ReconcileReport {
        plan,
        published: published.len(),
        invalid: local.invalid.len(),
    })
}
