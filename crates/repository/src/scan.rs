//! Cumulative scan: everything ever released plus the current build

use crate::cache::PackageCache;
use crate::dedup::deduplicate;
use crate::inspect::PackageInspector;
use crate::record::PackageRecord;
use crate::sources::{new_build_assets, AssetFilter};
use mhub_errors::Error;
use mhub_net::{ReleaseAsset, ReleaseSource};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;

/// Result of one repository scan
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanOutcome {
    /// Newest build of each `(name, arch)`, sorted
    pub packages: Vec<PackageRecord>,
    /// Matching assets found in release history
    pub from_history: usize,
    /// Matching assets from the current build not yet released
    pub from_new_builds: usize,
    /// Assets that could not be downloaded or inspected, with the reason
    pub failed: Vec<(String, String)>,
    /// Whether the release listing itself failed
    pub history_unavailable: bool,
}

impl ScanOutcome {
    /// Records read before deduplication
    #[must_use]
    pub fn inspected(&self) -> usize {
        (self.from_history + self.from_new_builds).saturating_sub(self.failed.len())
    }
}

/// Scan release history and new builds for one repository slice
///
/// A release listing failure is logged and the scan continues with the new
/// builds alone. Individual assets that fail are recorded in
/// [`ScanOutcome::failed`].
///
/// # Errors
///
/// Returns an error only if the new-builds directory cannot be traversed.
pub async fn scan<S, I>(
    source: &S,
    cache: &PackageCache<I>,
    filter: &AssetFilter,
    new_builds: Option<&Path>,
) -> Result<ScanOutcome, Error>
where
    S: ReleaseSource + ?Sized,
    I: PackageInspector,
{
    let mut outcome = ScanOutcome::default();

    let history = match source.list_assets().await {
        Ok(assets) => assets,
        Err(e) => {
            tracing::warn!(error = %e, "release listing failed, continuing with new builds only");
            outcome.history_unavailable = true;
            Vec::new()
        }
    };

    let mut assets: Vec<ReleaseAsset> = history
        .into_iter()
        .filter(|a| filter.matches(&a.name))
        .collect();
    outcome.from_history = assets.len();

    if let Some(dir) = new_builds {
        let mut names: HashSet<String> = assets.iter().map(|a| a.name.clone()).collect();
        let mut urls: HashSet<String> = assets
            .iter()
            .map(|a| a.browser_download_url.clone())
            .collect();
        let fresh: Vec<ReleaseAsset> = new_build_assets(dir)
            .await?
            .into_iter()
            .filter(|a| filter.matches(&a.name))
            .filter(|a| {
                let unseen = !names.contains(&a.name) && !urls.contains(&a.browser_download_url);
                names.insert(a.name.clone());
                urls.insert(a.browser_download_url.clone());
                unseen
            })
            .collect();
        outcome.from_new_builds = fresh.len();
        assets.extend(fresh);
    }

    tracing::info!(
        kind = %filter.kind,
        dist = %filter.dist,
        arch = %filter.arch,
        history = outcome.from_history,
        new_builds = outcome.from_new_builds,
        "matched assets"
    );

    let mut records = Vec::with_capacity(assets.len());
    for asset in assets {
        match cache.record(&asset.browser_download_url, filter.kind).await {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!(asset = %asset.name, error = %e, "skipping package");
                outcome.failed.push((asset.name, e.to_string()));
            }
        }
    }

    outcome.packages = deduplicate(records);
    Ok(outcome)
}
