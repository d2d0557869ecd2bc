//! Previously published state

use mhub_index::PublishedCatalog;
use mhub_net::{fetch_text, NetClient};

/// Fetch the published catalog, treating every failure as an empty catalog
///
/// Over-building is preferred to silently skipping a real update, so an
/// unreachable host, a non-200 answer or an unparseable body all make every
/// local exporter look new.
pub async fn fetch_published(client: &NetClient, url: &str) -> PublishedCatalog {
    tracing::info!(url, "fetching published catalog");

    let body = match fetch_text(client, url).await {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(url, error = %e, "published catalog unavailable, assuming empty state");
            return PublishedCatalog::default();
        }
    };

    match PublishedCatalog::from_json(&body) {
        Ok(catalog) => {
            tracing::debug!(url, exporters = catalog.len(), "published catalog loaded");
            catalog
        }
        Err(e) => {
            tracing::warn!(url, error = %e, "published catalog invalid, assuming empty state");
            PublishedCatalog::default()
        }
    }
}
