#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Network operations for mhub
//!
//! This crate handles all HTTP operations: fetching the published catalog,
//! listing release history and downloading packages for inspection, with
//! bounded retry, exponential backoff and jitter.

mod client;
mod releases;
mod retry;

pub use client::{ensure_success, NetClient, NetConfig};
pub use releases::{
    GitHubApi, GitHubReleases, Release, ReleaseAsset, ReleaseSource, UpstreamReleases,
};
pub use retry::{calculate_backoff_delay, is_retryable_status, RetryConfig};

use mhub_errors::{Error, NetworkError};
use serde::de::DeserializeOwned;

/// Fetch text content from a URL
///
/// # Errors
///
/// Returns an error if the HTTP request fails, the server returns an error status,
/// or the response body cannot be decoded as text.
pub async fn fetch_text(client: &NetClient, url: &str) -> Result<String, Error> {
    tracing::debug!(url, "fetching text");

    let response = ensure_success(client.get(url).await?)?;

    response
        .text()
        .await
        .map_err(|e| NetworkError::DownloadFailed(e.to_string()).into())
}

/// Fetch and decode a JSON document, optionally authenticated
///
/// # Errors
///
/// Returns an error if the request fails, the status is not 2xx, or the body
/// does not decode into `T`.
pub async fn fetch_json<T>(
    client: &NetClient,
    url: &str,
    bearer_token: Option<&str>,
    headers: &[(&str, &str)],
) -> Result<T, Error>
where
    T: DeserializeOwned,
{
    let response = ensure_success(client.get_with(url, bearer_token, headers).await?)?;
    let body = response
        .text()
        .await
        .map_err(|e| NetworkError::DownloadFailed(e.to_string()))?;

    serde_json::from_str(&body).map_err(|e| {
        NetworkError::InvalidResponse {
            url: url.to_string(),
            message: e.to_string(),
        }
        .into()
    })
}
