//! Release history listing
//!
//! The repository scanner treats the release host as the source of truth for
//! "what packages exist". It only needs `(file name, download URL)` pairs, so
//! the collaborator is a small trait with a GitHub REST implementation. The
//! upstream watcher only needs the latest tag of each exporter's repository.

use crate::client::NetClient;
use crate::fetch_json;
use async_trait::async_trait;
use mhub_errors::Error;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

const PER_PAGE: u32 = 100;
const ACCEPT: (&str, &str) = ("Accept", "application/vnd.github+json");

/// One downloadable file attached to a release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

/// Anything that can enumerate every asset ever published
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    /// All assets across the full release history, newest release first
    async fn list_assets(&self) -> Result<Vec<ReleaseAsset>, Error>;
}

/// Anything that can name the newest release of an upstream repository
#[async_trait]
pub trait UpstreamReleases: Send + Sync {
    /// Tag of the latest release of `repo` (`owner/name`)
    async fn latest_tag(&self, repo: &str) -> Result<String, Error>;
}

/// GitHub REST API access shared by every repository lookup
#[derive(Clone)]
pub struct GitHubApi {
    client: NetClient,
    api_base: String,
    token: Option<String>,
}

impl GitHubApi {
    #[must_use]
    pub fn new(client: NetClient, api_base: &str, token: Option<String>) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Release listing for one repository
    #[must_use]
    pub fn releases(&self, repo: &str) -> GitHubReleases {
        GitHubReleases {
            api: self.clone(),
            repo: repo.to_string(),
        }
    }

    /// The release GitHub marks as latest (drafts and pre-releases excluded)
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the status is not 2xx (404 when
    /// the repository has no release), or the body is not a release.
    pub async fn latest_release(&self, repo: &str) -> Result<Release, Error> {
        self.get_json(&format!("{}/repos/{repo}/releases/latest", self.api_base))
            .await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, Error> {
        fetch_json(&self.client, url, self.token.as_deref(), &[ACCEPT]).await
    }
}

#[async_trait]
impl UpstreamReleases for GitHubApi {
    async fn latest_tag(&self, repo: &str) -> Result<String, Error> {
        let release = self.latest_release(repo).await?;
        tracing::debug!(repo, tag = %release.tag_name, "latest upstream release");
        Ok(release.tag_name)
    }
}

/// GitHub REST releases listing for one `owner/name` repository
pub struct GitHubReleases {
    api: GitHubApi,
    repo: String,
}

impl GitHubReleases {
    #[must_use]
    pub fn new(client: NetClient, api_base: &str, repo: &str, token: Option<String>) -> Self {
        GitHubApi::new(client, api_base, token).releases(repo)
    }

    /// Fetch every page of releases until an empty page comes back
    ///
    /// # Errors
    ///
    /// Returns an error if any page cannot be fetched or decoded.
    pub async fn list_releases(&self) -> Result<Vec<Release>, Error> {
        let mut releases = Vec::new();
        let mut page = 1u32;

        loop {
            let url = format!(
                "{}/repos/{}/releases?per_page={PER_PAGE}&page={page}",
                self.api.api_base, self.repo
            );
            let batch: Vec<Release> = self.api.get_json(&url).await?;

            tracing::debug!(page, count = batch.len(), repo = %self.repo, "fetched release page");
            if batch.is_empty() {
                break;
            }

            releases.extend(batch);
            page += 1;
        }

        Ok(releases)
    }
}

#[async_trait]
impl ReleaseSource for GitHubReleases {
    async fn list_assets(&self) -> Result<Vec<ReleaseAsset>, Error> {
        let releases = self.list_releases().await?;
        tracing::info!(releases = releases.len(), repo = %self.repo, "scanned release history");
        Ok(releases.into_iter().flat_map(|r| r.assets).collect())
    }
}
