//! HTTP client with connection pooling and retry logic

use crate::retry::{calculate_backoff_delay, is_retryable_error, is_retryable_status, RetryConfig};
use futures::StreamExt;
use mhub_errors::{Error, NetworkError};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

/// Network client configuration
#[derive(Debug, Clone)]
pub struct NetConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub pool_idle_timeout: Duration,
    pub pool_max_idle_per_host: usize,
    pub retry: RetryConfig,
    pub user_agent: String,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 10,
            retry: RetryConfig::default(),
            user_agent: format!("mhub/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl From<&mhub_config::NetworkConfig> for NetConfig {
    fn from(config: &mhub_config::NetworkConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.timeout),
            connect_timeout: Duration::from_secs(config.connect_timeout),
            retry: RetryConfig {
                max_retries: config.retries,
                initial_delay: Duration::from_millis(config.retry_delay_ms),
                max_delay: Duration::from_millis(config.max_delay_ms),
                backoff_multiplier: config.backoff_multiplier,
                jitter_factor: config.jitter_factor,
            },
            ..Self::default()
        }
    }
}

/// HTTP client wrapper with retry logic
#[derive(Clone)]
pub struct NetClient {
    client: Client,
    config: NetConfig,
}

impl NetClient {
    /// Create a new network client
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reqwest client fails to initialize.
    pub fn new(config: NetConfig) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| NetworkError::ConnectionRefused(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Execute a GET request with retries
    ///
    /// Transport failures, server errors and 429 are retried. Once retries
    /// run out a retryable status is handed back as the response so the
    /// caller decides what a non-success means for it.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails at the transport level after all
    /// retry attempts.
    pub async fn get(&self, url: &str) -> Result<Response, Error> {
        self.retry_request(url, || self.client.get(url)).await
    }

    /// GET with an optional bearer token and extra headers
    ///
    /// # Errors
    ///
    /// Same as [`NetClient::get`].
    pub async fn get_with(
        &self,
        url: &str,
        bearer_token: Option<&str>,
        headers: &[(&str, &str)],
    ) -> Result<Response, Error> {
        self.retry_request(url, || {
            let mut request = self.client.get(url);
            for (name, value) in headers {
                request = request.header(*name, *value);
            }
            if let Some(token) = bearer_token {
                request = request.bearer_auth(token);
            }
            request
        })
        .await
    }

    /// Stream a response body to `dest`, going through `dest.part` and a rename
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the server answers with a
    /// non-success status, or writing the file fails.
    pub async fn download_to_file(&self, url: &str, dest: &Path) -> Result<u64, Error> {
        let response = self.get(url).await?;
        let response = ensure_success(response)?;

        let part = dest.with_extension(match dest.extension() {
            Some(ext) => format!("{}.part", ext.to_string_lossy()),
            None => "part".to_string(),
        });

        let mut file = tokio::fs::File::create(&part)
            .await
            .map_err(|e| Error::io_with_path(&e, &part))?;
        let mut stream = response.bytes_stream();
        let mut downloaded = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| NetworkError::DownloadFailed(e.to_string()))?;
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;
        }
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&part, dest)
            .await
            .map_err(|e| Error::io_with_path(&e, dest))?;

        tracing::debug!(url, bytes = downloaded, path = %dest.display(), "download complete");
        Ok(downloaded)
    }

    /// Execute a request with retries
    async fn retry_request<F>(&self, url: &str, mut build: F) -> Result<Response, Error>
    where
        F: FnMut() -> RequestBuilder,
    {
        let retry = &self.config.retry;
        let mut last_error = None;

        for attempt in 0..=retry.max_retries {
            if attempt > 0 {
                let delay = calculate_backoff_delay(retry, attempt);
                tracing::debug!(url, attempt, delay_ms = delay.as_millis(), "retrying request");
                tokio::time::sleep(delay).await;
            }

            match build().send().await {
                Ok(response) => {
                    let status = response.status();
                    if is_retryable_status(status) && attempt < retry.max_retries {
                        tracing::warn!(url, attempt, status = status.as_u16(), "retryable status");
                        if let Some(seconds) = retry_after(&response) {
                            let wait = Duration::from_secs(seconds).min(retry.max_delay);
                            tokio::time::sleep(wait).await;
                        }
                        continue;
                    }
                    return Ok(response);
                }
                Err(e) => {
                    tracing::warn!(url, attempt, error = %e, "request failed");
                    let retryable = is_retryable_error(&e);
                    last_error = Some(e);

                    // Don't retry on certain errors
                    if !retryable {
                        break;
                    }
                }
            }
        }

        // Convert the last error
        match last_error {
            Some(e) if e.is_timeout() => Err(NetworkError::Timeout {
                url: url.to_string(),
            }
            .into()),
            Some(e) if e.is_connect() => Err(NetworkError::ConnectionRefused(e.to_string()).into()),
            Some(e) if e.is_builder() => Err(NetworkError::InvalidUrl(e.to_string()).into()),
            Some(e) => Err(NetworkError::RetriesExhausted {
                url: url.to_string(),
                attempts: retry.max_retries + 1,
                last_error: e.to_string(),
            }
            .into()),
            None => Err(NetworkError::DownloadFailed("Unknown error".to_string()).into()),
        }
    }
}

fn retry_after(response: &Response) -> Option<u64> {
    if response.status() != StatusCode::TOO_MANY_REQUESTS {
        return None;
    }
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok())
}

/// Turn a non-success status into `NetworkError::HttpError`
///
/// # Errors
///
/// Returns `NetworkError::HttpError` (or `RateLimited` for 429) when the
/// status is not 2xx.
pub fn ensure_success(response: Response) -> Result<Response, Error> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if let Some(seconds) = retry_after(&response) {
        return Err(NetworkError::RateLimited { seconds }.into());
    }
    Err(NetworkError::HttpError {
        status: status.as_u16(),
        message: status.to_string(),
    }
    .into())
}
