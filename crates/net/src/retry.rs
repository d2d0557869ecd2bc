//! Retry policy and backoff calculations

use reqwest::StatusCode;
use std::time::Duration;

/// Retry configuration for HTTP requests
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt
    pub max_retries: u32,
    /// Initial backoff delay
    pub initial_delay: Duration,
    /// Maximum backoff delay
    pub max_delay: Duration,
    /// Backoff multiplier
    pub backoff_multiplier: f64,
    /// Jitter factor (0.0 to 1.0)
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }
}

impl RetryConfig {
    /// No retries at all
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }
}

/// Calculate exponential backoff delay with jitter for retry `attempt` (1-based)
#[must_use]
pub fn calculate_backoff_delay(retry_config: &RetryConfig, attempt: u32) -> Duration {
    // Precision loss acceptable for backoff calculations
    #[allow(clippy::cast_precision_loss)]
    let base_delay = retry_config
        .initial_delay
        .as_millis()
        .min(u128::from(u64::MAX)) as f64;
    #[allow(clippy::cast_precision_loss)]
    let max_delay = retry_config.max_delay.as_millis().min(u128::from(u64::MAX)) as f64;

    // Retry attempts are small, the exponent cannot wrap
    #[allow(clippy::cast_possible_wrap)]
    let exponent = attempt.saturating_sub(1).min(30) as i32;

    let delay = (base_delay * retry_config.backoff_multiplier.powi(exponent)).min(max_delay);

    let jitter = delay * retry_config.jitter_factor * (rand::random::<f64>() - 0.5);

    // max(0.0) keeps it non-negative before the cast
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let final_delay = (delay + jitter).max(0.0).round() as u64;

    Duration::from_millis(final_delay)
}

/// Statuses worth another attempt: server errors and rate limiting
#[must_use]
pub fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

/// Transport failures worth another attempt
pub(crate) fn is_retryable_error(error: &reqwest::Error) -> bool {
    !error.is_builder()
        && (error.is_timeout()
            || error.is_connect()
            || error.status().is_none_or(is_retryable_status))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_jitter() -> RetryConfig {
        RetryConfig {
            jitter_factor: 0.0,
            ..RetryConfig::default()
        }
    }

    #[test]
    fn test_exponential_growth() {
        let config = no_jitter();
        assert_eq!(calculate_backoff_delay(&config, 1), Duration::from_millis(500));
        assert_eq!(calculate_backoff_delay(&config, 2), Duration::from_millis(1000));
        assert_eq!(calculate_backoff_delay(&config, 3), Duration::from_millis(2000));
    }

    #[test]
    fn test_capped_at_max_delay() {
        let config = no_jitter();
        assert_eq!(calculate_backoff_delay(&config, 20), Duration::from_secs(10));
    }

    #[test]
    fn test_jitter_stays_within_band() {
        let config = RetryConfig {
            jitter_factor: 0.5,
            ..RetryConfig::default()
        };
        for _ in 0..100 {
            let delay = calculate_backoff_delay(&config, 1).as_millis();
            // 500ms +/- 25%
            assert!((375..=625).contains(&delay), "delay {delay} out of band");
        }
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(!is_retryable_status(StatusCode::NOT_FOUND));
        assert!(!is_retryable_status(StatusCode::OK));
    }
}
