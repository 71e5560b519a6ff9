use crate::config::FetchConfig;
use anyhow::{Context, Result};
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, warn};

#[derive(Debug, Error)]
enum RequestError {
    #[error("HTTP {0}")]
    Status(StatusCode),

    #[error("request error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl RequestError {
    /// Transport failures and rate limiting are worth another go; any other
    /// status is final.
    fn is_retryable(&self) -> bool {
        match self {
            RequestError::Status(s) => {
                *s == StatusCode::TOO_MANY_REQUESTS || *s == StatusCode::SERVICE_UNAVAILABLE
            }
            RequestError::Transport(_) => true,
        }
    }
}

pub struct HttpClient {
    inner: reqwest::Client,
    config: FetchConfig,
}

impl HttpClient {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .cookie_store(true)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            inner,
            config: config.clone(),
        })
    }

    /// GET a URL with rate-limiting and exponential backoff.
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        self.polite_delay().await;

        let strategy = ExponentialBackoff::from_millis(2)
            .factor(self.config.request_delay_ms.max(1))
            .max_delay(Duration::from_secs(30))
            .map(jitter)
            .take(self.config.max_retries as usize);

        let mut attempt = 0u32;
        let action = || {
            attempt += 1;
            debug!("GET {} (attempt {})", url, attempt);
            self.request(url)
        };

        RetryIf::start(strategy, action, |e: &RequestError| {
            let retry = e.is_retryable();
            if retry {
                warn!("{} on {}, backing off", e, url);
            }
            retry
        })
        .await
        .with_context(|| format!("All retries exhausted for {}", url))
    }

    async fn request(&self, url: &str) -> Result<Vec<u8>, RequestError> {
        let resp = self.inner.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(RequestError::Status(status));
        }
        Ok(resp.bytes().await?.to_vec())
    }

    /// Sleep for the configured delay + random jitter.
    async fn polite_delay(&self) {
        let jitter = rand::random_range(0..=self.config.jitter_ms);
        sleep(Duration::from_millis(self.config.request_delay_ms + jitter)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_rate_limits_are_retried() {
        assert!(RequestError::Status(StatusCode::TOO_MANY_REQUESTS).is_retryable());
        assert!(RequestError::Status(StatusCode::SERVICE_UNAVAILABLE).is_retryable());
        assert!(!RequestError::Status(StatusCode::NOT_FOUND).is_retryable());
        assert!(!RequestError::Status(StatusCode::FORBIDDEN).is_retryable());
    }

    #[test]
    fn client_builds_from_defaults() {
        assert!(HttpClient::new(&FetchConfig::default()).is_ok());
    }

    #[test]
    fn unreachable_host_gives_up_after_retries() {
        let config = FetchConfig {
            timeout_secs: 2,
            request_delay_ms: 0,
            jitter_ms: 0,
            max_retries: 1,
            ..Default::default()
        };
        let client = HttpClient::new(&config).unwrap();
        let err = tokio_test::block_on(client.get_bytes("http://127.0.0.1:9/form424b4.htm")).unwrap_err();
        assert!(err.to_string().contains("All retries exhausted"));
    }
}
