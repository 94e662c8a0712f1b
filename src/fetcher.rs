use crate::config::SourceConfig;
use crate::error::{AppError, Result};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct Fetcher {
    client: Client,
    url: String,
    max_retries: u32,
}

impl Fetcher {
    pub fn new(url: &str, timeout: Duration, max_retries: u32) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("nyiso-synth/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            url: url.to_string(),
            max_retries,
        })
    }

    pub fn from_config(source: &SourceConfig) -> Result<Self> {
        Self::new(
            &source.url,
            Duration::from_secs(source.timeout_seconds),
            source.max_retries,
        )
    }

    /// Download the load CSV as text
    pub async fn fetch_csv(&self) -> Result<String> {
        debug!("Downloading load CSV from {}", self.url);

        let content = retry_with_backoff(self.max_retries, || async {
            let response = self.client.get(&self.url).send().await?;
            let response = response.error_for_status()?;
            let content = response.text().await?;
            Ok(content)
        })
        .await
        .map_err(|e| match e {
            AppError::Http(err) => match err.status() {
                Some(status) => {
                    AppError::Fetch(format!("{} returned HTTP {}", self.url, status))
                }
                None => AppError::Fetch(format!("{}: {}", self.url, err)),
            },
            other => other,
        })?;

        info!("Downloaded {} bytes from {}", content.len(), self.url);
        Ok(content)
    }
}

/// Retry a future with exponential backoff
async fn retry_with_backoff<F, Fut, T>(max_retries: u32, mut f: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut retries = 0;
    loop {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                retries += 1;

                if retries > max_retries {
                    return Err(e);
                }

                let should_retry = match &e {
                    AppError::Http(reqwest_err) => {
                        // Retry on connection errors, timeouts, server errors (5xx)
                        reqwest_err.is_timeout()
                            || reqwest_err.is_connect()
                            || reqwest_err
                                .status()
                                .map(|s| s.is_server_error())
                                .unwrap_or(false)
                    }
                    AppError::Io(_) => true,
                    _ => false,
                };

                if !should_retry {
                    return Err(e);
                }

                let delay = backoff_delay(retries);
                warn!(
                    "Request failed (attempt {}/{}): {}. Retrying in {:?}...",
                    retries, max_retries, e, delay
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_millis(250 * 2u64.pow(attempt.saturating_sub(1).min(6)))
}
