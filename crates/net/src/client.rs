//! HTTP client with connection pooling and retry logic

use lxpkg_config::NetworkConfig;
use lxpkg_errors::{Error, FetchError};
use reqwest::{Client, Response};
use std::time::Duration;

/// Network client configuration
#[derive(Debug, Clone)]
pub struct NetConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub pool_idle_timeout: Duration,
    pub pool_max_idle_per_host: usize,
    pub retry_count: u32,
    pub retry_delay: Duration,
    pub user_agent: String,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300), // 5 minutes for large downloads
            connect_timeout: Duration::from_secs(30),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 10,
            retry_count: 3,
            retry_delay: Duration::from_secs(1),
            user_agent: format!("lxpkg/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl From<&NetworkConfig> for NetConfig {
    fn from(config: &NetworkConfig) -> Self {
        Self {
            timeout: config.timeout(),
            connect_timeout: config.connect_timeout(),
            retry_count: config.retries,
            retry_delay: config.retry_delay(),
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

impl std::fmt::Debug for NetClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
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
            .map_err(|e| FetchError::Client {
                message: e.to_string(),
            })?;

        Ok(Self { client, config })
    }

    /// Create with default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created with default settings.
    pub fn with_defaults() -> Result<Self, Error> {
        Self::new(NetConfig::default())
    }

    /// Configuration this client was built with
    #[must_use]
    pub fn config(&self) -> &NetConfig {
        &self.config
    }

    /// Execute a GET request with retries
    ///
    /// Transport failures and 5xx responses are retried up to the configured
    /// count. The final response is returned whatever its status; callers
    /// decide how to treat non-success codes.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Transport` if no response could be obtained.
    pub async fn get(&self, url: &str) -> Result<Response, Error> {
        self.retry_request(url, || self.client.get(url).send()).await
    }

    /// Execute a request with retries
    async fn retry_request<F, Fut>(&self, url: &str, mut f: F) -> Result<Response, Error>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<Response, reqwest::Error>>,
    {
        let mut last_error = None;

        for attempt in 0..=self.config.retry_count {
            if attempt > 0 {
                tokio::time::sleep(self.config.retry_delay * attempt).await;
                tracing::debug!(url, attempt, "retrying request");
            }

            match f().await {
                Ok(response)
                    if response.status().is_server_error() && attempt < self.config.retry_count =>
                {
                    tracing::debug!(url, status = %response.status(), "server error");
                }
                Ok(response) => return Ok(response),
                Err(e) => {
                    let retry = Self::should_retry(&e);
                    last_error = Some(e);

                    // Don't retry on certain errors
                    if !retry {
                        break;
                    }
                }
            }
        }

        let message = match last_error {
            Some(e) if e.is_timeout() => format!("timed out: {e}"),
            Some(e) if e.is_connect() => format!("connection failed: {e}"),
            Some(e) => e.to_string(),
            None => "unknown error".to_string(),
        };
        Err(FetchError::Transport {
            url: url.to_string(),
            message,
        }
        .into())
    }

    /// Determine if an error should be retried
    fn should_retry(error: &reqwest::Error) -> bool {
        // Retry on timeout, connection errors, and server errors
        error.is_timeout()
            || error.is_connect()
            || error.status().is_none_or(|s| s.is_server_error())
    }
}
