//! HTTP transport to the path-finding backend
//!
//! One `POST` per submission, no streaming. Transport failures can be
//! retried with exponential backoff when the configuration asks for it.

use std::time::Duration;

use log::{debug, warn};
use once_cell::sync::Lazy;
use reqwest::{Client, ClientBuilder};

use crate::core::config::BackendConfig;
use crate::core::error::{first_line, BackendError};
use crate::core::wire::{BackendPayload, BackendReport, BackendRequest};

/// Shared HTTP client, reused across sessions
static GLOBAL_CLIENT: Lazy<Client> = Lazy::new(|| {
    ClientBuilder::new()
        .tcp_keepalive(Duration::from_secs(60))
        .pool_idle_timeout(Duration::from_secs(90))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(format!("railnav/{}", env!("RAILNAV_VERSION")))
        .build()
        .expect("Failed to create HTTP client")
});

/// Doublings stop here so long retry runs keep a bounded delay
const MAX_BACKOFF_EXPONENT: u32 = 16;

/// Delay before retry number `attempt` (1-based)
fn backoff_delay(base_delay: Duration, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(MAX_BACKOFF_EXPONENT);
    base_delay.saturating_mul(1 << exponent)
}

/// Execute an operation, retrying transport failures with exponential backoff
async fn retry_on_unavailable<F, Fut, T>(
    max_retries: u32,
    base_delay: Duration,
    operation: F,
) -> Result<T, BackendError>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T, BackendError>>,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(BackendError::Unavailable(msg)) if attempt < max_retries => {
                attempt += 1;
                let delay = backoff_delay(base_delay, attempt);
                warn!("Backend unavailable (attempt {attempt}): {msg}. Retrying in {delay:?}");
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Client for the backend's `run` endpoint
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    config: BackendConfig,
}

impl Default for BackendClient {
    fn default() -> Self {
        Self::new()
    }
}

impl BackendClient {
    /// Create a client for the default local endpoint
    pub fn new() -> Self {
        Self::with_config(BackendConfig::default())
    }

    /// Create a client with custom configuration
    pub fn with_config(config: BackendConfig) -> Self {
        Self {
            client: GLOBAL_CLIENT.clone(),
            config,
        }
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Send serialized backend input and parse the reply
    pub async fn run(&self, input: &str) -> Result<BackendReport, BackendError> {
        retry_on_unavailable(self.config.max_retries, self.config.retry_base_delay, || {
            self.run_once(input)
        })
        .await
    }

    async fn run_once(&self, input: &str) -> Result<BackendReport, BackendError> {
        debug!("POST {} ({} bytes of input)", self.config.endpoint, input.len());

        let mut request = self
            .client
            .post(&self.config.endpoint)
            .json(&BackendRequest { input });
        if let Some(timeout) = self.config.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        // An unreadable body counts as an empty payload
        let payload: BackendPayload = serde_json::from_str(&body).unwrap_or_default();

        if !status.is_success() {
            let message = payload
                .error
                .as_deref()
                .map(first_line)
                .filter(|line| !line.is_empty())
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            return Err(BackendError::Rejected(message));
        }

        BackendReport::from_payload(payload)
    }
}
