use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use crate::error::{KonspektError, Result};

/// Web search collaborator: a query in, up to ten candidate URLs out.
#[async_trait]
pub trait SearchClient: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<String>>;
}

#[derive(Debug, Clone)]
pub struct BackoffConfig {
    pub base_delay: Duration,
    pub max_retries: u32,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            max_retries: 10,
        }
    }
}

impl BackoffConfig {
    /// Delay before retry number `attempt`: base * 2^attempt plus up to
    /// a second of jitter.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..1000));
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt)) + jitter
    }
}

const SEARCH_API_URL: &str = "https://www.googleapis.com/customsearch/v1";

/// Google Custom Search JSON API client. Rate-limit responses are
/// retried with exponential backoff and jitter; any other HTTP error
/// propagates immediately.
pub struct GoogleSearchClient {
    client: reqwest::Client,
    api_key: String,
    cx: String,
    backoff: BackoffConfig,
}

impl GoogleSearchClient {
    pub fn from_env() -> Result<Self> {
        let api_key =
            std::env::var("GOOGLE_SEARCH_API_KEY").map_err(|_| KonspektError::MissingApiKey {
                env_var: "GOOGLE_SEARCH_API_KEY".to_string(),
            })?;
        let cx = std::env::var("GOOGLE_SEARCH_CX").map_err(|_| KonspektError::MissingApiKey {
            env_var: "GOOGLE_SEARCH_CX".to_string(),
        })?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            api_key,
            cx,
            backoff: BackoffConfig::default(),
        })
    }

    pub fn with_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff;
        self
    }
}

#[async_trait]
impl SearchClient for GoogleSearchClient {
    async fn search(&self, query: &str) -> Result<Vec<String>> {
        let mut attempt = 0;
        loop {
            let response = self
                .client
                .get(SEARCH_API_URL)
                .query(&[
                    ("key", self.api_key.as_str()),
                    ("cx", self.cx.as_str()),
                    ("q", query),
                    ("num", "10"),
                    ("fields", "items(link)"),
                ])
                .send()
                .await?;

            if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
                if attempt >= self.backoff.max_retries {
                    return Err(KonspektError::RateLimited { attempts: attempt });
                }
                let delay = self.backoff.delay_for(attempt);
                tracing::info!(
                    query,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "search rate limited, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            let data = response.error_for_status()?.json::<serde_json::Value>().await?;
            let urls = data["items"]
                .as_array()
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|item| item["link"].as_str().map(str::to_string))
                        .collect()
                })
                .unwrap_or_default();
            return Ok(urls);
        }
    }
}
