use std::time::Duration;

use regex::Regex;
use serde::Deserialize;

use crate::error::{KonspektError, Result};
use crate::progress::{ProgressSink, Stage};
use crate::types::{Transcript, TranscriptEntry};

/// Extract a video id from the locator formats the transcript
/// collaborator understands: watch URLs, short links, and shorts.
pub fn extract_video_id(url: &str) -> Option<String> {
    const PATTERNS: [&str; 2] = [
        r"(?:youtube\.com/watch\?v=|youtu\.be/)([A-Za-z0-9_-]+)",
        r"youtube\.com/shorts/([A-Za-z0-9_-]+)",
    ];
    for pattern in PATTERNS {
        let re = Regex::new(pattern).ok()?;
        if let Some(captures) = re.captures(url) {
            return captures.get(1).map(|m| m.as_str().to_string());
        }
    }
    None
}

#[derive(Debug, Deserialize)]
struct TranscriptPayload {
    transcript: Vec<TranscriptEntry>,
}

/// Client for the external fetch-by-URL transcript collaborator.
/// Transient gateway errors are retried with exponential delay; a 404
/// is the distinct "no transcript exists" outcome.
pub struct TranscriptFetcher {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
    base_delay: Duration,
}

impl TranscriptFetcher {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            max_retries: 5,
            base_delay: Duration::from_secs(1),
        })
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub async fn fetch(&self, url: &str) -> Result<Transcript> {
        self.fetch_with_progress(url, &ProgressSink::disabled()).await
    }

    pub async fn fetch_with_progress(
        &self,
        url: &str,
        progress: &ProgressSink,
    ) -> Result<Transcript> {
        if extract_video_id(url).is_none() {
            return Err(KonspektError::InvalidInput {
                reason: format!("not a recognizable video URL: {url}"),
            });
        }

        let mut attempt = 0;
        loop {
            let result = self
                .client
                .post(&self.base_url)
                .json(&serde_json::json!({ "url": url }))
                .send()
                .await;

            let retryable = match &result {
                Ok(response) => matches!(response.status().as_u16(), 502 | 503 | 504),
                Err(err) => err.is_timeout() || err.is_connect(),
            };

            if retryable && attempt < self.max_retries {
                let delay = self.base_delay * 2u32.saturating_pow(attempt);
                tracing::info!(
                    url,
                    attempt = attempt + 1,
                    max = self.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    "transcript fetch failed transiently, retrying"
                );
                progress.status(
                    Stage::FetchingTranscript,
                    format!(
                        "Retrying transcript fetch in {:.1}s ({}/{})",
                        delay.as_secs_f64(),
                        attempt + 1,
                        self.max_retries
                    ),
                    serde_json::json!({ "url": url }),
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            let response = match result {
                Ok(response) => response,
                Err(err) => {
                    return Err(KonspektError::UpstreamUnavailable {
                        service: "transcript fetch",
                        reason: err.to_string(),
                    });
                }
            };

            let status = response.status();
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(KonspektError::NotAvailable {
                    url: url.to_string(),
                });
            }
            if !status.is_success() {
                return Err(KonspektError::UpstreamUnavailable {
                    service: "transcript fetch",
                    reason: format!("unexpected status {status}"),
                });
            }

            let payload = response.json::<TranscriptPayload>().await.map_err(|err| {
                KonspektError::UpstreamUnavailable {
                    service: "transcript fetch",
                    reason: format!("malformed transcript payload: {err}"),
                }
            })?;
            return Ok(Transcript::new(payload.transcript));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_watch_urls() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn recognizes_short_links() {
        assert_eq!(
            extract_video_id("https://youtu.be/abc-123_XY"),
            Some("abc-123_XY".to_string())
        );
    }

    #[test]
    fn recognizes_shorts() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/shorts/xyz789"),
            Some("xyz789".to_string())
        );
    }

    #[test]
    fn rejects_unrelated_urls() {
        assert_eq!(extract_video_id("https://example.com/watch?v=nope"), None);
        assert_eq!(extract_video_id("not a url at all"), None);
    }

    #[tokio::test]
    async fn invalid_locator_fails_before_any_network_call() {
        // Unroutable base URL: if validation didn't run first, this
        // would surface as an upstream error instead.
        let fetcher = TranscriptFetcher::new("http://127.0.0.1:1/transcript")
            .expect("client builds")
            .with_max_retries(0);
        let result = fetcher.fetch("https://example.com/video").await;
        assert!(matches!(result, Err(KonspektError::InvalidInput { .. })));
    }
}
