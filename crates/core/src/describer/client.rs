//! AltText-style description service client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::config::AltTextConfig;

use super::poll::{JobStatus, PollState};
use super::types::{DescribeError, Describer, Description, Sleep, TokioSleep};

/// What the submit endpoint answered.
enum SubmitOutcome {
    /// Synchronous completion (HTTP 200).
    Done(String),
    /// Job accepted for asynchronous processing (HTTP 202).
    Accepted(String),
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    #[serde(default)]
    alt_text: Option<String>,
    #[serde(default)]
    job_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JobResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    alt_text: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Client for an AltText.ai-compatible description API.
pub struct AltTextClient {
    client: Client,
    config: AltTextConfig,
    sleep: Arc<dyn Sleep>,
}

impl AltTextClient {
    pub fn new(config: AltTextConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            config,
            sleep: Arc::new(TokioSleep),
        }
    }

    /// Replace the sleep implementation (tests use an instant one).
    pub fn with_sleep(mut self, sleep: Arc<dyn Sleep>) -> Self {
        self.sleep = sleep;
        self
    }

    fn base_url(&self) -> &str {
        self.config.api_base.trim_end_matches('/')
    }

    async fn submit(
        &self,
        image_url: &str,
        keywords: &[String],
    ) -> Result<SubmitOutcome, DescribeError> {
        let payload = build_payload(image_url, keywords, self.config.webhook_url.as_deref());

        let response = self
            .client
            .post(format!("{}/images", self.base_url()))
            .header("X-API-Key", &self.config.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DescribeError::Timeout(Duration::from_secs(self.config.timeout_secs as u64))
                } else {
                    DescribeError::Http(e.to_string())
                }
            })?;

        let status = response.status();
        match status.as_u16() {
            200 => {
                let body: SubmitResponse = response
                    .json()
                    .await
                    .map_err(|e| DescribeError::Json(e.to_string()))?;
                Ok(SubmitOutcome::Done(body.alt_text.unwrap_or_default()))
            }
            202 => {
                let body: SubmitResponse = response
                    .json()
                    .await
                    .map_err(|e| DescribeError::Json(e.to_string()))?;
                let job_id = body.job_id.ok_or_else(|| {
                    DescribeError::Json("202 response without job_id".to_string())
                })?;
                Ok(SubmitOutcome::Accepted(job_id))
            }
            code => {
                let message = response.text().await.unwrap_or_default();
                Err(DescribeError::Api {
                    status: code,
                    message: message.chars().take(200).collect(),
                })
            }
        }
    }

    async fn poll_job(&self, job_id: &str) -> Result<JobStatus, DescribeError> {
        let response = self
            .client
            .get(format!("{}/jobs/{}", self.base_url(), job_id))
            .header("X-API-Key", &self.config.api_key)
            .send()
            .await
            .map_err(|e| DescribeError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DescribeError::Api {
                status: status.as_u16(),
                message: "job status request failed".to_string(),
            });
        }

        let body: JobResponse = response
            .json()
            .await
            .map_err(|e| DescribeError::Json(e.to_string()))?;

        Ok(match body.status.as_str() {
            "completed" => JobStatus::Completed(body.alt_text.unwrap_or_default()),
            "failed" => JobStatus::Failed(body.error.unwrap_or_else(|| "unknown error".to_string())),
            _ => JobStatus::InProgress,
        })
    }

    async fn poll_until_done(&self, job_id: String, keywords: &[String]) -> Description {
        let interval = Duration::from_secs(self.config.poll_interval_secs as u64);
        let mut state = PollState::new(job_id);

        while !state.is_terminal() {
            self.sleep.sleep(interval).await;
            let job_id = state
                .job_id()
                .expect("non-terminal state has a job id")
                .to_string();
            let observation = self.poll_job(&job_id).await;
            state = state.advance(observation, self.config.max_poll_attempts);
        }

        match state {
            PollState::Complete { text } => Description::complete(text, keywords.to_vec()),
            PollState::Failed { reason } => {
                warn!("Description job failed: {}", reason);
                Description::failed(keywords.to_vec())
            }
            _ => unreachable!("poll loop exits only on terminal states"),
        }
    }
}

#[async_trait]
impl Describer for AltTextClient {
    fn name(&self) -> &str {
        "alttext"
    }

    async fn describe(&self, image_url: &str, keywords: &[String]) -> Description {
        debug!("Generating description for {}", image_url);

        match self.submit(image_url, keywords).await {
            Ok(SubmitOutcome::Done(text)) => {
                debug!("Description generated synchronously");
                Description::complete(text, keywords.to_vec())
            }
            Ok(SubmitOutcome::Accepted(job_id)) => {
                if self.config.webhook_url.is_some() {
                    // The webhook receiver completes the record later.
                    debug!("Description job {} will complete via webhook", job_id);
                    Description::pending(keywords.to_vec())
                } else {
                    self.poll_until_done(job_id, keywords).await
                }
            }
            Err(e) => {
                warn!("Description generation failed for {}: {}", image_url, e);
                Description::failed(keywords.to_vec())
            }
        }
    }

    async fn test_connection(&self) -> bool {
        // Any reachable response (even 404 for a bogus job) proves the API is
        // up and the key is accepted; 401/403 means a bad key.
        let result = self
            .client
            .get(format!("{}/jobs/connection-check", self.base_url()))
            .header("X-API-Key", &self.config.api_key)
            .send()
            .await;

        match result {
            Ok(response) => match response.status().as_u16() {
                200 | 202 | 404 => true,
                401 | 403 => {
                    warn!("Description service rejected the API key");
                    false
                }
                code => {
                    warn!("Description service probe failed: HTTP {}", code);
                    false
                }
            },
            Err(e) => {
                warn!("Description service unreachable: {}", e);
                false
            }
        }
    }
}

/// Request payload: keywords and webhook are omitted when absent.
fn build_payload(
    image_url: &str,
    keywords: &[String],
    webhook_url: Option<&str>,
) -> serde_json::Value {
    let mut payload = json!({
        "image": { "url": image_url }
    });
    if !keywords.is_empty() {
        payload["keywords"] = json!(keywords);
    }
    if let Some(webhook) = webhook_url {
        payload["webhook_url"] = json!(webhook);
    }
    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_minimal() {
        let payload = build_payload("https://ex.com/a.jpg", &[], None);
        assert_eq!(payload["image"]["url"], "https://ex.com/a.jpg");
        assert!(payload.get("keywords").is_none());
        assert!(payload.get("webhook_url").is_none());
    }

    #[test]
    fn test_payload_with_keywords_and_webhook() {
        let keywords = vec!["dog".to_string(), "park".to_string()];
        let payload = build_payload(
            "https://ex.com/a.jpg",
            &keywords,
            Some("https://hooks.example.com/alt"),
        );
        assert_eq!(payload["keywords"][0], "dog");
        assert_eq!(payload["webhook_url"], "https://hooks.example.com/alt");
    }

    #[test]
    fn test_client_name() {
        let client = AltTextClient::new(AltTextConfig {
            api_key: "k".to_string(),
            api_base: "https://alttext.ai/api/v1".to_string(),
            keywords: vec![],
            webhook_url: None,
            timeout_secs: 30,
            poll_interval_secs: 2,
            max_poll_attempts: 15,
        });
        assert_eq!(client.name(), "alttext");
    }
}
