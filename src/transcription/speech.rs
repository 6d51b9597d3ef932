//! Cloud speech recognition: object upload, long-running job submission, bounded polling.

use super::backend::Transcriber;
use super::retry::RetryPolicy;
use crate::acquisition::mime_for_extension;
use crate::clock::Sleeper;
use crate::config::SpeechConfig;
use crate::credentials::{BearerToken, TokenProvider};
use crate::error::{ensure_success, PipelineError, Result};
use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognitionConfig<'a> {
    encoding: &'a str,
    sample_rate_hertz: u32,
    language_code: &'a str,
    enable_automatic_punctuation: bool,
    model: &'a str,
    audio_channel_count: u32,
}

#[derive(Debug, Serialize)]
struct RecognitionAudio {
    uri: String,
}

#[derive(Debug, Serialize)]
struct RecognizeRequest<'a> {
    config: RecognitionConfig<'a>,
    audio: RecognitionAudio,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    name: String,
}

#[derive(Debug, Deserialize)]
struct OperationStatus {
    #[serde(default)]
    done: bool,
    response: Option<RecognizeResponse>,
    error: Option<OperationError>,
}

#[derive(Debug, Deserialize)]
struct OperationError {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<RecognitionResult>,
}

#[derive(Debug, Deserialize)]
struct RecognitionResult {
    #[serde(default)]
    alternatives: Vec<Alternative>,
}

#[derive(Debug, Deserialize)]
struct Alternative {
    transcript: Option<String>,
}

impl RecognizeResponse {
    fn first_transcript(self) -> Option<String> {
        self.results
            .into_iter()
            .next()?
            .alternatives
            .into_iter()
            .next()?
            .transcript
    }
}

pub struct SpeechClient {
    http: reqwest::Client,
    tokens: Arc<dyn TokenProvider>,
    sleeper: Arc<dyn Sleeper>,
    config: SpeechConfig,
}

impl SpeechClient {
    pub fn new(
        http: reqwest::Client,
        tokens: Arc<dyn TokenProvider>,
        sleeper: Arc<dyn Sleeper>,
        config: SpeechConfig,
    ) -> Self {
        Self {
            http,
            tokens,
            sleeper,
            config,
        }
    }

    pub fn polling(&self) -> &RetryPolicy {
        &self.config.polling
    }

    pub async fn transcribe_file(&self, audio_path: &Path) -> Result<String> {
        let token = self.tokens.token().await?;
        let bytes = tokio::fs::read(audio_path).await?;
        let ext = audio_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("bin")
            .to_ascii_lowercase();
        let key = format!("{}.{}", Uuid::new_v4(), ext);

        self.upload(&token, &key, bytes, mime_for_extension(&ext)).await?;
        let operation = self.submit(&token, &key).await?;
        info!("[transcribe] submitted {} as operation {}", key, operation);
        self.poll(&token, &operation).await
    }

    async fn upload(
        &self,
        token: &BearerToken,
        key: &str,
        bytes: Vec<u8>,
        mime: &str,
    ) -> Result<()> {
        debug!("[transcribe] uploading {} bytes as {}", bytes.len(), key);
        let response = self
            .http
            .post(&self.config.upload_url)
            .query(&[("uploadType", "media"), ("name", key)])
            .bearer_auth(&token.value)
            .header(CONTENT_TYPE, mime)
            .body(bytes)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn submit(&self, token: &BearerToken, key: &str) -> Result<String> {
        let body = RecognizeRequest {
            config: RecognitionConfig {
                encoding: &self.config.encoding,
                sample_rate_hertz: self.config.sample_rate_hertz,
                language_code: &self.config.language_code,
                enable_automatic_punctuation: self.config.enable_automatic_punctuation,
                model: &self.config.model,
                audio_channel_count: self.config.audio_channel_count,
            },
            audio: RecognitionAudio {
                uri: format!("gs://{}/{}", self.config.bucket, key),
            },
        };
        let response = self
            .http
            .post(&self.config.recognize_url)
            .bearer_auth(&token.value)
            .json(&body)
            .send()
            .await?;
        let submitted: SubmitResponse = ensure_success(response).await?.json().await?;
        Ok(submitted.name)
    }

    /// Sleep, then poll; repeat until done or the policy runs out.
    /// Transport failures mid-poll propagate without another attempt.
    async fn poll(&self, token: &BearerToken, operation: &str) -> Result<String> {
        let policy = self.config.polling;
        let url = format!(
            "{}/{}",
            self.config.operations_url.trim_end_matches('/'),
            operation
        );
        for attempt in 1..=policy.max_attempts {
            self.sleeper.sleep(policy.delay_for(attempt)).await;
            let response = self.http.get(&url).bearer_auth(&token.value).send().await?;
            let status: OperationStatus = ensure_success(response).await?.json().await?;
            if !status.done {
                debug!("[transcribe] {} pending (attempt {})", operation, attempt);
                continue;
            }
            if let Some(err) = status.error {
                warn!("[transcribe] {} failed: {} {}", operation, err.code, err.message);
                return Err(PipelineError::Transport(format!(
                    "recognition failed ({}): {}",
                    err.code, err.message
                )));
            }
            return status
                .response
                .and_then(RecognizeResponse::first_transcript)
                .ok_or_else(|| {
                    PipelineError::parse(format!("operation {} finished without a transcript", operation))
                });
        }
        warn!(
            "[transcribe] {} not done after {} attempts",
            operation, policy.max_attempts
        );
        Err(PipelineError::Timeout {
            attempts: policy.max_attempts,
        })
    }
}

#[async_trait]
impl Transcriber for SpeechClient {
    fn id(&self) -> &'static str {
        "cloud-speech"
    }

    async fn transcribe(&self, audio_path: &Path) -> Result<String> {
        self.transcribe_file(audio_path).await
    }
}
