//! Pipeline configuration, loaded from `config.json` in the app data directory.

use crate::error::Result;
use crate::transcription::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub credentials: CredentialConfig,
    pub speech: SpeechConfig,
    pub generation: GenerationConfig,
    pub acquisition: AcquisitionConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Where imported audio lives. Defaults to `paths::audio_dir()`.
    pub root: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialConfig {
    /// Service-account document. Defaults to `paths::credentials_path()`.
    pub path: Option<PathBuf>,
    pub token_url: String,
    pub scope: String,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            path: None,
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            scope: "https://www.googleapis.com/auth/cloud-platform".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Media upload endpoint of the bucket; `uploadType` and `name` are appended.
    pub upload_url: String,
    pub bucket: String,
    pub recognize_url: String,
    /// Operation status endpoint; the operation name is appended as a path segment.
    pub operations_url: String,
    pub encoding: String,
    pub sample_rate_hertz: u32,
    pub language_code: String,
    pub model: String,
    pub audio_channel_count: u32,
    pub enable_automatic_punctuation: bool,
    pub polling: RetryPolicy,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        let bucket = "listening-lab-audio".to_string();
        Self {
            upload_url: format!(
                "https://storage.googleapis.com/upload/storage/v1/b/{}/o",
                bucket
            ),
            bucket,
            recognize_url: "https://speech.googleapis.com/v1/speech:longrunningrecognize"
                .to_string(),
            operations_url: "https://speech.googleapis.com/v1/operations".to_string(),
            encoding: "MP3".to_string(),
            sample_rate_hertz: 44100,
            language_code: "fr-FR".to_string(),
            model: "default".to_string(),
            audio_channel_count: 1,
            enable_automatic_punctuation: true,
            polling: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    /// Upper bound on one completion request, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/completions".to_string(),
            api_key: None,
            max_tokens: 800,
            temperature: 0.7,
            top_p: 1.0,
            request_timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// URL template with an `{id}` placeholder that serves the audio of a video.
    pub video_resolver_url: Option<String>,
    pub allowed_extensions: Vec<String>,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            video_resolver_url: None,
            allowed_extensions: ["mp3", "wav", "m4a", "aac", "mp4", "caf"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl AppConfig {
    /// Read the config file, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
