//! Transcription backend trait.

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Turns a stored audio file into transcript text.
#[async_trait]
pub trait Transcriber: Send + Sync {
    fn id(&self) -> &'static str;
    async fn transcribe(&self, audio_path: &Path) -> Result<String>;
}
