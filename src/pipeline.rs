//! Acquisition → transcription → question generation → exercise.

use crate::acquisition::{AcquisitionManager, AudioStore, TemplateResolver};
use crate::clock::{SystemClock, TokioSleeper};
use crate::config::AppConfig;
use crate::credentials::CredentialManager;
use crate::error::Result;
use crate::exercise::{
    dominant_difficulty, Difficulty, DraftExercise, Exercise, ExerciseLibrary, ExerciseType,
};
use crate::generation::QuestionGenerator;
use crate::paths;
use crate::transcription::{SpeechClient, Transcriber};
use log::{info, warn};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

/// What to do when transcription fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TranscriptPolicy {
    /// Surface the transcription error to the caller.
    #[default]
    Required,
    /// Continue with an empty transcript and metadata-only questions.
    BestEffort,
}

#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    pub exercise_type: ExerciseType,
    /// Derived from the generated questions when absent.
    pub difficulty: Option<Difficulty>,
    pub transcript_policy: TranscriptPolicy,
}

pub struct ExercisePipeline {
    acquisition: AcquisitionManager,
    transcriber: Arc<dyn Transcriber>,
    generator: Arc<QuestionGenerator>,
    library: Arc<RwLock<ExerciseLibrary>>,
}

impl ExercisePipeline {
    pub fn new(
        acquisition: AcquisitionManager,
        transcriber: Arc<dyn Transcriber>,
        generator: Arc<QuestionGenerator>,
    ) -> Self {
        Self {
            acquisition,
            transcriber,
            generator,
            library: Arc::new(RwLock::new(ExerciseLibrary::new())),
        }
    }

    /// Wire the production components from configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let http = reqwest::Client::new();
        let root = match &config.storage.root {
            Some(root) => root.clone(),
            None => paths::audio_dir()?,
        };
        let store = AudioStore::open(root)?;

        let mut acquisition = AcquisitionManager::new(store, http.clone(), &config.acquisition);
        if let Some(template) = &config.acquisition.video_resolver_url {
            acquisition = acquisition.with_video_resolver(Arc::new(TemplateResolver::new(template)));
        }

        let credentials_path = config
            .credentials
            .path
            .clone()
            .unwrap_or_else(paths::credentials_path);
        let tokens = Arc::new(CredentialManager::new(
            credentials_path,
            &config.credentials,
            http.clone(),
            Arc::new(SystemClock),
        ));
        let transcriber = Arc::new(SpeechClient::new(
            http.clone(),
            tokens,
            Arc::new(TokioSleeper),
            config.speech.clone(),
        ));
        let generator = Arc::new(QuestionGenerator::with_remote(http, config.generation.clone()));
        Ok(Self::new(acquisition, transcriber, generator))
    }

    pub fn store(&self) -> &AudioStore {
        self.acquisition.store()
    }

    pub fn generator(&self) -> Arc<QuestionGenerator> {
        Arc::clone(&self.generator)
    }

    pub fn library(&self) -> Arc<RwLock<ExerciseLibrary>> {
        Arc::clone(&self.library)
    }

    pub async fn ingest_local(&self, path: &Path, options: &IngestOptions) -> Result<Exercise> {
        let draft = self.acquisition.import_local(path).await?;
        self.complete(draft, options).await
    }

    pub async fn ingest_remote(
        &self,
        url: &str,
        title: Option<&str>,
        is_video_platform: bool,
        options: &IngestOptions,
    ) -> Result<Exercise> {
        let draft = self
            .acquisition
            .download_remote(url, title, is_video_platform)
            .await?;
        self.complete(draft, options).await
    }

    async fn complete(&self, draft: DraftExercise, options: &IngestOptions) -> Result<Exercise> {
        let transcript = match self.transcriber.transcribe(&draft.audio_path).await {
            Ok(text) => text,
            Err(e) if options.transcript_policy == TranscriptPolicy::BestEffort => {
                warn!(
                    "[pipeline] transcription failed for {}, continuing without transcript: {}",
                    draft.audio_file_name, e
                );
                String::new()
            }
            Err(e) => {
                let _ = self.store().remove(&draft.audio_file_name).await;
                return Err(e);
            }
        };

        let mut exercise = Exercise::assemble(
            draft,
            transcript,
            Vec::new(),
            options.difficulty,
            options.exercise_type,
        );
        exercise.questions = self.generator.generate_for(&exercise).await;
        if options.difficulty.is_none() {
            exercise.difficulty = dominant_difficulty(&exercise.questions);
        }

        info!(
            "[pipeline] exercise {} ready: {:.1}s, {} questions",
            exercise.title,
            exercise.duration,
            exercise.questions.len()
        );
        self.library.write().await.add(exercise.clone());
        Ok(exercise)
    }
}
