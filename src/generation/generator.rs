//! Ordered fallback over question strategies.

use super::prompt::{build_metadata_prompt, build_prompt};
use super::strategy::{
    hardcoded_questions, GenerationTier, HardcodedFallback, KeywordTemplates, QuestionStrategy,
    RemoteCompletion,
};
use crate::config::GenerationConfig;
use crate::exercise::{Exercise, Question};
use log::{info, warn};
use std::sync::Arc;

/// Which tier produced the questions. Diagnostic only.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationResult {
    Remote(Vec<Question>),
    KeywordTemplate(Vec<Question>),
    Hardcoded(Vec<Question>),
}

impl GenerationResult {
    fn from_tier(tier: GenerationTier, questions: Vec<Question>) -> Self {
        match tier {
            GenerationTier::Remote => Self::Remote(questions),
            GenerationTier::KeywordTemplate => Self::KeywordTemplate(questions),
            GenerationTier::Hardcoded => Self::Hardcoded(questions),
        }
    }

    pub fn tier(&self) -> GenerationTier {
        match self {
            Self::Remote(_) => GenerationTier::Remote,
            Self::KeywordTemplate(_) => GenerationTier::KeywordTemplate,
            Self::Hardcoded(_) => GenerationTier::Hardcoded,
        }
    }

    pub fn questions(&self) -> &[Question] {
        match self {
            Self::Remote(q) | Self::KeywordTemplate(q) | Self::Hardcoded(q) => q,
        }
    }

    pub fn into_questions(self) -> Vec<Question> {
        match self {
            Self::Remote(q) | Self::KeywordTemplate(q) | Self::Hardcoded(q) => q,
        }
    }
}

pub struct QuestionGenerator {
    strategies: Vec<Arc<dyn QuestionStrategy>>,
}

impl QuestionGenerator {
    pub fn new(strategies: Vec<Arc<dyn QuestionStrategy>>) -> Self {
        Self { strategies }
    }

    /// Remote completion, then the default keyword templates, then the hardcoded list.
    pub fn with_remote(http: reqwest::Client, config: GenerationConfig) -> Self {
        Self::new(vec![
            Arc::new(RemoteCompletion::new(http, config)),
            Arc::new(KeywordTemplates::default()),
            Arc::new(HardcodedFallback),
        ])
    }

    /// Never fails; always returns at least one well-formed question.
    pub async fn generate(&self, transcript: &str) -> Vec<Question> {
        self.generate_from_prompt(&build_prompt(transcript))
            .await
            .into_questions()
    }

    /// Uses the transcript when present, otherwise the exercise metadata.
    pub async fn generate_for(&self, exercise: &Exercise) -> Vec<Question> {
        let prompt = if exercise.transcript.trim().is_empty() {
            build_metadata_prompt(&exercise.title, exercise.artist.as_deref(), exercise.duration)
        } else {
            build_prompt(&exercise.transcript)
        };
        self.generate_from_prompt(&prompt).await.into_questions()
    }

    pub async fn generate_from_prompt(&self, prompt: &str) -> GenerationResult {
        for strategy in &self.strategies {
            match strategy.attempt(prompt).await {
                Ok(questions) => {
                    let questions: Vec<Question> =
                        questions.into_iter().filter(Question::is_well_formed).collect();
                    if questions.is_empty() {
                        warn!("[generate] {:?} tier returned no usable questions", strategy.tier());
                        continue;
                    }
                    info!(
                        "[generate] {} questions from {:?} tier",
                        questions.len(),
                        strategy.tier()
                    );
                    return GenerationResult::from_tier(strategy.tier(), questions);
                }
                Err(e) => warn!("[generate] {:?} tier failed: {}", strategy.tier(), e),
            }
        }
        info!("[generate] all tiers failed, using hardcoded questions");
        GenerationResult::Hardcoded(hardcoded_questions())
    }
}
