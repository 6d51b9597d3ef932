//! Multiple-choice question generation with a three-tier fallback.

mod generator;
mod parser;
mod prompt;
mod strategy;

pub use generator::{GenerationResult, QuestionGenerator};
pub use parser::parse_questions;
pub use prompt::{
    build_metadata_prompt, build_prompt, build_recommendation_prompt, QUESTION_MARKER,
    RECOMMEND_MARKER,
};
pub use strategy::{
    hardcoded_questions, GenerationTier, HardcodedFallback, KeywordTemplates, QuestionStrategy,
    RemoteCompletion,
};
