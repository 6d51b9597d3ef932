//! Question sources, tried in order by the generator.

use super::parser::parse_questions;
use super::prompt::{QUESTION_MARKER, RECOMMEND_MARKER};
use crate::config::GenerationConfig;
use crate::error::{ensure_success, PipelineError, Result};
use crate::exercise::{Difficulty, Question};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationTier {
    Remote,
    KeywordTemplate,
    Hardcoded,
}

#[async_trait]
pub trait QuestionStrategy: Send + Sync {
    fn tier(&self) -> GenerationTier;
    /// Non-empty questions, or an error explaining why this tier gave up.
    async fn attempt(&self, prompt: &str) -> Result<Vec<Question>>;
}

fn non_empty(questions: Vec<Question>, source: &str) -> Result<Vec<Question>> {
    if questions.is_empty() {
        Err(PipelineError::Parse(format!(
            "{} produced no well-formed question blocks",
            source
        )))
    } else {
        Ok(questions)
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    prompt: &'a str,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    text: String,
}

/// Calls the generative completion endpoint.
pub struct RemoteCompletion {
    http: reqwest::Client,
    config: GenerationConfig,
}

impl RemoteCompletion {
    pub fn new(http: reqwest::Client, config: GenerationConfig) -> Self {
        Self { http, config }
    }

    pub async fn complete(&self, prompt: &str) -> Result<String> {
        let body = CompletionRequest {
            prompt,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            top_p: self.config.top_p,
        };
        let mut req = self
            .http
            .post(&self.config.endpoint)
            .timeout(Duration::from_secs(self.config.request_timeout_secs.max(1)))
            .json(&body);
        if let Some(key) = self.config.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            req = req.bearer_auth(key.trim());
        }
        let response: CompletionResponse = ensure_success(req.send().await?).await?.json().await?;
        response
            .choices
            .into_iter()
            .next()
            .map(|c| c.text)
            .ok_or_else(|| PipelineError::parse("completion returned no choices"))
    }
}

#[async_trait]
impl QuestionStrategy for RemoteCompletion {
    fn tier(&self) -> GenerationTier {
        GenerationTier::Remote
    }

    async fn attempt(&self, prompt: &str) -> Result<Vec<Question>> {
        let reply = self.complete(prompt).await?;
        non_empty(parse_questions(&reply), "completion reply")
    }
}

const CANNED_QUESTIONS: &str = "\
Question: What is the main purpose of the recording?
1. To give directions
2. To share information or news
3. To sell a product
4. To tell a joke
Correct answer: 2
Difficulty: beginner

Question: How many people can be heard speaking?
1. One
2. Two
3. Three
4. More than three
Correct answer: 1
Difficulty: intermediate

Question: Which word best describes the speaker's tone?
1. Angry
2. Neutral
3. Excited
4. Sad
Correct answer: 2
Difficulty: advanced";

const CANNED_RECOMMENDATIONS: &str = "\
Based on your progress, try these next:
- Short dialogues at a café, to practise everyday phrases.
- A slow news bulletin, to build vocabulary on current events.
- A weather forecast, to practise numbers and time expressions.";

/// Canned replies keyed by a substring of the prompt.
pub struct KeywordTemplates {
    table: Vec<(String, String)>,
}

impl Default for KeywordTemplates {
    fn default() -> Self {
        Self::new(vec![
            (QUESTION_MARKER.to_string(), CANNED_QUESTIONS.to_string()),
            (RECOMMEND_MARKER.to_string(), CANNED_RECOMMENDATIONS.to_string()),
        ])
    }
}

impl KeywordTemplates {
    pub fn new(table: Vec<(String, String)>) -> Self {
        Self { table }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn lookup(&self, prompt: &str) -> Option<&str> {
        let lower = prompt.to_lowercase();
        self.table
            .iter()
            .find(|(marker, _)| lower.contains(&marker.to_lowercase()))
            .map(|(_, reply)| reply.as_str())
    }
}

#[async_trait]
impl QuestionStrategy for KeywordTemplates {
    fn tier(&self) -> GenerationTier {
        GenerationTier::KeywordTemplate
    }

    async fn attempt(&self, prompt: &str) -> Result<Vec<Question>> {
        let reply = self
            .lookup(prompt)
            .ok_or_else(|| PipelineError::parse("no keyword template matches the prompt"))?;
        non_empty(parse_questions(reply), "keyword template")
    }
}

/// The fixed last-resort questions. Identical on every call.
pub fn hardcoded_questions() -> Vec<Question> {
    vec![
        Question {
            id: Uuid::from_u128(0x6c69_7374_656e_0001),
            text: "What is the main topic of the audio?".to_string(),
            options: vec![
                "Daily life".to_string(),
                "Work or study".to_string(),
                "Travel".to_string(),
                "Current events".to_string(),
            ],
            correct_option_index: 0,
            difficulty: Difficulty::Beginner,
            user_selected: None,
        },
        Question {
            id: Uuid::from_u128(0x6c69_7374_656e_0002),
            text: "How would you describe the speaker's attitude?".to_string(),
            options: vec![
                "Positive".to_string(),
                "Neutral".to_string(),
                "Negative".to_string(),
                "Uncertain".to_string(),
            ],
            correct_option_index: 1,
            difficulty: Difficulty::Intermediate,
            user_selected: None,
        },
    ]
}

pub struct HardcodedFallback;

#[async_trait]
impl QuestionStrategy for HardcodedFallback {
    fn tier(&self) -> GenerationTier {
        GenerationTier::Hardcoded
    }

    async fn attempt(&self, _prompt: &str) -> Result<Vec<Question>> {
        Ok(hardcoded_questions())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn question_marker_selects_canned_questions() {
        let templates = KeywordTemplates::default();
        let prompt = format!("Please write a {} set", QUESTION_MARKER.to_uppercase());
        let questions = templates.attempt(&prompt).await.unwrap();
        assert_eq!(questions.len(), 3);
        assert!(questions.iter().all(|q| q.options.len() == 4 && q.is_well_formed()));
    }

    #[tokio::test]
    async fn recommendation_template_does_not_parse_as_questions() {
        let templates = KeywordTemplates::default();
        let err = templates
            .attempt("Please recommend exercises for me")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Parse(_)));
    }

    #[tokio::test]
    async fn unmatched_prompt_fails() {
        assert!(KeywordTemplates::default().attempt("hello").await.is_err());
        assert!(KeywordTemplates::empty()
            .attempt(QUESTION_MARKER)
            .await
            .is_err());
    }

    #[test]
    fn hardcoded_list_is_stable_and_well_formed() {
        let a = hardcoded_questions();
        assert_eq!(a, hardcoded_questions());
        assert_eq!(a.len(), 2);
        assert!(a.iter().all(Question::is_well_formed));
    }
}
