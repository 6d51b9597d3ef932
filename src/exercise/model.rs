//! Exercise and question records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [
        Difficulty::Beginner,
        Difficulty::Intermediate,
        Difficulty::Advanced,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }

    /// First difficulty token found in `text`, case-insensitive.
    pub fn find_in(text: &str) -> Option<Self> {
        let lower = text.to_lowercase();
        Self::ALL.into_iter().find(|d| lower.contains(d.as_str()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExerciseType {
    #[default]
    Precision,
    Extensive,
    ListenRepeat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: Uuid,
    pub text: String,
    pub options: Vec<String>,
    pub correct_option_index: usize,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub user_selected: Option<usize>,
}

impl Question {
    pub fn new(
        text: impl Into<String>,
        options: Vec<String>,
        correct_option_index: usize,
        difficulty: Difficulty,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            options,
            correct_option_index,
            difficulty,
            user_selected: None,
        }
    }

    pub fn is_answered(&self) -> bool {
        self.user_selected.is_some()
    }

    pub fn is_correct(&self) -> bool {
        self.user_selected == Some(self.correct_option_index)
    }

    /// Non-empty text, at least two options and an in-range correct index.
    pub fn is_well_formed(&self) -> bool {
        !self.text.trim().is_empty()
            && self.options.len() >= 2
            && self.correct_option_index < self.options.len()
    }
}

/// A stored audio file with its probed metadata, waiting for transcript and questions.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftExercise {
    pub id: Uuid,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub audio_file_name: String,
    pub audio_path: PathBuf,
    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: Uuid,
    pub title: String,
    pub audio_file_name: String,
    pub duration: f64,
    #[serde(default)]
    pub transcript: String,
    pub questions: Vec<Question>,
    pub difficulty: Difficulty,
    #[serde(rename = "type")]
    pub exercise_type: ExerciseType,
    /// Legacy single-question answer slot, mirrors the most recent submission.
    #[serde(default)]
    pub user_selected: Option<usize>,
    #[serde(default)]
    pub bookmarks: Vec<f64>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub album: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Exercise {
    pub fn assemble(
        draft: DraftExercise,
        transcript: String,
        questions: Vec<Question>,
        difficulty: Option<Difficulty>,
        exercise_type: ExerciseType,
    ) -> Self {
        let difficulty = difficulty.unwrap_or_else(|| dominant_difficulty(&questions));
        Self {
            id: draft.id,
            title: draft.title,
            audio_file_name: draft.audio_file_name,
            duration: draft.duration.max(0.0),
            transcript,
            questions,
            difficulty,
            exercise_type,
            user_selected: None,
            bookmarks: Vec::new(),
            artist: draft.artist,
            album: draft.album,
            created_at: Utc::now(),
        }
    }

    pub fn answered_count(&self) -> usize {
        self.questions.iter().filter(|q| q.is_answered()).count()
    }

    pub fn correct_count(&self) -> usize {
        self.questions.iter().filter(|q| q.is_correct()).count()
    }
}

/// Most frequent question difficulty; ties and the empty list give `Intermediate`.
pub fn dominant_difficulty(questions: &[Question]) -> Difficulty {
    let mut counts = [0usize; 3];
    for q in questions {
        counts[q.difficulty as usize] += 1;
    }
    let max = counts.iter().copied().max().unwrap_or(0);
    let leaders: Vec<Difficulty> = Difficulty::ALL
        .into_iter()
        .filter(|d| max > 0 && counts[*d as usize] == max)
        .collect();
    match leaders.as_slice() {
        [only] => *only,
        _ => Difficulty::Intermediate,
    }
}
