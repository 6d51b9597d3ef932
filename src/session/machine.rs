//! Exercise session state machine: selection, playback position, answers, bookmarks.

use super::player::PlaybackBackend;
use crate::acquisition::AudioStore;
use crate::exercise::{Exercise, Question};
use crate::generation::QuestionGenerator;
use crate::stats::{StatsEvent, StatsSink};
use log::{debug, info, warn};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    NoSelection,
    Prepared,
    Playing,
    Paused,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("no exercise selected")]
    NoSelection,
    #[error("cannot {action} while {state:?}")]
    InvalidTransition {
        action: &'static str,
        state: SessionState,
    },
    #[error("no audio resource loaded")]
    NotLoaded,
    #[error("question {0} does not exist")]
    QuestionOutOfRange(usize),
    #[error("option {option} does not exist for question {question}")]
    OptionOutOfRange { question: usize, option: usize },
    #[error("the active exercise changed before its questions were ready")]
    SelectionChanged,
    #[error("session task has stopped")]
    Closed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub current_time: f64,
    pub progress: f64,
    pub duration: f64,
    pub error: Option<String>,
    pub exercise: Option<Exercise>,
}

pub struct ExerciseSession {
    player: Box<dyn PlaybackBackend>,
    store: AudioStore,
    generator: Arc<QuestionGenerator>,
    stats: Arc<dyn StatsSink>,
    state: SessionState,
    exercise: Option<Exercise>,
    duration: f64,
    current_time: f64,
    progress: f64,
    error: Option<String>,
}

impl ExerciseSession {
    pub fn new(
        player: Box<dyn PlaybackBackend>,
        store: AudioStore,
        generator: Arc<QuestionGenerator>,
        stats: Arc<dyn StatsSink>,
    ) -> Self {
        Self {
            player,
            store,
            generator,
            stats,
            state: SessionState::NoSelection,
            exercise: None,
            duration: 0.0,
            current_time: 0.0,
            progress: 0.0,
            error: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn exercise(&self) -> Option<&Exercise> {
        self.exercise.as_ref()
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            current_time: self.current_time,
            progress: self.progress,
            duration: self.duration,
            error: self.error.clone(),
            exercise: self.exercise.clone(),
        }
    }

    fn reset_position(&mut self) {
        self.duration = 0.0;
        self.current_time = 0.0;
        self.progress = 0.0;
        self.error = None;
    }

    /// Make `exercise` active from any state. Returns the previously active exercise.
    /// A missing audio file is recorded in `error`; the state is still `Prepared`.
    pub fn select(&mut self, exercise: Exercise) -> Option<Exercise> {
        self.player.unload();
        self.reset_position();
        self.state = SessionState::Prepared;

        let path = self.store.path_for(&exercise.audio_file_name);
        match self.player.load(&path, exercise.duration) {
            Ok(duration) => self.duration = duration,
            Err(e) => {
                warn!("[session] could not load {}: {}", exercise.audio_file_name, e);
                self.error = Some(e.to_string());
            }
        }
        info!("[session] selected {} ({})", exercise.title, exercise.id);
        self.exercise.replace(exercise)
    }

    /// Leave the session empty. Returns the exercise that was active.
    pub fn deselect(&mut self) -> Option<Exercise> {
        self.player.unload();
        self.reset_position();
        self.state = SessionState::NoSelection;
        self.exercise.take()
    }

    pub fn play(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::NoSelection => Err(SessionError::NoSelection),
            SessionState::Playing => Ok(()),
            SessionState::Prepared | SessionState::Paused => {
                if !self.player.is_loaded() {
                    self.error = Some(SessionError::NotLoaded.to_string());
                    return Ok(());
                }
                if self.duration > 0.0 && self.current_time >= self.duration {
                    self.apply_position(0.0);
                }
                self.player.play();
                self.state = SessionState::Playing;
                Ok(())
            }
        }
    }

    pub fn pause(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Playing => {
                self.player.pause();
                self.refresh_position();
                self.state = SessionState::Paused;
                Ok(())
            }
            SessionState::Paused => Ok(()),
            state => Err(SessionError::InvalidTransition {
                action: "pause",
                state,
            }),
        }
    }

    /// Sampler tick: update time and progress, pausing at the end of the audio.
    pub fn sample(&mut self) {
        if self.state != SessionState::Playing {
            return;
        }
        let position = self.player.position();
        self.set_sampled(position);
        if self.duration > 0.0 && position >= self.duration {
            debug!("[session] reached end of audio");
            self.player.pause();
            self.state = SessionState::Paused;
        }
    }

    /// Jump to `fraction` of the duration, clamped to [0, 1].
    pub fn seek(&mut self, fraction: f64) -> Result<(), SessionError> {
        self.ensure_loaded()?;
        let fraction = if fraction.is_nan() { 0.0 } else { fraction.clamp(0.0, 1.0) };
        self.apply_position(fraction * self.duration);
        Ok(())
    }

    pub fn forward(&mut self, delta: f64) -> Result<(), SessionError> {
        self.ensure_loaded()?;
        self.refresh_position();
        self.apply_position(self.current_time + delta.abs());
        Ok(())
    }

    pub fn backward(&mut self, delta: f64) -> Result<(), SessionError> {
        self.ensure_loaded()?;
        self.refresh_position();
        self.apply_position(self.current_time - delta.abs());
        Ok(())
    }

    /// Record an answer. Returns whether it was correct; correct answers emit a stats event.
    pub fn submit_answer(&mut self, question: usize, option: usize) -> Result<bool, SessionError> {
        let exercise = self.exercise.as_mut().ok_or(SessionError::NoSelection)?;
        let q = exercise
            .questions
            .get_mut(question)
            .ok_or(SessionError::QuestionOutOfRange(question))?;
        if option >= q.options.len() {
            return Err(SessionError::OptionOutOfRange { question, option });
        }
        q.user_selected = Some(option);
        let correct = q.is_correct();
        exercise.user_selected = Some(option);

        if correct {
            self.stats.record(StatsEvent {
                duration: exercise.duration,
                topic: exercise.title.clone(),
                completed_items: 1,
                accuracy: 1.0,
            });
        }
        Ok(correct)
    }

    /// Bookmark the current playback position and return it.
    pub fn mark_timestamp(&mut self) -> Result<f64, SessionError> {
        if self.exercise.is_none() {
            return Err(SessionError::NoSelection);
        }
        self.refresh_position();
        let at = self.current_time;
        if let Some(exercise) = self.exercise.as_mut() {
            exercise.bookmarks.push(at);
        }
        Ok(at)
    }

    /// Replace the active exercise's questions, keeping its identity and audio.
    pub async fn regenerate_questions(&mut self) -> Result<(), SessionError> {
        let (generator, exercise) = self.regeneration_request()?;
        let questions = generator.generate_for(&exercise).await;
        self.apply_questions(exercise.id, questions)
    }

    /// Generator and a copy of the active exercise, for generating off the session task.
    pub fn regeneration_request(&self) -> Result<(Arc<QuestionGenerator>, Exercise), SessionError> {
        let exercise = self.exercise.clone().ok_or(SessionError::NoSelection)?;
        Ok((Arc::clone(&self.generator), exercise))
    }

    /// Install regenerated questions if `exercise_id` is still the active exercise.
    pub fn apply_questions(
        &mut self,
        exercise_id: Uuid,
        questions: Vec<Question>,
    ) -> Result<(), SessionError> {
        let exercise = self.exercise.as_mut().ok_or(SessionError::NoSelection)?;
        if exercise.id != exercise_id {
            debug!("[session] dropping questions generated for {}", exercise_id);
            return Err(SessionError::SelectionChanged);
        }
        info!(
            "[session] regenerated {} questions for {}",
            questions.len(),
            exercise.id
        );
        exercise.questions = questions;
        exercise.user_selected = None;
        Ok(())
    }

    fn ensure_loaded(&self) -> Result<(), SessionError> {
        if self.exercise.is_none() {
            Err(SessionError::NoSelection)
        } else if !self.player.is_loaded() {
            Err(SessionError::NotLoaded)
        } else {
            Ok(())
        }
    }

    fn refresh_position(&mut self) {
        if self.player.is_loaded() {
            let position = self.player.position();
            self.set_sampled(position);
        }
    }

    fn set_sampled(&mut self, position: f64) {
        self.current_time = position.clamp(0.0, self.duration.max(0.0));
        self.progress = if self.duration > 0.0 {
            self.current_time / self.duration
        } else {
            0.0
        };
    }

    fn apply_position(&mut self, position: f64) {
        let clamped = if position.is_nan() {
            0.0
        } else {
            position.clamp(0.0, self.duration.max(0.0))
        };
        self.player.seek(clamped);
        self.set_sampled(clamped);
    }
}
