//! Listening-comprehension exercise pipeline.
//!
//! Audio comes in through [`acquisition`], is transcribed by [`transcription`]
//! with tokens from [`credentials`], gets multiple-choice questions from
//! [`generation`], and is played back and answered through [`session`].

pub mod acquisition;
pub mod clock;
pub mod config;
pub mod credentials;
pub mod error;
pub mod exercise;
pub mod generation;
pub mod logging;
pub mod paths;
pub mod pipeline;
pub mod session;
pub mod stats;
pub mod transcription;

pub use config::AppConfig;
pub use error::{PipelineError, Result, ValidationError};
pub use exercise::{Difficulty, Exercise, ExerciseLibrary, ExerciseType, Question};
pub use pipeline::{ExercisePipeline, IngestOptions, TranscriptPolicy};
pub use session::{ExerciseSession, SessionHandle, SessionState};
