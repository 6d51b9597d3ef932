//! Listening exercises: records, questions, and the in-memory library.

mod library;
mod model;

pub use library::ExerciseLibrary;
pub use model::{dominant_difficulty, Difficulty, DraftExercise, Exercise, ExerciseType, Question};
