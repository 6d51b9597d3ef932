//! Exercise session: playback state machine and its serialized task.

mod handle;
mod machine;
mod player;

pub use handle::{SessionHandle, SAMPLE_PERIOD};
pub use machine::{ExerciseSession, SessionError, SessionSnapshot, SessionState};
pub use player::{PlaybackBackend, SimulatedPlayer};
