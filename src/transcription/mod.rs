//! Speech-to-text over a cloud recognition service.

mod backend;
mod retry;
mod speech;

pub use backend::Transcriber;
pub use retry::{Backoff, RetryPolicy};
pub use speech::SpeechClient;
