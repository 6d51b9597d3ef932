//! Playback backends driven by the session machine.

use crate::error::{PipelineError, Result};
use std::path::Path;
use tokio::time::Instant;

pub trait PlaybackBackend: Send {
    /// Open the resource and return its duration in seconds.
    fn load(&mut self, path: &Path, duration_hint: f64) -> Result<f64>;
    /// Stop playback and release the resource.
    fn unload(&mut self);
    fn is_loaded(&self) -> bool;
    fn play(&mut self);
    fn pause(&mut self);
    fn seek(&mut self, position: f64);
    /// Current position in seconds.
    fn position(&self) -> f64;
}

/// Tracks a playhead against the tokio clock without producing sound.
#[derive(Debug, Default)]
pub struct SimulatedPlayer {
    loaded: bool,
    duration: f64,
    base: f64,
    started: Option<Instant>,
}

impl SimulatedPlayer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PlaybackBackend for SimulatedPlayer {
    fn load(&mut self, path: &Path, duration_hint: f64) -> Result<f64> {
        self.unload();
        if !path.is_file() {
            return Err(PipelineError::Playback(format!(
                "audio resource not found: {}",
                path.display()
            )));
        }
        self.loaded = true;
        self.duration = duration_hint.max(0.0);
        Ok(self.duration)
    }

    fn unload(&mut self) {
        *self = Self::default();
    }

    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn play(&mut self) {
        if self.loaded && self.started.is_none() {
            self.started = Some(Instant::now());
        }
    }

    fn pause(&mut self) {
        self.base = self.position();
        self.started = None;
    }

    fn seek(&mut self, position: f64) {
        self.base = position.clamp(0.0, self.duration);
        if self.started.is_some() {
            self.started = Some(Instant::now());
        }
    }

    fn position(&self) -> f64 {
        let elapsed = self
            .started
            .map(|s| s.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        (self.base + elapsed).min(self.duration)
    }
}
