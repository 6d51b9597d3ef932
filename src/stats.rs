//! Practice statistics events handed to an external collaborator.

use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsEvent {
    /// Seconds of audio in the exercise.
    pub duration: f64,
    pub topic: String,
    pub completed_items: u32,
    pub accuracy: f64,
}

pub trait StatsSink: Send + Sync {
    fn record(&self, event: StatsEvent);
}

/// Forwards events over a channel; dropped silently once the receiver is gone.
pub struct ChannelStatsSink {
    tx: mpsc::UnboundedSender<StatsEvent>,
}

impl ChannelStatsSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<StatsEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl StatsSink for ChannelStatsSink {
    fn record(&self, event: StatsEvent) {
        let _ = self.tx.send(event);
    }
}

#[derive(Debug, Default)]
pub struct MemoryStatsSink {
    events: Mutex<Vec<StatsEvent>>,
}

impl MemoryStatsSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<StatsEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl StatsSink for MemoryStatsSink {
    fn record(&self, event: StatsEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
