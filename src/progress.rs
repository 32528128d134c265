//! Progress reporting sinks

use crate::types::Event;
use std::sync::Mutex;

/// Receives progress events from a backup run
pub trait Progress: Send + Sync {
    /// Handle one event
    fn emit(&self, event: Event);
}

/// Prints each event as a line on stdout
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleProgress;

impl Progress for ConsoleProgress {
    fn emit(&self, event: Event) {
        println!("{event}");
    }
}

/// Discards events
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentProgress;

impl Progress for SilentProgress {
    fn emit(&self, _event: Event) {}
}

/// Keeps every event in memory, in order
#[derive(Debug, Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<Event>>,
}

impl RecordingProgress {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far
    pub fn events(&self) -> Vec<Event> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Progress for RecordingProgress {
    fn emit(&self, event: Event) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}
