//! Event listeners notified of every emitted event.

use anyhow::Result;
use std::sync::{Arc, Mutex};
use strictly_werewolf_core::GameEvent;
use tracing::debug;

/// Receives every event the moderator emits, in order.
///
/// Errors are logged by the moderator and never affect the game.
pub trait EventListener: Send {
    /// Handles one event.
    fn on_event(&mut self, event: &GameEvent) -> Result<()>;
}

impl<L: EventListener> EventListener for Arc<Mutex<L>> {
    fn on_event(&mut self, event: &GameEvent) -> Result<()> {
        self.lock()
            .map_err(|_| anyhow::anyhow!("listener lock poisoned"))?
            .on_event(event)
    }
}

/// Logs each event at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingListener;

impl EventListener for TracingListener {
    fn on_event(&mut self, event: &GameEvent) -> Result<()> {
        debug!(day = event.day, phase = %event.phase, kind = event.kind.name(), "Event");
        Ok(())
    }
}

/// Keeps a copy of every event.
#[derive(Debug, Default, Clone)]
pub struct EventRecorder {
    events: Vec<GameEvent>,
}

impl EventRecorder {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Events seen so far.
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }
}

impl EventListener for EventRecorder {
    fn on_event(&mut self, event: &GameEvent) -> Result<()> {
        self.events.push(event.clone());
        Ok(())
    }
}
