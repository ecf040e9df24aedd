// Media engine capability contract

use crate::config::EngineConfig;
use fermata_core::{EngineEvent, PlaybackSource, Result};
use std::sync::Arc;

/// Opaque handle identifying the host display surface an engine renders
/// into. The session layer never inspects it; it only passes it through
/// and compares identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceHandle(u64);

impl SurfaceHandle {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Receiver for out-of-band engine notifications.
/// Engines may deliver from their own threads.
pub trait EngineEventSink: Send + Sync {
    fn on_engine_event(&self, event: EngineEvent);
}

/// Live media engine handle
/// All engine implementations must implement this trait
pub trait MediaEngine: Send {
    /// Submit the playback queue, replacing any previous one.
    /// Insertion order is significant and must be preserved.
    fn set_queue(&mut self, queue: &[PlaybackSource]);

    /// Move playback to a queue entry and offset within it
    fn seek(&mut self, queue_index: usize, position_ms: u64);

    /// Set whether playback starts automatically once ready
    fn set_play_when_ready(&mut self, play_when_ready: bool);

    /// Begin loading the queue. Asynchronous: failures are reported
    /// through the event sink, never as a return value.
    fn prepare(&mut self);

    /// Current playback offset within the active source, in milliseconds
    fn position_ms(&self) -> u64;

    /// Index of the active queue entry
    fn current_queue_index(&self) -> usize;

    /// Current play-intent
    fn play_when_ready(&self) -> bool;

    /// Attach the engine's video output to a display surface
    fn bind_surface(&mut self, surface: SurfaceHandle);

    /// Release all engine resources. Synchronous and idempotent; cancels
    /// any pending prepare without blocking.
    fn release(&mut self);
}

/// Media engine factory trait
/// Allows the session layer to create engine handles without knowing the
/// concrete engine
pub trait EngineFactory: Send + Sync {
    /// Create a new engine handle with the given configuration.
    /// The sink receives the handle's out-of-band notifications for its
    /// whole lifetime.
    fn create(
        &self,
        config: &EngineConfig,
        sink: Arc<dyn EngineEventSink>,
    ) -> Result<Box<dyn MediaEngine>>;
}
