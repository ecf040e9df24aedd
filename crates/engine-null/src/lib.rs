// Headless no-op media engine
// For embeddings without a real engine wired up yet, and for exercising
// the session layer end to end.

use fermata_core::{EngineEvent, PlaybackSource, Result};
use fermata_engine_api::{
    EngineConfig, EngineEventSink, EngineFactory, MediaEngine, SurfaceHandle,
};
use std::sync::Arc;

/// Media engine that renders nothing.
///
/// Transport state behaves like a paused real engine: position and queue
/// index only move when commanded. `prepare()` reports readiness through
/// the sink immediately, so a release that follows never has an in-flight
/// prepare left to cancel.
pub struct NullEngine {
    sink: Arc<dyn EngineEventSink>,
    queue: Vec<PlaybackSource>,
    queue_index: usize,
    position_ms: u64,
    play_when_ready: bool,
    surface: Option<SurfaceHandle>,
    released: bool,
}

impl NullEngine {
    pub fn new(sink: Arc<dyn EngineEventSink>) -> Self {
        Self {
            sink,
            queue: Vec::new(),
            queue_index: 0,
            position_ms: 0,
            play_when_ready: false,
            surface: None,
            released: false,
        }
    }

    /// Queue entries as last submitted
    pub fn queue(&self) -> &[PlaybackSource] {
        &self.queue
    }

    pub fn bound_surface(&self) -> Option<SurfaceHandle> {
        self.surface
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl MediaEngine for NullEngine {
    fn set_queue(&mut self, queue: &[PlaybackSource]) {
        self.queue = queue.to_vec();
    }

    fn seek(&mut self, queue_index: usize, position_ms: u64) {
        self.queue_index = queue_index;
        self.position_ms = position_ms;
    }

    fn set_play_when_ready(&mut self, play_when_ready: bool) {
        self.play_when_ready = play_when_ready;
    }

    fn prepare(&mut self) {
        if self.released {
            log::warn!("prepare on a released null engine");
            return;
        }
        self.sink.on_engine_event(EngineEvent::Ready);
    }

    fn position_ms(&self) -> u64 {
        self.position_ms
    }

    fn current_queue_index(&self) -> usize {
        self.queue_index
    }

    fn play_when_ready(&self) -> bool {
        self.play_when_ready
    }

    fn bind_surface(&mut self, surface: SurfaceHandle) {
        self.surface = Some(surface);
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.queue.clear();
    }
}

/// Factory producing [`NullEngine`] handles
#[derive(Default)]
pub struct NullEngineFactory;

impl EngineFactory for NullEngineFactory {
    fn create(
        &self,
        config: &EngineConfig,
        sink: Arc<dyn EngineEventSink>,
    ) -> Result<Box<dyn MediaEngine>> {
        if let Some(ceiling) = config.quality_ceiling {
            log::debug!("null engine ignores quality ceiling {:?}", ceiling);
        }
        Ok(Box::new(NullEngine::new(sink)))
    }
}
