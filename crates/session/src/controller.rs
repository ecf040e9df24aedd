// Playback session lifecycle state machine

use crate::lifecycle::{HostCapabilities, PhaseEvent};
use fermata_core::{
    build_queue, EngineEvent, PlaybackSource, SessionCallback, SessionEvent, SessionPhase,
    SessionState,
};
use fermata_engine_api::{
    EngineConfig, EngineEventSink, EngineFactory, MediaEngine, SurfaceHandle,
};
use std::sync::Arc;

/// Construction parameters for a session controller
#[derive(Clone)]
pub struct SessionConfig {
    /// Queue contents, in playback order
    pub sources: Vec<PlaybackSource>,
    /// Display surface the engine renders into
    pub surface: SurfaceHandle,
    /// Platform tier of the host
    pub capabilities: HostCapabilities,
    /// Parameters for engine creation
    pub engine: EngineConfig,
    /// Snapshot restored from a previous session; the default resumes at
    /// the start of the queue with playback enabled
    pub restore_state: SessionState,
}

impl SessionConfig {
    pub fn new(surface: SurfaceHandle) -> Self {
        Self {
            sources: Vec::new(),
            surface,
            capabilities: HostCapabilities::default(),
            engine: EngineConfig::default(),
            restore_state: SessionState::default(),
        }
    }

    pub fn with_sources(mut self, sources: Vec<PlaybackSource>) -> Self {
        self.sources = sources;
        self
    }

    pub fn with_capabilities(mut self, capabilities: HostCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_engine(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_restore_state(mut self, state: SessionState) -> Self {
        self.restore_state = state;
        self
    }
}

/// Forwards engine notifications to the host unmodified
struct EngineForwarder {
    host: Arc<dyn SessionCallback>,
}

impl EngineEventSink for EngineForwarder {
    fn on_engine_event(&self, event: EngineEvent) {
        self.host.on_event(SessionEvent::Engine(event));
    }
}

struct ActiveEngine {
    handle: Box<dyn MediaEngine>,
    /// Surface the handle was bound to at activation
    surface: SurfaceHandle,
    prepared: bool,
}

enum Slot {
    Idle,
    Active(ActiveEngine),
}

/// Owns the lifecycle and state of exactly one playback session bound to
/// one display surface.
///
/// Phase events arrive on the host's serial callback context; no method
/// here blocks, and engine commands are fire-and-forget. The engine handle
/// exists exactly while the session is active; the last known
/// [`SessionState`] survives across engine destroy/recreate cycles.
pub struct PlaybackSessionController {
    slot: Slot,
    saved: SessionState,
    sources: Vec<PlaybackSource>,
    surface: SurfaceHandle,
    capabilities: HostCapabilities,
    engine_config: EngineConfig,
    factory: Arc<dyn EngineFactory>,
    callback: Arc<dyn SessionCallback>,
}

impl PlaybackSessionController {
    pub fn new(
        config: SessionConfig,
        factory: Arc<dyn EngineFactory>,
        callback: Arc<dyn SessionCallback>,
    ) -> Self {
        Self {
            slot: Slot::Idle,
            saved: config.restore_state,
            sources: config.sources,
            surface: config.surface,
            capabilities: config.capabilities,
            engine_config: config.engine,
            factory,
            callback,
        }
    }

    /// Single host entry point. Fire-and-forget: never returns an error and
    /// never blocks.
    pub fn on_phase_event(&mut self, event: PhaseEvent) {
        log::debug!("phase event: {:?}", event);
        match event {
            PhaseEvent::ForegroundStart => {
                // Eager tier: the engine may exist as soon as the surface
                // is visible
                if self.capabilities.background_survival {
                    self.activate();
                }
            }
            PhaseEvent::Resume => {
                self.callback.on_event(SessionEvent::ImmersiveRequested);
                if !self.capabilities.background_survival || !self.is_active() {
                    self.activate();
                }
            }
            PhaseEvent::Pause => {
                if !self.capabilities.background_survival {
                    self.deactivate();
                }
            }
            PhaseEvent::BackgroundStop => {
                if self.capabilities.background_survival {
                    self.deactivate();
                }
            }
        }
    }

    pub fn phase(&self) -> SessionPhase {
        match self.slot {
            Slot::Idle => SessionPhase::Idle,
            Slot::Active(_) => SessionPhase::Active,
        }
    }

    /// Last known snapshot. Hosts persist this to survive process death.
    pub fn session_state(&self) -> SessionState {
        self.saved
    }

    /// Hand over a recreated display surface; takes effect at the next
    /// activation
    pub fn set_surface(&mut self, surface: SurfaceHandle) {
        self.surface = surface;
    }

    /// Replace the queue contents. Ignored while the session is active.
    pub fn set_sources(&mut self, sources: Vec<PlaybackSource>) {
        if self.is_active() {
            log::warn!("ignoring source update while the session is active");
            return;
        }
        self.sources = sources;
    }

    /// Append one source to the queue. Ignored while the session is active.
    pub fn push_source(&mut self, source: PlaybackSource) {
        if self.is_active() {
            log::warn!("ignoring source update while the session is active");
            return;
        }
        self.sources.push(source);
    }

    fn is_active(&self) -> bool {
        matches!(self.slot, Slot::Active(_))
    }

    /// Create, configure, and prepare an engine handle. Idempotent: a
    /// second call while a handle is live is a no-op.
    fn activate(&mut self) {
        if let Slot::Active(active) = &self.slot {
            if active.surface != self.surface {
                panic!(
                    "activate() while a live engine is bound to a different surface \
                     (bound {:?}, current {:?})",
                    active.surface, self.surface
                );
            }
            log::debug!("activate: engine already live");
            return;
        }

        let queue = match build_queue(&self.sources) {
            Ok(queue) => queue,
            Err(err) => {
                log::error!("cannot build playback queue: {}", err);
                self.callback.on_event(SessionEvent::SessionUnrecoverable {
                    reason: err.to_string(),
                });
                return;
            }
        };

        let sink = Arc::new(EngineForwarder {
            host: self.callback.clone(),
        });
        let mut handle = match self.factory.create(&self.engine_config, sink) {
            Ok(handle) => handle,
            Err(err) => {
                log::error!("engine creation failed: {}", err);
                self.callback.on_event(SessionEvent::SessionUnrecoverable {
                    reason: err.to_string(),
                });
                return;
            }
        };

        log::info!(
            "activating session: {} queue entries, resume at entry {} / {} ms",
            queue.len(),
            self.saved.queue_index,
            self.saved.position_ms
        );
        handle.bind_surface(self.surface);
        handle.set_queue(&queue);
        handle.seek(self.saved.queue_index, self.saved.position_ms);
        handle.set_play_when_ready(self.saved.play_when_ready);
        handle.prepare();

        self.slot = Slot::Active(ActiveEngine {
            handle,
            surface: self.surface,
            prepared: true,
        });
        self.notify_phase(SessionPhase::Idle, SessionPhase::Active);
    }

    /// Snapshot playback state from the live handle and release it.
    /// Idempotent: calling while idle is a no-op.
    fn deactivate(&mut self) {
        let mut active = match std::mem::replace(&mut self.slot, Slot::Idle) {
            Slot::Active(active) => active,
            Slot::Idle => {
                log::debug!("deactivate: already idle");
                return;
            }
        };
        assert!(
            active.prepared,
            "deactivate() on an engine handle that was never prepared"
        );

        // Atomic snapshot: no engine command between these reads and the
        // release below.
        self.saved = SessionState {
            queue_index: active.handle.current_queue_index(),
            position_ms: active.handle.position_ms(),
            play_when_ready: active.handle.play_when_ready(),
        };
        active.handle.release();

        log::info!(
            "session deactivated at entry {} / {} ms",
            self.saved.queue_index,
            self.saved.position_ms
        );
        self.notify_phase(SessionPhase::Active, SessionPhase::Idle);
    }

    fn notify_phase(&self, old_phase: SessionPhase, new_phase: SessionPhase) {
        self.callback.on_event(SessionEvent::PhaseChanged {
            old_phase,
            new_phase,
        });
    }
}

impl Drop for PlaybackSessionController {
    fn drop(&mut self) {
        if let Slot::Active(active) = &mut self.slot {
            log::debug!("controller dropped while active, releasing engine");
            active.handle.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fermata_core::Result;
    use fermata_engine_api::QualityCeiling;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct FakeEngineState {
        queues: Vec<Vec<PlaybackSource>>,
        queue_index: usize,
        position_ms: u64,
        play_when_ready: bool,
        prepare_calls: usize,
        release_calls: usize,
        bound_surfaces: Vec<SurfaceHandle>,
    }

    struct FakeEngine {
        state: Arc<Mutex<FakeEngineState>>,
    }

    impl MediaEngine for FakeEngine {
        fn set_queue(&mut self, queue: &[PlaybackSource]) {
            self.state.lock().queues.push(queue.to_vec());
        }

        fn seek(&mut self, queue_index: usize, position_ms: u64) {
            let mut state = self.state.lock();
            state.queue_index = queue_index;
            state.position_ms = position_ms;
        }

        fn set_play_when_ready(&mut self, play_when_ready: bool) {
            self.state.lock().play_when_ready = play_when_ready;
        }

        fn prepare(&mut self) {
            self.state.lock().prepare_calls += 1;
        }

        fn position_ms(&self) -> u64 {
            self.state.lock().position_ms
        }

        fn current_queue_index(&self) -> usize {
            self.state.lock().queue_index
        }

        fn play_when_ready(&self) -> bool {
            self.state.lock().play_when_ready
        }

        fn bind_surface(&mut self, surface: SurfaceHandle) {
            self.state.lock().bound_surfaces.push(surface);
        }

        fn release(&mut self) {
            self.state.lock().release_calls += 1;
        }
    }

    #[derive(Default)]
    struct FakeFactory {
        engines: Mutex<Vec<Arc<Mutex<FakeEngineState>>>>,
        sinks: Mutex<Vec<Arc<dyn EngineEventSink>>>,
        configs: Mutex<Vec<EngineConfig>>,
    }

    impl EngineFactory for FakeFactory {
        fn create(
            &self,
            config: &EngineConfig,
            sink: Arc<dyn EngineEventSink>,
        ) -> Result<Box<dyn MediaEngine>> {
            let state = Arc::new(Mutex::new(FakeEngineState::default()));
            self.engines.lock().push(state.clone());
            self.sinks.lock().push(sink);
            self.configs.lock().push(*config);
            Ok(Box::new(FakeEngine { state }))
        }
    }

    impl FakeFactory {
        fn created(&self) -> usize {
            self.engines.lock().len()
        }

        fn engine(&self, index: usize) -> Arc<Mutex<FakeEngineState>> {
            self.engines.lock()[index].clone()
        }

        fn sink(&self, index: usize) -> Arc<dyn EngineEventSink> {
            self.sinks.lock()[index].clone()
        }
    }

    #[derive(Default)]
    struct RecordingCallback {
        events: Mutex<Vec<SessionEvent>>,
    }

    impl SessionCallback for RecordingCallback {
        fn on_event(&self, event: SessionEvent) {
            self.events.lock().push(event);
        }
    }

    impl RecordingCallback {
        fn events(&self) -> Vec<SessionEvent> {
            self.events.lock().clone()
        }
    }

    fn two_sources() -> Vec<PlaybackSource> {
        vec![
            PlaybackSource::new("https://example.com/a.mp4"),
            PlaybackSource::new("https://example.com/b.mp3"),
        ]
    }

    fn harness(
        config: SessionConfig,
    ) -> (
        PlaybackSessionController,
        Arc<FakeFactory>,
        Arc<RecordingCallback>,
    ) {
        let factory = Arc::new(FakeFactory::default());
        let callback = Arc::new(RecordingCallback::default());
        let controller =
            PlaybackSessionController::new(config, factory.clone(), callback.clone());
        (controller, factory, callback)
    }

    fn surface() -> SurfaceHandle {
        SurfaceHandle::new(7)
    }

    #[test]
    fn test_activation_is_idempotent() {
        let config = SessionConfig::new(surface())
            .with_sources(two_sources())
            .with_capabilities(HostCapabilities::background_survival(false));
        let (mut controller, factory, _callback) = harness(config);

        controller.on_phase_event(PhaseEvent::Resume);
        controller.on_phase_event(PhaseEvent::Resume);

        assert_eq!(factory.created(), 1);
        let engine = factory.engine(0);
        let state = engine.lock();
        assert_eq!(state.queues.len(), 1);
        assert_eq!(state.prepare_calls, 1);
    }

    #[test]
    fn test_deactivation_while_idle_is_noop() {
        let config = SessionConfig::new(surface())
            .with_sources(two_sources())
            .with_capabilities(HostCapabilities::background_survival(false));
        let (mut controller, factory, _callback) = harness(config);

        controller.on_phase_event(PhaseEvent::Pause);

        assert_eq!(controller.phase(), SessionPhase::Idle);
        assert_eq!(factory.created(), 0);
    }

    #[test]
    fn test_session_state_round_trip() {
        let restored = SessionState {
            queue_index: 1,
            position_ms: 5000,
            play_when_ready: false,
        };
        let config = SessionConfig::new(surface())
            .with_sources(two_sources())
            .with_capabilities(HostCapabilities::background_survival(false))
            .with_restore_state(restored);
        let (mut controller, _factory, _callback) = harness(config);

        controller.on_phase_event(PhaseEvent::Resume);
        // No time elapses: the engine reports exactly what was applied
        controller.on_phase_event(PhaseEvent::Pause);

        assert_eq!(controller.session_state(), restored);
    }

    #[test]
    fn test_pause_keeps_engine_on_surviving_tier() {
        let config = SessionConfig::new(surface())
            .with_sources(two_sources())
            .with_capabilities(HostCapabilities::background_survival(true));
        let (mut controller, factory, _callback) = harness(config);

        controller.on_phase_event(PhaseEvent::ForegroundStart);
        controller.on_phase_event(PhaseEvent::Resume);
        controller.on_phase_event(PhaseEvent::Pause);

        assert_eq!(controller.phase(), SessionPhase::Active);
        assert_eq!(factory.engine(0).lock().release_calls, 0);

        controller.on_phase_event(PhaseEvent::BackgroundStop);

        assert_eq!(controller.phase(), SessionPhase::Idle);
        assert_eq!(factory.engine(0).lock().release_calls, 1);
        assert_eq!(factory.created(), 1);
    }

    #[test]
    fn test_pause_releases_engine_on_non_surviving_tier() {
        let config = SessionConfig::new(surface())
            .with_sources(two_sources())
            .with_capabilities(HostCapabilities::background_survival(false));
        let (mut controller, factory, _callback) = harness(config);

        // ForegroundStart is not a trigger on this tier
        controller.on_phase_event(PhaseEvent::ForegroundStart);
        assert_eq!(factory.created(), 0);

        controller.on_phase_event(PhaseEvent::Resume);
        assert_eq!(controller.phase(), SessionPhase::Active);

        controller.on_phase_event(PhaseEvent::Pause);
        assert_eq!(controller.phase(), SessionPhase::Idle);
        assert_eq!(factory.engine(0).lock().release_calls, 1);

        // BackgroundStop after the release is a no-op
        controller.on_phase_event(PhaseEvent::BackgroundStop);
        assert_eq!(controller.phase(), SessionPhase::Idle);
    }

    #[test]
    fn test_queue_order_preserved() {
        let config = SessionConfig::new(surface())
            .with_sources(two_sources())
            .with_capabilities(HostCapabilities::background_survival(false));
        let (mut controller, factory, _callback) = harness(config);

        controller.on_phase_event(PhaseEvent::Resume);

        let engine = factory.engine(0);
        let state = engine.lock();
        let queue = &state.queues[0];
        assert_eq!(queue[0].uri(), "https://example.com/a.mp4");
        assert_eq!(queue[1].uri(), "https://example.com/b.mp3");
        assert_eq!(queue[0].index(), 0);
        assert_eq!(queue[1].index(), 1);
    }

    #[test]
    fn test_quality_ceiling_reaches_factory() {
        let config = SessionConfig::new(surface())
            .with_sources(two_sources())
            .with_capabilities(HostCapabilities::background_survival(false))
            .with_engine(EngineConfig::bandwidth_conscious());
        let (mut controller, factory, _callback) = harness(config);

        controller.on_phase_event(PhaseEvent::Resume);

        let configs = factory.configs.lock();
        assert_eq!(
            configs[0].quality_ceiling,
            Some(QualityCeiling::StandardDefinition)
        );
    }

    #[test]
    fn test_no_ceiling_by_default() {
        let config = SessionConfig::new(surface())
            .with_sources(two_sources())
            .with_capabilities(HostCapabilities::background_survival(false));
        let (mut controller, factory, _callback) = harness(config);

        controller.on_phase_event(PhaseEvent::Resume);

        assert!(factory.configs.lock()[0].quality_ceiling.is_none());
    }

    #[test]
    fn test_engine_error_forwarded_unchanged() {
        let config = SessionConfig::new(surface())
            .with_sources(two_sources())
            .with_capabilities(HostCapabilities::background_survival(false));
        let (mut controller, factory, callback) = harness(config);

        controller.on_phase_event(PhaseEvent::Resume);
        factory.sink(0).on_engine_event(EngineEvent::Error {
            message: "decoder init failed".to_string(),
        });

        assert!(callback.events().contains(&SessionEvent::Engine(
            EngineEvent::Error {
                message: "decoder init failed".to_string(),
            }
        )));

        // A failed-but-releasable engine still deactivates cleanly
        controller.on_phase_event(PhaseEvent::Pause);
        assert_eq!(controller.phase(), SessionPhase::Idle);
        assert_eq!(factory.engine(0).lock().release_calls, 1);
    }

    #[test]
    fn test_resume_requests_immersive_chrome() {
        let config = SessionConfig::new(surface())
            .with_sources(two_sources())
            .with_capabilities(HostCapabilities::background_survival(true));
        let (mut controller, _factory, callback) = harness(config);

        controller.on_phase_event(PhaseEvent::Resume);
        controller.on_phase_event(PhaseEvent::Pause);
        controller.on_phase_event(PhaseEvent::Resume);

        let immersive = callback
            .events()
            .iter()
            .filter(|event| **event == SessionEvent::ImmersiveRequested)
            .count();
        assert_eq!(immersive, 2);
    }

    #[test]
    fn test_empty_queue_is_unrecoverable() {
        let config = SessionConfig::new(surface())
            .with_capabilities(HostCapabilities::background_survival(false));
        let (mut controller, factory, callback) = harness(config);

        controller.on_phase_event(PhaseEvent::Resume);

        assert_eq!(controller.phase(), SessionPhase::Idle);
        assert_eq!(factory.created(), 0);
        assert!(callback
            .events()
            .iter()
            .any(|event| matches!(event, SessionEvent::SessionUnrecoverable { .. })));
    }

    #[test]
    fn test_corrected_sources_recover_on_next_activation() {
        let config = SessionConfig::new(surface())
            .with_capabilities(HostCapabilities::background_survival(false));
        let (mut controller, factory, _callback) = harness(config);

        controller.on_phase_event(PhaseEvent::Resume);
        assert_eq!(factory.created(), 0);

        controller.set_sources(two_sources());
        controller.on_phase_event(PhaseEvent::Resume);
        assert_eq!(controller.phase(), SessionPhase::Active);
        assert_eq!(factory.created(), 1);
    }

    #[test]
    fn test_source_updates_ignored_while_active() {
        let config = SessionConfig::new(surface())
            .with_sources(two_sources())
            .with_capabilities(HostCapabilities::background_survival(false));
        let (mut controller, factory, _callback) = harness(config);

        controller.on_phase_event(PhaseEvent::Resume);
        controller.push_source(PlaybackSource::new("https://example.com/c.mp3"));
        controller.on_phase_event(PhaseEvent::Pause);
        controller.on_phase_event(PhaseEvent::Resume);

        // The ignored push never reached a queue
        let engine = factory.engine(1);
        let state = engine.lock();
        assert_eq!(state.queues[0].len(), 2);
    }

    #[test]
    fn test_surface_handover_applies_on_next_activation() {
        let config = SessionConfig::new(surface())
            .with_sources(two_sources())
            .with_capabilities(HostCapabilities::background_survival(false));
        let (mut controller, factory, _callback) = harness(config);

        controller.on_phase_event(PhaseEvent::Resume);
        controller.on_phase_event(PhaseEvent::Pause);

        let replacement = SurfaceHandle::new(8);
        controller.set_surface(replacement);
        controller.on_phase_event(PhaseEvent::Resume);

        assert_eq!(factory.engine(1).lock().bound_surfaces, vec![replacement]);
    }

    #[test]
    #[should_panic(expected = "different surface")]
    fn test_stale_surface_binding_fails_fast() {
        let config = SessionConfig::new(surface())
            .with_sources(two_sources())
            .with_capabilities(HostCapabilities::background_survival(true));
        let (mut controller, _factory, _callback) = harness(config);

        controller.on_phase_event(PhaseEvent::ForegroundStart);
        controller.set_surface(SurfaceHandle::new(8));
        // Activation with a live handle bound to the old surface is a
        // programming-contract fault
        controller.on_phase_event(PhaseEvent::ForegroundStart);
    }

    #[test]
    fn test_phase_changes_reported() {
        let config = SessionConfig::new(surface())
            .with_sources(two_sources())
            .with_capabilities(HostCapabilities::background_survival(false));
        let (mut controller, _factory, callback) = harness(config);

        controller.on_phase_event(PhaseEvent::Resume);
        controller.on_phase_event(PhaseEvent::Pause);

        let phases: Vec<SessionEvent> = callback
            .events()
            .into_iter()
            .filter(|event| matches!(event, SessionEvent::PhaseChanged { .. }))
            .collect();
        assert_eq!(
            phases,
            vec![
                SessionEvent::PhaseChanged {
                    old_phase: SessionPhase::Idle,
                    new_phase: SessionPhase::Active,
                },
                SessionEvent::PhaseChanged {
                    old_phase: SessionPhase::Active,
                    new_phase: SessionPhase::Idle,
                },
            ]
        );
    }

    #[test]
    fn test_play_intent_survives_suspend_resume_cycle() {
        let config = SessionConfig::new(surface())
            .with_sources(two_sources())
            .with_capabilities(HostCapabilities::background_survival(false));
        let (mut controller, factory, _callback) = harness(config);

        controller.on_phase_event(PhaseEvent::Resume);
        // Host paused playback inside the engine before being suspended
        factory.engine(0).lock().play_when_ready = false;
        factory.engine(0).lock().position_ms = 42_000;
        controller.on_phase_event(PhaseEvent::Pause);

        controller.on_phase_event(PhaseEvent::Resume);
        let engine = factory.engine(1);
        let state = engine.lock();
        assert!(!state.play_when_ready);
        assert_eq!(state.position_ms, 42_000);
    }
}
