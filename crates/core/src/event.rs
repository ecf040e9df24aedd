// Notification channels between engine, session controller, and host

use crate::state::SessionPhase;

/// Out-of-band notifications emitted by a media engine after `prepare()`.
///
/// The session controller forwards these to the host uninterpreted; it
/// never retries or masks them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// The engine finished preparing and can render
    Ready,

    /// The queue played to completion
    Completed,

    /// Asynchronous engine failure (decode, network inside the engine, ...)
    Error { message: String },
}

/// Host-facing session notifications
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Session phase changed
    PhaseChanged {
        old_phase: SessionPhase,
        new_phase: SessionPhase,
    },

    /// Engine notification, forwarded unmodified
    Engine(EngineEvent),

    /// The configured sources cannot form a playable queue; there is no
    /// alternate source to fall back to and the session will not retry
    SessionUnrecoverable { reason: String },

    /// Request for distraction-free chrome around the display surface.
    /// Fire-and-forget, no acknowledgement contract.
    ImmersiveRequested,
}

/// Host callback trait
/// Implementations should be lightweight and non-blocking
pub trait SessionCallback: Send + Sync {
    /// Called when an event occurs
    /// This should return quickly to avoid blocking the host's lifecycle thread
    fn on_event(&self, event: SessionEvent);
}
