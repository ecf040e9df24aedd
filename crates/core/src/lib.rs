// Core types for the fermata playback session layer

pub mod error;
pub mod event;
pub mod source;
pub mod state;

// Re-export commonly used types
pub use error::{Result, SessionError};
pub use event::{EngineEvent, SessionCallback, SessionEvent};
pub use source::{build_queue, mime_hint_for_uri, PlaybackSource};
pub use state::{SessionPhase, SessionState};
