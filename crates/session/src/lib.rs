// Playback session lifecycle management

pub mod controller;
pub mod lifecycle;

// Re-export commonly used types
pub use controller::{PlaybackSessionController, SessionConfig};
pub use lifecycle::{HostCapabilities, PhaseEvent};
