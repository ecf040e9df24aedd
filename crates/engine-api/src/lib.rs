// Media engine abstraction layer

pub mod config;
pub mod engine;

// Re-export commonly used types
pub use config::{EngineConfig, QualityCeiling, TrackSelectionPolicy};
pub use engine::{EngineEventSink, EngineFactory, MediaEngine, SurfaceHandle};
