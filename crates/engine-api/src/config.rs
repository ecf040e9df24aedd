// Engine creation parameters

/// Upper bound on the video quality the engine's track selector may pick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityCeiling {
    /// Restrict to standard-definition video (bandwidth-conscious hosts)
    StandardDefinition,
}

/// Track-selection behavior requested from the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackSelectionPolicy {
    /// Engine defaults
    Default,
    /// Adapt the selected track to measured throughput
    Adaptive,
}

/// Configuration passed to [`EngineFactory::create`].
///
/// [`EngineFactory::create`]: crate::engine::EngineFactory::create
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub quality_ceiling: Option<QualityCeiling>,
    pub track_selection: TrackSelectionPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            quality_ceiling: None,
            track_selection: TrackSelectionPolicy::Default,
        }
    }
}

impl EngineConfig {
    /// Configuration for bandwidth-conscious hosts: cap the selector at
    /// standard definition
    pub fn bandwidth_conscious() -> Self {
        Self {
            quality_ceiling: Some(QualityCeiling::StandardDefinition),
            track_selection: TrackSelectionPolicy::Default,
        }
    }

    pub fn with_track_selection(mut self, policy: TrackSelectionPolicy) -> Self {
        self.track_selection = policy;
        self
    }
}
