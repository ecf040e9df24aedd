// Session phase and resumable playback snapshot

/// Visibility-driven phase of a playback session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No engine handle exists
    Idle,
    /// An engine handle is live and bound to a display surface
    Active,
}

/// Minimal resumable snapshot of a playback session.
///
/// Captured from the live engine at the moment the handle is torn down and
/// applied again when the next handle is created. Survives engine
/// destroy/recreate cycles; the host may persist it across process death.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionState {
    /// Which source in the queue is active
    pub queue_index: usize,
    /// Playback offset within the active source, in milliseconds
    pub position_ms: u64,
    /// Whether playback should resume automatically once ready
    pub play_when_ready: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            queue_index: 0,
            position_ms: 0,
            play_when_ready: true,
        }
    }
}
