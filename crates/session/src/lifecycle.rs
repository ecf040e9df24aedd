// Host lifecycle vocabulary

/// Visibility transitions delivered by the host, in order, serially, never
/// concurrently for a given controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent {
    /// The surface became visible but is not yet interactive
    ForegroundStart,
    /// The surface is visible and interactive
    Resume,
    /// The surface is losing interactivity
    Pause,
    /// The surface is fully hidden
    BackgroundStop,
}

/// Capability tier of the host platform.
///
/// Injected at construction instead of sniffing a platform version, so the
/// lifecycle policy stays decoupled from any host enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostCapabilities {
    /// Whether a live engine may be retained while the surface is hidden
    /// between `Pause` and `BackgroundStop` (coarse multitasking)
    pub background_survival: bool,
}

impl Default for HostCapabilities {
    fn default() -> Self {
        Self {
            background_survival: true,
        }
    }
}

impl HostCapabilities {
    pub fn background_survival(survival: bool) -> Self {
        Self {
            background_survival: survival,
        }
    }
}
