/// Progress/cancellation hook for a trace run. Default methods mirror the
/// source project's permissive base class: no notification interval and
/// never cancelled, so implementing only what you care about is enough.
pub trait RayListener {
    fn stage_progress(&mut self, stage: StageKind, name: &str, current: u32, total: u32) {
        let _ = (stage, name, current, total);
    }

    fn ray_progress(&mut self, num: u64, total: u64) {
        let _ = (num, total);
    }

    /// How many rays between `ray_progress` notifications; `0` disables them.
    fn ray_notify_interval(&self) -> u64 {
        0
    }

    fn cancelled(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Trace,
    Transfer,
    Kirchhoff,
    Config,
}

/// A listener that notifies no one and never cancels; the default when a
/// caller doesn't need progress feedback.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullListener;

impl RayListener for NullListener {}
