use std::time::Duration;

/// Text alert sent once at the start of every motion sequence
pub const MOTION_ALERT: &str = "Motion detected!";

/// Photos taken per motion-start event
pub const SHOTS_PER_SEQUENCE: usize = 3;

/// Pause between consecutive shots, lets the camera module reset between exposures
pub const SHOT_INTERVAL: Duration = Duration::from_millis(200);

/// Outcome of one motion-triggered capture sequence
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceReport {
    pub attempted: usize,
    pub captured: usize,
    pub failed: usize,
    /// Set when a fatal camera error skipped the remaining shots
    pub aborted: bool,
}

impl SequenceReport {
    pub fn skipped(&self) -> usize {
        SHOTS_PER_SEQUENCE - self.attempted
    }
}
