use crate::storage::types::ArtifactId;

/// Why a tick produced no artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// An artifact with the identifier derived from the clock already exists
    DuplicateIdentifier,
    CaptureFailed,
    WriteFailed,
}

/// Result of one scheduler tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// A new artifact was written. `described` is false when its record
    /// could not be appended.
    Captured { id: ArtifactId, described: bool },
    Skipped(SkipReason),
    /// The run flag is cleared or belongs to a newer run; the loop ends.
    Stopped,
    /// The control state could not be read; the loop ends.
    Aborted,
}

impl TickOutcome {
    pub fn ends_run(&self) -> bool {
        matches!(self, TickOutcome::Stopped | TickOutcome::Aborted)
    }
}
