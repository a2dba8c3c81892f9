//! Processing lifecycle gate.

use boxmon_models::{ProcessingAction, ProcessingState, SourceSelection, ZoneId};

/// The single source of truth for whether the pipeline is running.
///
/// State flips only on a confirmed toggle response, a matching terminal
/// status from the pipeline, or a local safety reset when the source
/// changes. Nothing is ever inferred from stale events.
#[derive(Debug, Default)]
pub struct ProcessingGate {
    state: ProcessingState,
}

impl ProcessingGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ProcessingState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// Whether a start may be attempted. The start action is disabled
    /// whenever this is false; stop is always allowed while processing.
    pub fn can_start(source: &SourceSelection, zone: Option<ZoneId>) -> bool {
        source.is_ready() && zone.is_some()
    }

    /// Apply a toggle the server confirmed with a 2xx.
    pub fn apply_confirmed(&mut self, action: ProcessingAction) {
        self.state = match action {
            ProcessingAction::Start => ProcessingState::Processing,
            ProcessingAction::Stop => ProcessingState::Completed,
        };
    }

    /// Terminal completion reported by the pipeline for the current
    /// source.
    pub fn complete(&mut self) {
        if self.state.is_active() {
            self.state = ProcessingState::Completed;
        }
    }

    /// Terminal error reported by the pipeline for the current source.
    pub fn mark_error(&mut self) {
        if self.state.is_active() {
            self.state = ProcessingState::Error;
        }
    }

    /// Local safety reset: the source changed out from under a running
    /// pipeline, so the gate falls back to idle regardless of whether the
    /// remote acknowledges a stop. Returns true if the state changed.
    pub fn force_idle(&mut self) -> bool {
        if self.state == ProcessingState::Idle {
            return false;
        }
        self.state = ProcessingState::Idle;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_start_requires_ready_source_and_zone() {
        let zone = ZoneId::new(3).ok();
        assert!(ProcessingGate::can_start(&SourceSelection::Webcam, zone));
        assert!(!ProcessingGate::can_start(&SourceSelection::Webcam, None));
        assert!(!ProcessingGate::can_start(&SourceSelection::None, zone));

        let unresolved = SourceSelection::UploadedFile {
            path: String::new(),
            original_name: "clip.mp4".to_string(),
            size_bytes: 10,
        };
        assert!(!ProcessingGate::can_start(&unresolved, zone));
    }

    #[test]
    fn test_confirmed_toggle_transitions() {
        let mut gate = ProcessingGate::new();
        assert_eq!(gate.state(), ProcessingState::Idle);

        gate.apply_confirmed(ProcessingAction::Start);
        assert_eq!(gate.state(), ProcessingState::Processing);

        gate.apply_confirmed(ProcessingAction::Stop);
        assert_eq!(gate.state(), ProcessingState::Completed);

        // Re-entrant: a new confirmed start leaves the terminal state.
        gate.apply_confirmed(ProcessingAction::Start);
        assert_eq!(gate.state(), ProcessingState::Processing);
    }

    #[test]
    fn test_terminal_reports_only_apply_while_active() {
        let mut gate = ProcessingGate::new();
        gate.complete();
        assert_eq!(gate.state(), ProcessingState::Idle);

        gate.apply_confirmed(ProcessingAction::Start);
        gate.mark_error();
        assert_eq!(gate.state(), ProcessingState::Error);
    }

    #[test]
    fn test_force_idle_reports_change() {
        let mut gate = ProcessingGate::new();
        assert!(!gate.force_idle());

        gate.apply_confirmed(ProcessingAction::Start);
        assert!(gate.force_idle());
        assert_eq!(gate.state(), ProcessingState::Idle);
    }
}
