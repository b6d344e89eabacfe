//! Per-item readiness edge detector

use super::PlaybackState;

/// Turns a stream of `(playlist index, state)` changes into "item became ready" signals.
///
/// Fires once per transition into Ready for an item. Any other state for that item (a new
/// seek reports Buffering first) re-arms it, so seeking away and back signals again.
#[derive(Debug, Default)]
pub struct ReadinessTracker {
    last: Option<(usize, PlaybackState)>,
}

impl ReadinessTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, index: usize, state: PlaybackState) -> Option<usize> {
        let was_ready = self.last == Some((index, PlaybackState::Ready));
        self.last = Some((index, state));

        if state == PlaybackState::Ready && !was_ready {
            Some(index)
        } else {
            None
        }
    }
}
