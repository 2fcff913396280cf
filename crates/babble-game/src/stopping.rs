//! Per-example stopping-length state machine.
//!
//! Every example starts `Pending`. The first time the Sender emits the
//! boundary token for it, at zero-based step `i`, it moves to
//! `Stopped { length: i + 2 }` (the `+ 2` counts the start seed at
//! position 0 and the boundary itself) and never moves again. Examples
//! still pending at the end report `max_sentence_length + 1`.

use babble_core::TokenId;

/// State of one example's message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopState {
    /// No boundary token produced yet.
    Pending,
    /// Boundary first produced; `length` positions are live.
    Stopped {
        /// Live positions, start seed included.
        length: usize,
    },
}

/// Tracks [`StopState`] for every example of a batch.
#[derive(Clone, Debug)]
pub struct StopTracker {
    boundary: TokenId,
    unstopped: usize,
    states: Vec<StopState>,
}

impl StopTracker {
    /// All examples pending.
    pub fn new(batch: usize, boundary: TokenId, max_sentence_length: usize) -> Self {
        Self {
            boundary,
            unstopped: max_sentence_length + 1,
            states: vec![StopState::Pending; batch],
        }
    }

    /// Record the tokens produced at zero-based generation `step`.
    ///
    /// Only pending examples that produced the boundary transition.
    pub fn observe(&mut self, step: usize, produced: &[TokenId]) {
        for (state, &token) in self.states.iter_mut().zip(produced) {
            if *state == StopState::Pending && token == self.boundary {
                *state = StopState::Stopped { length: step + 2 };
            }
        }
    }

    /// Current state of every example.
    pub fn states(&self) -> &[StopState] {
        &self.states
    }

    /// `true` once every example has stopped.
    pub fn all_stopped(&self) -> bool {
        self.states.iter().all(|s| *s != StopState::Pending)
    }

    /// Stopping length of every example; pending ones report the
    /// unstopped sentinel.
    pub fn lengths(&self) -> Vec<usize> {
        self.states
            .iter()
            .map(|s| match s {
                StopState::Pending => self.unstopped,
                StopState::Stopped { length } => *length,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const B: TokenId = TokenId(4);

    #[test]
    fn first_boundary_sets_length_once() {
        let mut t = StopTracker::new(3, B, 3);
        t.observe(0, &[TokenId(1), B, TokenId(0)]);
        t.observe(1, &[B, B, TokenId(0)]);
        t.observe(2, &[TokenId(2), TokenId(1), TokenId(3)]);
        assert_eq!(t.lengths(), vec![3, 2, 4]);
        assert_eq!(t.states()[2], StopState::Pending);
        assert!(!t.all_stopped());
    }

    #[test]
    fn all_stopped_after_every_boundary() {
        let mut t = StopTracker::new(2, B, 5);
        t.observe(4, &[B, B]);
        assert!(t.all_stopped());
        assert_eq!(t.lengths(), vec![6, 6]);
    }

    #[test]
    fn boundary_at_last_step_stops_with_sentinel_length() {
        let mut t = StopTracker::new(2, B, 3);
        t.observe(0, &[TokenId(1), TokenId(1)]);
        t.observe(1, &[TokenId(2), TokenId(3)]);
        t.observe(2, &[B, TokenId(0)]);
        // Same value as the sentinel, but only the first example stopped.
        assert_eq!(t.lengths(), vec![4, 4]);
        assert_eq!(t.states()[0], StopState::Stopped { length: 4 });
        assert_eq!(t.states()[1], StopState::Pending);
        assert!(!t.all_stopped());
    }

    #[test]
    fn untouched_tracker_reports_sentinel() {
        let t = StopTracker::new(2, B, 7);
        assert_eq!(t.lengths(), vec![8, 8]);
    }
}
