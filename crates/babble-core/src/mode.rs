//! Execution mode threaded through every forward call.

use std::fmt;

/// Whether a forward pass is a training pass or an evaluation pass.
///
/// The mode is an explicit argument rather than state on the model, so
/// one model instance can serve training and evaluation passes
/// concurrently. It decides two things at once, and they must agree:
///
/// - how the Sender picks tokens (relaxed straight-through samples in
///   `Training`, greedy or categorical indices in `Evaluation`);
/// - which representation the Terminator writes padding in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Relaxed tokens: probability vectors over the vocabulary.
    Training,
    /// Discrete tokens: vocabulary indices.
    Evaluation,
}

impl Mode {
    /// `true` for [`Mode::Training`].
    pub fn is_training(self) -> bool {
        matches!(self, Self::Training)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Training => write!(f, "training"),
            Self::Evaluation => write!(f, "evaluation"),
        }
    }
}
