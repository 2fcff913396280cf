//! Post-termination padding.
//!
//! For an example with stopping length `n`, positions `n..` are
//! overwritten with the boundary token: a constant one-hot row (hard and
//! soft halves alike) for relaxed messages, the boundary index for
//! discrete ones. The sentinel length `max_sentence_length + 1` equals the
//! number of positions, so unstopped messages are left untouched.

use babble_core::{GameConfig, GameError, Mode};
use babble_nn::ops::one_hot;
use ndarray::s;

use crate::token::MessageBatch;

/// Pads messages after their stopping length.
#[derive(Clone, Debug, PartialEq)]
pub struct Terminator {
    config: GameConfig,
}

impl Terminator {
    /// A terminator for messages of the given configuration.
    pub fn new(config: &GameConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Overwrite every position at or after each example's stopping
    /// length with the boundary token.
    ///
    /// # Errors
    ///
    /// - [`GameError::ModeMismatch`] if `message` is not in the form
    ///   `mode` calls for.
    /// - [`GameError::LengthMismatch`] if `lengths` does not have one
    ///   entry per example.
    pub fn terminate(
        &self,
        mut message: MessageBatch,
        lengths: &[usize],
        mode: Mode,
    ) -> Result<MessageBatch, GameError> {
        if message.mode() != mode {
            return Err(GameError::ModeMismatch {
                expected: mode,
                found: message.mode(),
            });
        }
        if lengths.len() != message.batch_size() {
            return Err(GameError::LengthMismatch {
                expected: message.batch_size(),
                found: lengths.len(),
            });
        }
        let boundary = self.config.boundary();
        let positions = message.positions();

        match &mut message {
            MessageBatch::Relaxed { hard, soft } => {
                let pad = one_hot(boundary.index(), hard.dim().2);
                for (b, &len) in lengths.iter().enumerate() {
                    for t in len.min(positions)..positions {
                        hard.slice_mut(s![b, t, ..]).assign(&pad);
                        soft.slice_mut(s![b, t, ..]).assign(&pad);
                    }
                }
            }
            MessageBatch::Discrete(tokens) => {
                for (b, &len) in lengths.iter().enumerate() {
                    tokens
                        .slice_mut(s![b, len.min(positions)..])
                        .fill(boundary);
                }
            }
        }
        Ok(message)
    }
}
