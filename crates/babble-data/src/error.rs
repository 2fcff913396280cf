//! Errors raised while preparing game inputs.

use std::error::Error;
use std::fmt;

use babble_core::GameError;

/// Errors from normalisation, sampling and batching.
#[derive(Clone, Debug, PartialEq)]
pub enum DataError {
    /// A feature matrix has no rows.
    EmptyDataset,
    /// A sampler cannot draw `k` distinct distractors from `n - 1` items.
    TooManyDistractors {
        /// Requested distractors per target.
        k: usize,
        /// Number of items.
        n: usize,
    },
    /// A sampler or candidate tuple with zero distractors.
    NoDistractors,
    /// A candidate index past the end of the feature bank.
    IndexOutOfRange {
        /// The offending index.
        index: usize,
        /// Number of items in the bank.
        len: usize,
    },
    /// A feature matrix does not match the fitted statistics.
    FeatureMismatch {
        /// Features the statistics were fitted on.
        expected: usize,
        /// Features supplied.
        found: usize,
    },
    /// The prepared inputs do not fit the game.
    Game(GameError),
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyDataset => write!(f, "feature matrix has no rows"),
            Self::TooManyDistractors { k, n } => {
                write!(f, "cannot draw {k} distinct distractors from {n} items")
            }
            Self::NoDistractors => write!(f, "at least one distractor is required"),
            Self::IndexOutOfRange { index, len } => {
                write!(f, "item {index} is outside a bank of {len}")
            }
            Self::FeatureMismatch { expected, found } => {
                write!(f, "{found} features, statistics were fitted on {expected}")
            }
            Self::Game(e) => write!(f, "game: {e}"),
        }
    }
}

impl Error for DataError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Game(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GameError> for DataError {
    fn from(e: GameError) -> Self {
        Self::Game(e)
    }
}
