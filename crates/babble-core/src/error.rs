//! Error types for the Babble referential game.
//!
//! Split by when the failure is detected: [`ConfigError`] at
//! construction time, [`GameError`] when a forward pass is invoked.
//! Numeric degeneracies (NaN/Inf from a non-positive temperature, exact
//! score ties) are not errors and propagate as IEEE values.

use std::error::Error;
use std::fmt;

use crate::id::TokenId;
use crate::mode::Mode;

/// Errors detected while building a [`GameConfig`](crate::GameConfig).
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// A size that must be at least 1 was zero.
    ZeroDimension {
        /// Name of the offending setting.
        name: &'static str,
    },
    /// The vocabulary cannot hold the boundary token plus one content token.
    VocabularyTooSmall {
        /// The configured vocabulary size.
        vocab_size: usize,
    },
    /// The boundary token does not index into the vocabulary.
    BoundaryOutOfRange {
        /// The configured boundary token.
        boundary: TokenId,
        /// The configured vocabulary size.
        vocab_size: usize,
    },
    /// `max_sentence_length` is below 1.
    SentenceTooShort {
        /// The configured maximum sentence length.
        max_sentence_length: usize,
    },
    /// The hinge margin is NaN, infinite, zero or negative.
    InvalidMargin {
        /// The invalid value.
        value: f32,
    },
    /// A required setting was never provided to the builder.
    Missing {
        /// Name of the missing setting.
        name: &'static str,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroDimension { name } => write!(f, "{name} must be at least 1"),
            Self::VocabularyTooSmall { vocab_size } => {
                write!(
                    f,
                    "vocab_size {vocab_size} leaves no room for content tokens (minimum 2)"
                )
            }
            Self::BoundaryOutOfRange {
                boundary,
                vocab_size,
            } => {
                write!(
                    f,
                    "boundary token {boundary} is outside a vocabulary of {vocab_size}"
                )
            }
            Self::SentenceTooShort {
                max_sentence_length,
            } => {
                write!(
                    f,
                    "max_sentence_length {max_sentence_length} is below minimum of 1"
                )
            }
            Self::InvalidMargin { value } => {
                write!(f, "margin must be finite and positive, got {value}")
            }
            Self::Missing { name } => write!(f, "{name} is required"),
        }
    }
}

impl Error for ConfigError {}

/// Errors raised by a forward pass of the game.
///
/// Every variant is fatal to the current pass; no partial results are
/// produced.
#[derive(Clone, Debug, PartialEq)]
pub enum GameError {
    /// The model could not be constructed from its configuration.
    Config(ConfigError),
    /// An input's batch dimension differs from the configured batch size.
    BatchMismatch {
        /// Which input was rejected.
        input: String,
        /// The configured batch size.
        expected: usize,
        /// The batch dimension that was supplied.
        found: usize,
    },
    /// An input's feature dimension differs from the configured one.
    FeatureMismatch {
        /// Which input was rejected.
        input: String,
        /// The configured feature dimensionality.
        expected: usize,
        /// The feature dimensionality that was supplied.
        found: usize,
    },
    /// The scorer was handed zero distractors.
    NoDistractors,
    /// A message was produced in one mode and interpreted in another.
    ModeMismatch {
        /// The mode the caller asked for.
        expected: Mode,
        /// The mode the message was produced in.
        found: Mode,
    },
    /// The stopping-length vector does not cover the batch.
    LengthMismatch {
        /// The batch size of the message.
        expected: usize,
        /// The number of stopping lengths supplied.
        found: usize,
    },
    /// A discrete token does not index into the vocabulary.
    TokenOutOfRange {
        /// The offending token.
        token: TokenId,
        /// The vocabulary size.
        vocab_size: usize,
    },
    /// Any other structural disagreement between arrays.
    ShapeMismatch {
        /// The object whose shape was wrong.
        what: &'static str,
        /// Human-readable description of the disagreement.
        reason: String,
    },
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::BatchMismatch {
                input,
                expected,
                found,
            } => {
                write!(f, "{input}: batch size {found}, expected {expected}")
            }
            Self::FeatureMismatch {
                input,
                expected,
                found,
            } => {
                write!(f, "{input}: {found} features, expected {expected}")
            }
            Self::NoDistractors => write!(f, "at least one distractor is required"),
            Self::ModeMismatch { expected, found } => {
                write!(f, "message is in {found} form, expected {expected} form")
            }
            Self::LengthMismatch { expected, found } => {
                write!(f, "{found} stopping lengths for a batch of {expected}")
            }
            Self::TokenOutOfRange { token, vocab_size } => {
                write!(f, "token {token} is outside a vocabulary of {vocab_size}")
            }
            Self::ShapeMismatch { what, reason } => write!(f, "{what}: {reason}"),
        }
    }
}

impl Error for GameError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for GameError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}
