//! Strongly-typed token identifiers.

use std::fmt;

/// Index of a symbol in the game vocabulary.
///
/// `TokenId(n)` corresponds to the n-th entry of the [`Vocabulary`](crate::Vocabulary).
/// One id per vocabulary is reserved as the boundary token (see
/// [`GameConfig::boundary`](crate::GameConfig::boundary)).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenId(pub u32);

impl TokenId {
    /// The id as a `usize` row index into embedding and projection tables.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for TokenId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}
