//! Word ↔ token mapping for rendering and inspecting messages.
//!
//! The boundary word is always the last entry, so its id is
//! `len() - 1`, which is also [`GameConfig`](crate::GameConfig)'s default
//! boundary token.

use indexmap::IndexSet;

use crate::id::TokenId;

/// The word reserved for the boundary token.
pub const BOUNDARY_WORD: &str = "<S>";

/// An ordered vocabulary whose last word is [`BOUNDARY_WORD`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Vocabulary {
    words: IndexSet<String>,
}

impl Vocabulary {
    /// A synthetic vocabulary of `size` symbols: content words `w0`,
    /// `w1`, … followed by the boundary word.
    ///
    /// Returns `None` if `size < 2`.
    pub fn with_size(size: usize) -> Option<Self> {
        if size < 2 {
            return None;
        }
        let words = (0..size - 1)
            .map(|i| format!("w{i}"))
            .chain(std::iter::once(BOUNDARY_WORD.to_string()))
            .collect();
        Some(Self { words })
    }

    /// Build from content words. Duplicates keep their first position and
    /// any occurrence of the boundary word is moved to the end.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set: IndexSet<String> = words
            .into_iter()
            .map(Into::into)
            .filter(|w| w != BOUNDARY_WORD)
            .collect();
        set.insert(BOUNDARY_WORD.to_string());
        Self { words: set }
    }

    /// Number of symbols, boundary included.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Always `false`: the boundary word is always present.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// The boundary token's id.
    pub fn boundary(&self) -> TokenId {
        TokenId((self.words.len() - 1) as u32)
    }

    /// Look up a word's id.
    pub fn encode(&self, word: &str) -> Option<TokenId> {
        self.words.get_index_of(word).map(|i| TokenId(i as u32))
    }

    /// Look up a token's word.
    pub fn decode(&self, token: TokenId) -> Option<&str> {
        self.words.get_index(token.index()).map(String::as_str)
    }

    /// Render one discrete message as space-separated words, taking this
    /// vocabulary's own boundary as the stop symbol.
    pub fn render(&self, message: &[TokenId]) -> String {
        self.render_with(message, self.boundary())
    }

    /// Render one discrete message whose stop symbol is `boundary`.
    ///
    /// A leading boundary (the start seed) is skipped and rendering stops
    /// at the next boundary. Out-of-range tokens render as `?`.
    pub fn render_with(&self, message: &[TokenId], boundary: TokenId) -> String {
        let body = match message.first() {
            Some(&first) if first == boundary => &message[1..],
            _ => message,
        };
        body.iter()
            .take_while(|&&t| t != boundary)
            .map(|&t| self.decode(t).unwrap_or("?"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
