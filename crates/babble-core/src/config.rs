//! Game configuration and its builder.
//!
//! [`GameConfig`] is the static description of one model instance:
//! feature width, vocabulary, recurrent sizes, batch size and the
//! message-length budget. It is only obtainable through
//! [`GameConfig::builder`], whose [`build`](GameConfigBuilder::build)
//! checks every structural invariant up front.

use crate::error::ConfigError;
use crate::id::TokenId;

/// Validated configuration of a referential game.
///
/// The execution mode is deliberately absent: it is passed to each
/// forward call (see [`Mode`](crate::Mode)).
#[derive(Clone, Debug, PartialEq)]
pub struct GameConfig {
    n_features: usize,
    vocab_size: usize,
    embedding_dim: usize,
    hidden_size: usize,
    batch_size: usize,
    boundary: TokenId,
    max_sentence_length: usize,
    temperature: f32,
    greedy: bool,
    margin: f32,
}

impl GameConfig {
    /// Create a new builder. `n_features`, `vocab_size`, `batch_size`
    /// and `max_sentence_length` are required.
    pub fn builder() -> GameConfigBuilder {
        GameConfigBuilder {
            n_features: None,
            vocab_size: None,
            embedding_dim: 64,
            hidden_size: 64,
            batch_size: None,
            boundary: None,
            max_sentence_length: None,
            temperature: 1.2,
            greedy: true,
            margin: 1.0,
        }
    }

    /// Width of a feature vector.
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Number of symbols, boundary included.
    pub fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    /// Width of a token embedding (both agents).
    pub fn embedding_dim(&self) -> usize {
        self.embedding_dim
    }

    /// Width of the recurrent hidden and cell state (both agents).
    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    /// Batch size, fixed for the lifetime of a model.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// The reserved start/end-of-message token.
    pub fn boundary(&self) -> TokenId {
        self.boundary
    }

    /// Number of tokens the Sender produces after the start seed.
    pub fn max_sentence_length(&self) -> usize {
        self.max_sentence_length
    }

    /// Number of positions in an emitted message: the seed plus
    /// `max_sentence_length` generated tokens.
    pub fn message_positions(&self) -> usize {
        self.max_sentence_length + 1
    }

    /// Stopping length of a message that never emits the boundary token.
    pub fn unstopped_length(&self) -> usize {
        self.max_sentence_length + 1
    }

    /// Gumbel-softmax temperature used in training mode.
    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    /// In evaluation mode, take the arg-max token instead of sampling.
    pub fn greedy(&self) -> bool {
        self.greedy
    }

    /// Hinge margin by which the target must outscore each distractor.
    pub fn margin(&self) -> f32 {
        self.margin
    }
}

/// Builder for [`GameConfig`].
///
/// Required: `n_features`, `vocab_size`, `batch_size`,
/// `max_sentence_length`. The boundary token defaults to the last
/// vocabulary entry.
#[derive(Clone, Debug)]
pub struct GameConfigBuilder {
    n_features: Option<usize>,
    vocab_size: Option<usize>,
    embedding_dim: usize,
    hidden_size: usize,
    batch_size: Option<usize>,
    boundary: Option<TokenId>,
    max_sentence_length: Option<usize>,
    temperature: f32,
    greedy: bool,
    margin: f32,
}

impl GameConfigBuilder {
    /// Set the feature vector width.
    pub fn n_features(mut self, n: usize) -> Self {
        self.n_features = Some(n);
        self
    }

    /// Set the vocabulary size (boundary token included).
    pub fn vocab_size(mut self, v: usize) -> Self {
        self.vocab_size = Some(v);
        self
    }

    /// Set the token embedding width (default: 64).
    pub fn embedding_dim(mut self, d: usize) -> Self {
        self.embedding_dim = d;
        self
    }

    /// Set the recurrent state width (default: 64).
    pub fn hidden_size(mut self, h: usize) -> Self {
        self.hidden_size = h;
        self
    }

    /// Set the batch size.
    pub fn batch_size(mut self, b: usize) -> Self {
        self.batch_size = Some(b);
        self
    }

    /// Set the boundary token (default: `vocab_size - 1`).
    pub fn boundary(mut self, token: TokenId) -> Self {
        self.boundary = Some(token);
        self
    }

    /// Set the number of tokens generated after the start seed.
    pub fn max_sentence_length(mut self, l: usize) -> Self {
        self.max_sentence_length = Some(l);
        self
    }

    /// Set the Gumbel-softmax temperature (default: 1.2).
    ///
    /// Not validated: a non-positive temperature yields NaN/Inf samples.
    pub fn temperature(mut self, tau: f32) -> Self {
        self.temperature = tau;
        self
    }

    /// Choose greedy (arg-max) or sampled decoding in evaluation mode
    /// (default: greedy).
    pub fn greedy(mut self, greedy: bool) -> Self {
        self.greedy = greedy;
        self
    }

    /// Set the hinge margin (default: 1.0).
    pub fn margin(mut self, margin: f32) -> Self {
        self.margin = margin;
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// Returns `Err` if:
    /// - a required setting is missing
    /// - any size is zero
    /// - `vocab_size < 2`
    /// - the boundary token is not below `vocab_size`
    /// - `max_sentence_length < 1`
    /// - `margin` is not finite and positive
    pub fn build(self) -> Result<GameConfig, ConfigError> {
        let n_features = self
            .n_features
            .ok_or(ConfigError::Missing { name: "n_features" })?;
        let vocab_size = self
            .vocab_size
            .ok_or(ConfigError::Missing { name: "vocab_size" })?;
        let batch_size = self
            .batch_size
            .ok_or(ConfigError::Missing { name: "batch_size" })?;
        let max_sentence_length = self.max_sentence_length.ok_or(ConfigError::Missing {
            name: "max_sentence_length",
        })?;

        for (name, value) in [
            ("n_features", n_features),
            ("embedding_dim", self.embedding_dim),
            ("hidden_size", self.hidden_size),
            ("batch_size", batch_size),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroDimension { name });
            }
        }
        if vocab_size < 2 {
            return Err(ConfigError::VocabularyTooSmall { vocab_size });
        }
        if u32::try_from(vocab_size).is_err() {
            return Err(ConfigError::VocabularyTooSmall { vocab_size: 0 });
        }
        // vocab_size fits in u32, so the default boundary does too.
        let boundary = self
            .boundary
            .unwrap_or(TokenId((vocab_size - 1) as u32));
        if boundary.index() >= vocab_size {
            return Err(ConfigError::BoundaryOutOfRange {
                boundary,
                vocab_size,
            });
        }
        if max_sentence_length < 1 {
            return Err(ConfigError::SentenceTooShort {
                max_sentence_length,
            });
        }
        if !self.margin.is_finite() || self.margin <= 0.0 {
            return Err(ConfigError::InvalidMargin { value: self.margin });
        }

        Ok(GameConfig {
            n_features,
            vocab_size,
            embedding_dim: self.embedding_dim,
            hidden_size: self.hidden_size,
            batch_size,
            boundary,
            max_sentence_length,
            temperature: self.temperature,
            greedy: self.greedy,
            margin: self.margin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> GameConfigBuilder {
        GameConfig::builder()
            .n_features(8)
            .vocab_size(5)
            .batch_size(2)
            .max_sentence_length(3)
    }

    #[test]
    fn builder_minimal_uses_defaults() {
        let cfg = minimal().build().unwrap();
        assert_eq!(cfg.boundary(), TokenId(4));
        assert_eq!(cfg.embedding_dim(), 64);
        assert_eq!(cfg.hidden_size(), 64);
        assert!((cfg.temperature() - 1.2).abs() < f32::EPSILON);
        assert!(cfg.greedy());
        assert_eq!(cfg.margin(), 1.0);
        assert_eq!(cfg.message_positions(), 4);
        assert_eq!(cfg.unstopped_length(), 4);
    }

    #[test]
    fn missing_required_setting() {
        let err = GameConfig::builder()
            .vocab_size(5)
            .batch_size(2)
            .max_sentence_length(3)
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::Missing { name: "n_features" });
    }

    #[test]
    fn rejects_zero_sentence_length() {
        let err = minimal().max_sentence_length(0).build().unwrap_err();
        assert_eq!(
            err,
            ConfigError::SentenceTooShort {
                max_sentence_length: 0
            }
        );
    }

    #[test]
    fn rejects_zero_dimensions() {
        let err = minimal().hidden_size(0).build().unwrap_err();
        assert_eq!(
            err,
            ConfigError::ZeroDimension {
                name: "hidden_size"
            }
        );
        let err = minimal().batch_size(0).build().unwrap_err();
        assert_eq!(err, ConfigError::ZeroDimension { name: "batch_size" });
    }

    #[test]
    fn rejects_tiny_vocabulary() {
        let err = minimal().vocab_size(1).build().unwrap_err();
        assert_eq!(err, ConfigError::VocabularyTooSmall { vocab_size: 1 });
    }

    #[test]
    fn rejects_boundary_outside_vocabulary() {
        let err = minimal().boundary(TokenId(5)).build().unwrap_err();
        assert_eq!(
            err,
            ConfigError::BoundaryOutOfRange {
                boundary: TokenId(5),
                vocab_size: 5
            }
        );
    }

    #[test]
    fn explicit_boundary_is_kept() {
        let cfg = minimal().boundary(TokenId(0)).build().unwrap();
        assert_eq!(cfg.boundary(), TokenId(0));
    }

    #[test]
    fn rejects_bad_margin() {
        assert!(minimal().margin(0.0).build().is_err());
        assert!(minimal().margin(f32::NAN).build().is_err());
        assert!(minimal().margin(-1.0).build().is_err());
    }

    #[test]
    fn temperature_is_not_validated() {
        let cfg = minimal().temperature(0.0).build().unwrap();
        assert_eq!(cfg.temperature(), 0.0);
    }
}
