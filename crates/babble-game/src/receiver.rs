//! The Receiver: message in, feature-space guess out.
//!
//! Every position is embedded (weighted row mix for relaxed tokens,
//! lookup for discrete ones) and the whole sequence is scanned by an
//! LSTM from a zero state. The final hidden state is projected into
//! feature space. Padding after termination is scanned like any other
//! token; it is not masked out of the recurrence.

use babble_core::{GameConfig, GameError};
use babble_nn::{Embedding, Linear, LstmCell, LstmState, Module, Parameter};
use ndarray::Array2;
use rand::Rng;

use crate::token::MessageBatch;
use crate::validate::check_layer;

/// The message-decoding agent.
#[derive(Clone, Debug, PartialEq)]
pub struct Receiver {
    config: GameConfig,
    embedding: Embedding,
    cell: LstmCell,
    to_features: Linear,
}

impl Receiver {
    /// A Receiver with freshly initialised parameters.
    pub fn new<R: Rng + ?Sized>(config: &GameConfig, rng: &mut R) -> Self {
        let embedding = Embedding::new(
            "receiver.embedding",
            config.vocab_size(),
            config.embedding_dim(),
            rng,
        );
        let cell = LstmCell::new(
            "receiver.cell",
            config.embedding_dim(),
            config.hidden_size(),
            rng,
        );
        let to_features = Linear::new(
            "receiver.to_features",
            config.hidden_size(),
            config.n_features(),
            rng,
        );
        Self {
            config: config.clone(),
            embedding,
            cell,
            to_features,
        }
    }

    /// A Receiver from explicit layers.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::ShapeMismatch`] if any layer disagrees with
    /// the configured sizes.
    pub fn from_parts(
        config: &GameConfig,
        embedding: Embedding,
        cell: LstmCell,
        to_features: Linear,
    ) -> Result<Self, GameError> {
        let (f, h, e, v) = (
            config.n_features(),
            config.hidden_size(),
            config.embedding_dim(),
            config.vocab_size(),
        );
        check_layer(
            "receiver.embedding",
            (v, e),
            (embedding.vocab_size(), embedding.dim()),
        )?;
        check_layer("receiver.cell", (e, h), (cell.input_dim(), cell.hidden_dim()))?;
        check_layer(
            "receiver.to_features",
            (h, f),
            (to_features.input_dim(), to_features.output_dim()),
        )?;
        Ok(Self {
            config: config.clone(),
            embedding,
            cell,
            to_features,
        })
    }

    /// The configuration this Receiver was built for.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Map a batch of messages to `[batch, n_features]`.
    ///
    /// # Errors
    ///
    /// - [`GameError::BatchMismatch`] if the batch size is not the
    ///   configured one.
    /// - [`GameError::ShapeMismatch`] if the message has no positions or
    ///   relaxed tokens of the wrong width.
    /// - [`GameError::TokenOutOfRange`] for a discrete token past the
    ///   vocabulary.
    pub fn encode(&self, message: &MessageBatch) -> Result<Array2<f32>, GameError> {
        let batch = self.config.batch_size();
        if message.batch_size() != batch {
            return Err(GameError::BatchMismatch {
                input: "receiver message".to_string(),
                expected: batch,
                found: message.batch_size(),
            });
        }
        if message.positions() == 0 {
            return Err(GameError::ShapeMismatch {
                what: "message",
                reason: "no positions".to_string(),
            });
        }
        if let MessageBatch::Relaxed { hard, .. } = message {
            let width = hard.dim().2;
            if width != self.config.vocab_size() {
                return Err(GameError::ShapeMismatch {
                    what: "message",
                    reason: format!(
                        "relaxed tokens of width {width}, vocabulary is {}",
                        self.config.vocab_size()
                    ),
                });
            }
        }

        let inputs = (0..message.positions())
            .map(|t| message.position(t).embed(&self.embedding))
            .collect::<Result<Vec<_>, _>>()?;
        let state = self.cell.scan(
            inputs.iter().map(|x| x.view()),
            LstmState::zeros(batch, self.config.hidden_size()),
        );
        Ok(self.to_features.forward(state.hidden.view()))
    }
}

impl Module for Receiver {
    fn visit_parameters(&self, visitor: &mut dyn FnMut(&Parameter)) {
        self.embedding.visit_parameters(visitor);
        self.cell.visit_parameters(visitor);
        self.to_features.visit_parameters(visitor);
    }

    fn visit_parameters_mut(&mut self, visitor: &mut dyn FnMut(&mut Parameter)) {
        self.embedding.visit_parameters_mut(visitor);
        self.cell.visit_parameters_mut(visitor);
        self.to_features.visit_parameters_mut(visitor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use babble_core::TokenId;
    use babble_nn::StraightThrough;
    use ndarray::array;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn config() -> GameConfig {
        GameConfig::builder()
            .n_features(2)
            .vocab_size(3)
            .embedding_dim(4)
            .hidden_size(5)
            .batch_size(2)
            .max_sentence_length(2)
            .build()
            .unwrap()
    }

    fn receiver() -> Receiver {
        Receiver::new(&config(), &mut ChaCha8Rng::seed_from_u64(17))
    }

    fn discrete() -> MessageBatch {
        MessageBatch::from_discrete_steps(&[
            vec![TokenId(2), TokenId(2)],
            vec![TokenId(0), TokenId(1)],
            vec![TokenId(1), TokenId(2)],
        ])
        .unwrap()
    }

    #[test]
    fn relaxed_and_discrete_forms_agree() {
        let relaxed = MessageBatch::from_relaxed_steps(&[
            StraightThrough::constant(vec![2, 2], 3),
            StraightThrough::from_soft(array![[0.5, 0.3, 0.2], [0.1, 0.8, 0.1]]),
            StraightThrough::from_soft(array![[0.2, 0.7, 0.1], [0.3, 0.3, 0.4]]),
        ])
        .unwrap();
        let r = receiver();
        let a = r.encode(&relaxed).unwrap();
        let b = r.encode(&discrete()).unwrap();
        assert_eq!(a.dim(), (2, 2));
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-6);
        }
    }

    #[test]
    fn padding_still_feeds_the_recurrence() {
        let r = receiver();
        let short = MessageBatch::from_discrete_steps(&[
            vec![TokenId(2), TokenId(2)],
            vec![TokenId(0), TokenId(0)],
        ])
        .unwrap();
        let padded = MessageBatch::from_discrete_steps(&[
            vec![TokenId(2), TokenId(2)],
            vec![TokenId(0), TokenId(0)],
            vec![TokenId(2), TokenId(2)],
        ])
        .unwrap();
        assert_ne!(r.encode(&short).unwrap(), r.encode(&padded).unwrap());
    }

    #[test]
    fn zero_projection_returns_bias() {
        let cfg = config();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let r = Receiver::from_parts(
            &cfg,
            Embedding::new("receiver.embedding", 3, 4, &mut rng),
            LstmCell::new("receiver.cell", 4, 5, &mut rng),
            Linear::from_parts("receiver.to_features", Array2::zeros((5, 2)), array![1.0, 0.5])
                .unwrap(),
        )
        .unwrap();
        assert_eq!(r.encode(&discrete()).unwrap(), array![[1.0, 0.5], [1.0, 0.5]]);
    }

    #[test]
    fn rejects_wrong_batch() {
        let one = MessageBatch::from_discrete_steps(&[vec![TokenId(2)]]).unwrap();
        let err = receiver().encode(&one).unwrap_err();
        assert!(matches!(err, GameError::BatchMismatch { expected: 2, found: 1, .. }));
    }

    #[test]
    fn rejects_out_of_vocabulary_token() {
        let bad = MessageBatch::from_discrete_steps(&[vec![TokenId(2), TokenId(7)]]).unwrap();
        let err = receiver().encode(&bad).unwrap_err();
        assert_eq!(
            err,
            GameError::TokenOutOfRange {
                token: TokenId(7),
                vocab_size: 3
            }
        );
    }
}
