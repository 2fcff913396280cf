//! The Sender: target features in, variable-length message out.
//!
//! The target is projected to the initial hidden state (cell state
//! zero) and position 0 is seeded with the boundary token. Each of the
//! `max_sentence_length` steps then embeds the previous token, advances
//! the LSTM cell, projects to vocabulary probabilities and picks the next
//! token:
//!
//! - [`Mode::Training`]: a Gumbel-softmax sample at the configured
//!   temperature, hardened straight-through;
//! - [`Mode::Evaluation`]: the arg-max (greedy) or a categorical draw.
//!
//! Generation always runs all steps; tokens after an example's first
//! boundary are left for the [`Terminator`](crate::Terminator) to
//! overwrite.

use babble_core::{GameConfig, GameError, Mode, TokenId};
use babble_nn::ops::{argmax_rows, softmax_rows};
use babble_nn::sampling::{categorical, straight_through};
use babble_nn::{Embedding, Linear, LstmCell, LstmState, Module, Parameter, StraightThrough};
use ndarray::{Array2, ArrayView2};
use rand::Rng;
use tracing::trace;

use crate::stopping::StopTracker;
use crate::token::{MessageBatch, Position};
use crate::validate::{check_features, check_layer};

/// Output of [`Sender::generate`].
#[derive(Clone, Debug, PartialEq)]
pub struct Generated {
    /// Unpadded message, `max_sentence_length + 1` positions.
    pub message: MessageBatch,
    /// Stopping length of every example, in `[2, max_sentence_length + 1]`.
    pub lengths: Vec<usize>,
}

/// The message-generating agent.
#[derive(Clone, Debug, PartialEq)]
pub struct Sender {
    config: GameConfig,
    to_hidden: Linear,
    cell: LstmCell,
    embedding: Embedding,
    to_vocab: Linear,
}

impl Sender {
    /// A Sender with freshly initialised parameters.
    pub fn new<R: Rng + ?Sized>(config: &GameConfig, rng: &mut R) -> Self {
        let to_hidden = Linear::new(
            "sender.to_hidden",
            config.n_features(),
            config.hidden_size(),
            rng,
        );
        let cell = LstmCell::new(
            "sender.cell",
            config.embedding_dim(),
            config.hidden_size(),
            rng,
        );
        let embedding = Embedding::new(
            "sender.embedding",
            config.vocab_size(),
            config.embedding_dim(),
            rng,
        );
        let to_vocab = Linear::new(
            "sender.to_vocab",
            config.hidden_size(),
            config.vocab_size(),
            rng,
        );
        Self {
            config: config.clone(),
            to_hidden,
            cell,
            embedding,
            to_vocab,
        }
    }

    /// A Sender from explicit layers.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::ShapeMismatch`] if any layer disagrees with
    /// the configured sizes.
    pub fn from_parts(
        config: &GameConfig,
        to_hidden: Linear,
        cell: LstmCell,
        embedding: Embedding,
        to_vocab: Linear,
    ) -> Result<Self, GameError> {
        let (f, h, e, v) = (
            config.n_features(),
            config.hidden_size(),
            config.embedding_dim(),
            config.vocab_size(),
        );
        check_layer(
            "sender.to_hidden",
            (f, h),
            (to_hidden.input_dim(), to_hidden.output_dim()),
        )?;
        check_layer("sender.cell", (e, h), (cell.input_dim(), cell.hidden_dim()))?;
        check_layer(
            "sender.embedding",
            (v, e),
            (embedding.vocab_size(), embedding.dim()),
        )?;
        check_layer(
            "sender.to_vocab",
            (h, v),
            (to_vocab.input_dim(), to_vocab.output_dim()),
        )?;
        Ok(Self {
            config: config.clone(),
            to_hidden,
            cell,
            embedding,
            to_vocab,
        })
    }

    /// The configuration this Sender was built for.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Vocabulary probabilities from a hidden state, `[batch, vocab]`.
    pub fn token_probabilities(&self, hidden: ArrayView2<'_, f32>) -> Array2<f32> {
        softmax_rows(self.to_vocab.forward(hidden).view())
    }

    /// Generate one message per target row.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::BatchMismatch`] or [`GameError::FeatureMismatch`]
    /// if `targets` is not `[batch_size, n_features]`, and
    /// [`GameError::ShapeMismatch`] if a categorical draw meets a row with
    /// no valid weights.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        targets: ArrayView2<'_, f32>,
        mode: Mode,
        rng: &mut R,
    ) -> Result<Generated, GameError> {
        let cfg = &self.config;
        check_features(
            "sender targets",
            targets,
            cfg.batch_size(),
            cfg.n_features(),
        )?;
        let batch = targets.nrows();
        let boundary = cfg.boundary();
        let mut tracker = StopTracker::new(batch, boundary, cfg.max_sentence_length());
        let mut state = LstmState::from_hidden(self.to_hidden.forward(targets));

        let message = match mode {
            Mode::Training => {
                let vocab = cfg.vocab_size();
                let mut steps = Vec::with_capacity(cfg.message_positions());
                let mut prev = StraightThrough::constant(vec![boundary.index(); batch], vocab);
                for step in 0..cfg.max_sentence_length() {
                    let input = Position::Relaxed(prev.hard.view()).embed(&self.embedding)?;
                    state = self.cell.step(input.view(), &state);
                    let probs = self.token_probabilities(state.hidden.view());
                    let token = straight_through(probs.view(), cfg.temperature(), rng);
                    tracker.observe(step, &to_token_ids(&token.indices));
                    steps.push(std::mem::replace(&mut prev, token));
                }
                steps.push(prev);
                MessageBatch::from_relaxed_steps(&steps)?
            }
            Mode::Evaluation => {
                let mut steps = Vec::with_capacity(cfg.message_positions());
                let mut prev = vec![boundary; batch];
                for step in 0..cfg.max_sentence_length() {
                    let input = self.embedding.lookup(&prev)?;
                    state = self.cell.step(input.view(), &state);
                    let probs = self.token_probabilities(state.hidden.view());
                    let picked = if cfg.greedy() {
                        argmax_rows(probs.view())
                    } else {
                        categorical(probs.view(), rng)?
                    };
                    let token = to_token_ids(&picked);
                    tracker.observe(step, &token);
                    steps.push(std::mem::replace(&mut prev, token));
                }
                steps.push(prev);
                MessageBatch::from_discrete_steps(&steps)?
            }
        };

        let lengths = tracker.lengths();
        trace!(
            %mode,
            all_stopped = tracker.all_stopped(),
            ?lengths,
            "generated messages"
        );
        Ok(Generated { message, lengths })
    }
}

fn to_token_ids(indices: &[usize]) -> Vec<TokenId> {
    indices.iter().map(|&i| TokenId(i as u32)).collect()
}

impl Module for Sender {
    fn visit_parameters(&self, visitor: &mut dyn FnMut(&Parameter)) {
        self.to_hidden.visit_parameters(visitor);
        self.cell.visit_parameters(visitor);
        self.embedding.visit_parameters(visitor);
        self.to_vocab.visit_parameters(visitor);
    }

    fn visit_parameters_mut(&mut self, visitor: &mut dyn FnMut(&mut Parameter)) {
        self.to_hidden.visit_parameters_mut(visitor);
        self.cell.visit_parameters_mut(visitor);
        self.embedding.visit_parameters_mut(visitor);
        self.to_vocab.visit_parameters_mut(visitor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Token;
    use ndarray::Array1;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn config() -> GameConfig {
        config_with_length(3)
    }

    fn config_with_length(max_sentence_length: usize) -> GameConfig {
        GameConfig::builder()
            .n_features(3)
            .vocab_size(5)
            .embedding_dim(4)
            .hidden_size(6)
            .batch_size(2)
            .max_sentence_length(max_sentence_length)
            .build()
            .unwrap()
    }

    /// A Sender whose vocabulary projection ignores the hidden state and
    /// always prefers `favourite`.
    fn biased_sender(favourite: usize) -> Sender {
        biased_sender_for(&config(), favourite)
    }

    fn biased_sender_for(cfg: &GameConfig, favourite: usize) -> Sender {
        let mut sender = Sender::new(cfg, &mut ChaCha8Rng::seed_from_u64(0));
        let mut bias = Array1::zeros(5);
        bias[favourite] = 30.0;
        sender.to_vocab = Linear::from_parts("sender.to_vocab", Array2::zeros((6, 5)), bias).unwrap();
        sender
    }

    fn targets() -> Array2<f32> {
        Array2::from_shape_vec((2, 3), vec![0.1, 0.2, 0.3, -0.4, 0.5, -0.6]).unwrap()
    }

    #[test]
    fn greedy_boundary_stops_at_first_step() {
        let sender = biased_sender(4);
        let out = sender
            .generate(targets().view(), Mode::Evaluation, &mut ChaCha8Rng::seed_from_u64(1))
            .unwrap();
        assert_eq!(out.lengths, vec![2, 2]);
        assert_eq!(out.message.positions(), 4);
        for b in 0..2 {
            for t in 0..4 {
                assert_eq!(out.message.token(b, t), Token::Discrete(TokenId(4)));
            }
        }
    }

    #[test]
    fn boundary_at_the_only_step_reports_sentinel_length() {
        let cfg = config_with_length(1);
        let sender = biased_sender_for(&cfg, 4);
        for mode in [Mode::Evaluation, Mode::Training] {
            let out = sender
                .generate(targets().view(), mode, &mut ChaCha8Rng::seed_from_u64(2))
                .unwrap();
            // Stopped at step 0, which is also the last step.
            assert_eq!(out.lengths, vec![2, 2]);
            assert_eq!(out.lengths[0], cfg.unstopped_length());
            for b in 0..2 {
                assert_eq!(out.message.token(b, 1).id(), TokenId(4));
            }
        }
    }

    #[test]
    fn never_emitting_boundary_keeps_sentinel() {
        let sender = biased_sender(1);
        let out = sender
            .generate(targets().view(), Mode::Evaluation, &mut ChaCha8Rng::seed_from_u64(1))
            .unwrap();
        assert_eq!(out.lengths, vec![4, 4]);
        assert_eq!(out.message.token(0, 0), Token::Discrete(TokenId(4)));
        assert_eq!(out.message.token(0, 3), Token::Discrete(TokenId(1)));
    }

    #[test]
    fn training_tokens_are_straight_through() {
        let cfg = config();
        let sender = Sender::new(&cfg, &mut ChaCha8Rng::seed_from_u64(3));
        let out = sender
            .generate(targets().view(), Mode::Training, &mut ChaCha8Rng::seed_from_u64(4))
            .unwrap();
        assert_eq!(out.message.mode(), Mode::Training);
        for b in 0..2 {
            assert_eq!(out.message.token(b, 0).id(), TokenId(4));
            for t in 0..4 {
                match out.message.token(b, t) {
                    Token::Relaxed { hard, soft } => {
                        assert_eq!(hard.sum(), 1.0);
                        let idx = babble_nn::ops::argmax(hard.view());
                        assert_eq!(hard[idx], 1.0);
                        assert_eq!(babble_nn::ops::argmax(soft.view()), idx);
                    }
                    Token::Discrete(_) => panic!("expected relaxed token"),
                }
            }
        }
    }

    #[test]
    fn greedy_evaluation_is_repeatable() {
        let cfg = config();
        let sender = Sender::new(&cfg, &mut ChaCha8Rng::seed_from_u64(5));
        let a = sender
            .generate(targets().view(), Mode::Evaluation, &mut ChaCha8Rng::seed_from_u64(1))
            .unwrap();
        let b = sender
            .generate(targets().view(), Mode::Evaluation, &mut ChaCha8Rng::seed_from_u64(99))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_wrong_feature_width() {
        let sender = biased_sender(0);
        let err = sender
            .generate(
                Array2::zeros((2, 4)).view(),
                Mode::Evaluation,
                &mut ChaCha8Rng::seed_from_u64(0),
            )
            .unwrap_err();
        assert_eq!(
            err,
            GameError::FeatureMismatch {
                input: "sender targets".to_string(),
                expected: 3,
                found: 4
            }
        );
    }

    #[test]
    fn from_parts_rejects_misshapen_layer() {
        let cfg = config();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let err = Sender::from_parts(
            &cfg,
            Linear::new("h", 3, 6, &mut rng),
            LstmCell::new("c", 4, 6, &mut rng),
            Embedding::new("e", 5, 4, &mut rng),
            Linear::new("v", 6, 4, &mut rng),
        )
        .unwrap_err();
        assert!(matches!(err, GameError::ShapeMismatch { what: "layer", .. }));
    }

    #[test]
    fn parameter_names_are_stable() {
        let sender = biased_sender(0);
        let mut names = Vec::new();
        sender.visit_parameters(&mut |p| names.push(p.name().to_string()));
        assert_eq!(names.first().map(String::as_str), Some("sender.to_hidden.weight"));
        assert_eq!(names.last().map(String::as_str), Some("sender.to_vocab.bias"));
        assert_eq!(names.len(), 2 + 4 + 1 + 2);
    }
}
