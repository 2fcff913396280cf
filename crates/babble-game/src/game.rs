//! The game orchestrator: Sender → Terminator → Receiver → Scorer.

use babble_core::{GameConfig, GameError, Mode};
use babble_nn::{Module, Parameter};
use ndarray::{s, Array2, Array3, ArrayView2};
use rand::Rng;
use tracing::{debug, warn};

use crate::receiver::Receiver;
use crate::scorer::{ContrastiveScorer, Scores};
use crate::sender::Sender;
use crate::terminator::Terminator;
use crate::token::MessageBatch;
use crate::validate::check_features;

/// The target of each example, as one or two views.
#[derive(Clone, Debug, PartialEq)]
pub enum Targets {
    /// One `[batch, n_features]` matrix seen by both agents.
    Shared(Array2<f32>),
    /// Separate perspectives: the Sender describes `sender`, and the
    /// Receiver's guess is scored against `receiver`.
    Decoupled {
        /// The Sender's view.
        sender: Array2<f32>,
        /// The view the Receiver is scored against.
        receiver: Array2<f32>,
    },
}

impl Targets {
    /// Split a `[batch, 2, n_features]` array into decoupled views
    /// (index 0 for the Sender, index 1 for the Receiver).
    ///
    /// # Errors
    ///
    /// Returns [`GameError::ShapeMismatch`] if the middle axis is not 2.
    pub fn from_views(views: Array3<f32>) -> Result<Self, GameError> {
        if views.dim().1 != 2 {
            return Err(GameError::ShapeMismatch {
                what: "targets",
                reason: format!("expected 2 views per example, got {}", views.dim().1),
            });
        }
        Ok(Self::Decoupled {
            sender: views.slice(s![.., 0, ..]).to_owned(),
            receiver: views.slice(s![.., 1, ..]).to_owned(),
        })
    }

    /// What the Sender describes.
    pub fn sender_view(&self) -> ArrayView2<'_, f32> {
        match self {
            Self::Shared(t) => t.view(),
            Self::Decoupled { sender, .. } => sender.view(),
        }
    }

    /// What the Receiver's guess is scored against.
    pub fn receiver_view(&self) -> ArrayView2<'_, f32> {
        match self {
            Self::Shared(t) => t.view(),
            Self::Decoupled { receiver, .. } => receiver.view(),
        }
    }
}

/// Everything one forward pass consumes besides parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct GameInputs {
    /// Target features.
    pub targets: Targets,
    /// Distractor features, one `[batch, n_features]` matrix per
    /// distractor slot.
    pub distractors: Vec<Array2<f32>>,
}

impl GameInputs {
    /// Inputs with a single shared target view.
    pub fn new(targets: Array2<f32>, distractors: Vec<Array2<f32>>) -> Self {
        Self {
            targets: Targets::Shared(targets),
            distractors,
        }
    }

    /// Number of examples, read off the Sender's target view.
    pub fn batch_size(&self) -> usize {
        self.targets.sender_view().nrows()
    }
}

/// Result of one forward pass.
#[derive(Clone, Debug, PartialEq)]
pub struct GameOutput {
    /// Mean length-weighted hinge loss over the batch.
    pub loss: f32,
    /// Fraction of examples where the target won.
    pub accuracy: f32,
    /// The padded message the Receiver saw.
    pub message: MessageBatch,
    /// Stopping length of every example.
    pub lengths: Vec<usize>,
    /// Per-example scores and losses.
    pub scores: Scores,
}

impl GameOutput {
    /// Mean stopping length over the batch.
    pub fn mean_length(&self) -> f32 {
        if self.lengths.is_empty() {
            return f32::NAN;
        }
        self.lengths.iter().sum::<usize>() as f32 / self.lengths.len() as f32
    }
}

/// A Sender and a Receiver playing the referential game.
///
/// Forward passes take `&self`: the same instance may serve concurrent
/// passes in different modes, each owning its own recurrent state and
/// stopping lengths.
#[derive(Clone, Debug, PartialEq)]
pub struct Game {
    config: GameConfig,
    sender: Sender,
    receiver: Receiver,
    terminator: Terminator,
    scorer: ContrastiveScorer,
}

impl Game {
    /// A game with freshly initialised agents.
    pub fn new<R: Rng + ?Sized>(config: GameConfig, rng: &mut R) -> Self {
        let sender = Sender::new(&config, rng);
        let receiver = Receiver::new(&config, rng);
        Self::assemble(config, sender, receiver)
    }

    /// A game from existing agents.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::ShapeMismatch`] if either agent was built for
    /// a different configuration.
    pub fn from_agents(
        config: GameConfig,
        sender: Sender,
        receiver: Receiver,
    ) -> Result<Self, GameError> {
        for (agent, cfg) in [("sender", sender.config()), ("receiver", receiver.config())] {
            if *cfg != config {
                return Err(GameError::ShapeMismatch {
                    what: "agent",
                    reason: format!("{agent} was built for a different configuration"),
                });
            }
        }
        Ok(Self::assemble(config, sender, receiver))
    }

    fn assemble(config: GameConfig, sender: Sender, receiver: Receiver) -> Self {
        Self {
            terminator: Terminator::new(&config),
            scorer: ContrastiveScorer::new(config.margin()),
            config,
            sender,
            receiver,
        }
    }

    /// The game's configuration.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// The Sender.
    pub fn sender(&self) -> &Sender {
        &self.sender
    }

    /// The Receiver.
    pub fn receiver(&self) -> &Receiver {
        &self.receiver
    }

    /// Mutable access for an external optimiser.
    pub fn sender_mut(&mut self) -> &mut Sender {
        &mut self.sender
    }

    /// Mutable access for an external optimiser.
    pub fn receiver_mut(&mut self) -> &mut Receiver {
        &mut self.receiver
    }

    /// Check that `inputs` fit this game's configuration.
    ///
    /// # Errors
    ///
    /// - [`GameError::NoDistractors`] if there are no distractors.
    /// - [`GameError::BatchMismatch`] / [`GameError::FeatureMismatch`] for
    ///   any misshapen target view or distractor.
    pub fn validate_inputs(&self, inputs: &GameInputs) -> Result<(), GameError> {
        let (batch, features) = (self.config.batch_size(), self.config.n_features());
        if inputs.distractors.is_empty() {
            return Err(GameError::NoDistractors);
        }
        check_features("sender targets", inputs.targets.sender_view(), batch, features)?;
        check_features(
            "receiver targets",
            inputs.targets.receiver_view(),
            batch,
            features,
        )?;
        for (i, d) in inputs.distractors.iter().enumerate() {
            check_features(&format!("distractor {i}"), d.view(), batch, features)?;
        }
        Ok(())
    }

    /// Play one round: generate, pad, decode, score.
    ///
    /// `rng` drives Gumbel noise in training and categorical draws in
    /// non-greedy evaluation; greedy evaluation never touches it.
    ///
    /// # Errors
    ///
    /// Any error from [`validate_inputs`](Self::validate_inputs) or from
    /// the agents.
    pub fn play<R: Rng + ?Sized>(
        &self,
        inputs: &GameInputs,
        mode: Mode,
        rng: &mut R,
    ) -> Result<GameOutput, GameError> {
        self.validate_inputs(inputs)?;

        let generated = self
            .sender
            .generate(inputs.targets.sender_view(), mode, rng)?;
        let message = self
            .terminator
            .terminate(generated.message, &generated.lengths, mode)?;
        let projected = self.receiver.encode(&message)?;

        let distractors: Vec<_> = inputs.distractors.iter().map(|d| d.view()).collect();
        let scores = self.scorer.score(
            projected.view(),
            inputs.targets.receiver_view(),
            &distractors,
            &generated.lengths,
        )?;

        let output = GameOutput {
            loss: scores.mean_loss(),
            accuracy: scores.accuracy(),
            message,
            lengths: generated.lengths,
            scores,
        };
        debug!(
            %mode,
            batch = self.config.batch_size(),
            loss = output.loss,
            accuracy = output.accuracy,
            mean_length = output.mean_length(),
            "game round"
        );
        if !output.loss.is_finite() {
            warn!(%mode, loss = output.loss, "non-finite game loss");
        }
        Ok(output)
    }
}

impl Module for Game {
    fn visit_parameters(&self, visitor: &mut dyn FnMut(&Parameter)) {
        self.sender.visit_parameters(visitor);
        self.receiver.visit_parameters(visitor);
    }

    fn visit_parameters_mut(&mut self, visitor: &mut dyn FnMut(&mut Parameter)) {
        self.sender.visit_parameters_mut(visitor);
        self.receiver.visit_parameters_mut(visitor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn config() -> GameConfig {
        GameConfig::builder()
            .n_features(3)
            .vocab_size(4)
            .embedding_dim(3)
            .hidden_size(5)
            .batch_size(2)
            .max_sentence_length(2)
            .build()
            .unwrap()
    }

    fn inputs() -> GameInputs {
        GameInputs::new(
            Array2::from_shape_vec((2, 3), vec![1.0, 0.0, 0.5, -0.5, 1.0, 0.0]).unwrap(),
            vec![Array2::from_shape_vec((2, 3), vec![0.0, 1.0, 0.0, 1.0, 1.0, 1.0]).unwrap()],
        )
    }

    #[test]
    fn play_in_both_modes() {
        let game = Game::new(config(), &mut ChaCha8Rng::seed_from_u64(0));
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for mode in [Mode::Training, Mode::Evaluation] {
            let out = game.play(&inputs(), mode, &mut rng).unwrap();
            assert_eq!(out.message.mode(), mode);
            assert_eq!(out.message.positions(), 3);
            assert!(out.loss.is_finite() && out.loss >= 0.0);
            assert!((0.0..=1.0).contains(&out.accuracy));
            assert!(out.lengths.iter().all(|&l| (2..=3).contains(&l)));
        }
    }

    #[test]
    fn decoupled_views_split_middle_axis() {
        let views = Array3::from_shape_fn((2, 2, 3), |(b, v, f)| (b * 100 + v * 10 + f) as f32);
        let t = Targets::from_views(views).unwrap();
        assert_eq!(t.sender_view()[[1, 2]], 102.0);
        assert_eq!(t.receiver_view()[[1, 2]], 112.0);
        assert!(Targets::from_views(Array3::zeros((2, 3, 3))).is_err());
    }

    #[test]
    fn rejects_empty_distractors() {
        let game = Game::new(config(), &mut ChaCha8Rng::seed_from_u64(0));
        let mut bad = inputs();
        bad.distractors.clear();
        let err = game
            .play(&bad, Mode::Evaluation, &mut ChaCha8Rng::seed_from_u64(0))
            .unwrap_err();
        assert_eq!(err, GameError::NoDistractors);
    }

    #[test]
    fn rejects_batch_mismatch() {
        let game = Game::new(config(), &mut ChaCha8Rng::seed_from_u64(0));
        let mut bad = inputs();
        bad.distractors.push(Array2::zeros((3, 3)));
        let err = game
            .play(&bad, Mode::Evaluation, &mut ChaCha8Rng::seed_from_u64(0))
            .unwrap_err();
        assert_eq!(
            err,
            GameError::BatchMismatch {
                input: "distractor 1".to_string(),
                expected: 2,
                found: 3
            }
        );
    }

    #[test]
    fn rejects_agents_from_other_config() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let other = GameConfig::builder()
            .n_features(3)
            .vocab_size(6)
            .batch_size(2)
            .max_sentence_length(2)
            .build()
            .unwrap();
        let sender = Sender::new(&other, &mut rng);
        let receiver = Receiver::new(&config(), &mut rng);
        assert!(Game::from_agents(config(), sender, receiver).is_err());
    }

    #[test]
    fn parameters_cover_both_agents() {
        let game = Game::new(config(), &mut ChaCha8Rng::seed_from_u64(0));
        let expected = game.sender().parameter_count() + game.receiver().parameter_count();
        assert_eq!(game.parameter_count(), expected);
    }
}
