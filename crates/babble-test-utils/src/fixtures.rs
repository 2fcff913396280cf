//! Configurations, games and inputs shared by integration tests and
//! benchmarks.

use babble_core::{GameConfig, TokenId};
use babble_game::{Game, GameInputs, Receiver, Sender};
use babble_nn::init::standard_normal;
use babble_nn::{Embedding, Linear, LstmCell, Module};
use ndarray::{array, Array1, Array2};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Boundary token of [`reference_config`].
pub const REFERENCE_BOUNDARY: TokenId = TokenId(4);

/// A non-boundary token for [`reference_game`] to repeat.
pub const REFERENCE_FILLER: TokenId = TokenId(0);

/// Logit gap between the favourite token and the rest. Large enough that
/// Gumbel noise never overturns it in practice.
const FAVOURITE_LOGIT: f32 = 30.0;

/// Batch 2, vocabulary 5 (boundary 4), up to 3 symbols, 2 features.
pub fn reference_config() -> GameConfig {
    GameConfig::builder()
        .n_features(2)
        .vocab_size(5)
        .embedding_dim(3)
        .hidden_size(4)
        .batch_size(2)
        .max_sentence_length(3)
        .build()
        .expect("reference config is valid")
}

/// The hand-computable game described in the crate docs.
///
/// `favourite` is the token the Sender emits at every step:
/// [`REFERENCE_BOUNDARY`] gives lengths `[2, 2]`, anything else gives
/// the sentinel `[4, 4]`.
pub fn reference_game(favourite: TokenId) -> Game {
    reference_game_for(reference_config(), favourite)
}

/// [`reference_game`] built for another configuration with two features,
/// for example one with a different boundary token.
pub fn reference_game_for(config: GameConfig, favourite: TokenId) -> Game {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let (f, h, e, v) = (
        config.n_features(),
        config.hidden_size(),
        config.embedding_dim(),
        config.vocab_size(),
    );

    let mut vocab_bias = Array1::zeros(v);
    vocab_bias[favourite.index()] = FAVOURITE_LOGIT;
    let sender = Sender::from_parts(
        &config,
        Linear::new("sender.to_hidden", f, h, &mut rng),
        LstmCell::new("sender.cell", e, h, &mut rng),
        Embedding::new("sender.embedding", v, e, &mut rng),
        Linear::from_parts("sender.to_vocab", Array2::zeros((h, v)), vocab_bias)
            .expect("matching shapes"),
    )
    .expect("sender fits config");

    let receiver = Receiver::from_parts(
        &config,
        Embedding::new("receiver.embedding", v, e, &mut rng),
        LstmCell::new("receiver.cell", e, h, &mut rng),
        Linear::from_parts("receiver.to_features", Array2::zeros((h, f)), array![1.0, 0.5])
            .expect("matching shapes"),
    )
    .expect("receiver fits config");

    Game::from_agents(config, sender, receiver).expect("agents fit config")
}

/// Targets `[[2, 0], [0, 1]]`, one distractor `[[1, 0], [1, 1]]`.
pub fn reference_inputs() -> GameInputs {
    GameInputs::new(array![[2.0, 0.0], [0.0, 1.0]], vec![array![[1.0, 0.0], [1.0, 1.0]]])
}

/// Batch 3, vocabulary 4 (boundary 3), up to 3 symbols, 2 features,
/// embedding and hidden width 3.
pub fn frozen_config() -> GameConfig {
    GameConfig::builder()
        .n_features(2)
        .vocab_size(4)
        .embedding_dim(3)
        .hidden_size(3)
        .batch_size(3)
        .max_sentence_length(3)
        .build()
        .expect("frozen config is valid")
}

/// Entry `(row, col)` of the `index`-th parameter of [`frozen_game`]:
/// a multiple of `1/4` in `[-2, 2]`.
pub fn frozen_value(index: usize, row: usize, col: usize) -> f32 {
    let step = (index * 13 + row * 3 + col * 7 + 5) % 17;
    (step as f32 / 8.0 - 1.0) * 2.0
}

/// A game whose every parameter, in visiting order, is filled from
/// [`frozen_value`]. Unlike [`reference_game`] nothing is zeroed, so the
/// recurrence of both agents shapes the outcome. With [`frozen_inputs`]
/// greedy evaluation stops the three examples at lengths `[4, 3, 2]`.
pub fn frozen_game() -> Game {
    let mut game = seeded_game(frozen_config(), 0);
    let mut index = 0;
    game.visit_parameters_mut(&mut |p| {
        for ((row, col), v) in p.value_mut().indexed_iter_mut() {
            *v = frozen_value(index, row, col);
        }
        index += 1;
    });
    game
}

/// Three targets and two distractor matrices for [`frozen_game`].
pub fn frozen_inputs() -> GameInputs {
    GameInputs::new(
        array![[1.0, -0.5], [0.0, 2.0], [-1.5, 0.5]],
        vec![
            array![[0.5, 0.5], [1.0, 0.0], [-1.0, -1.0]],
            array![[-0.5, 1.0], [0.25, -0.75], [2.0, 0.0]],
        ],
    )
}

/// A freshly initialised game, reproducible from `seed`.
pub fn seeded_game(config: GameConfig, seed: u64) -> Game {
    Game::new(config, &mut ChaCha8Rng::seed_from_u64(seed))
}

/// Standard-normal targets and `distractors` distractor matrices sized
/// for `config`.
pub fn random_inputs(config: &GameConfig, distractors: usize, seed: u64) -> GameInputs {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let shape = (config.batch_size(), config.n_features());
    let targets = standard_normal(shape.0, shape.1, &mut rng);
    let distractors = (0..distractors)
        .map(|_| standard_normal(shape.0, shape.1, &mut rng))
        .collect();
    GameInputs::new(targets, distractors)
}
