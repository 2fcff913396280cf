//! Benchmark profiles for the Babble referential game.
//!
//! - [`reference_profile`]: 512 features, vocabulary 25, sentences of
//!   up to 10 symbols, batch 32, 4 distractors
//! - [`small_profile`]: a toy game for quick comparisons
//! - [`profile_batches`]: deterministic random inputs for a profile

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use babble_core::GameConfig;
use babble_game::{Game, GameInputs};
use babble_nn::init::standard_normal;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Distractors per example in every profile.
pub const DISTRACTORS: usize = 4;

/// A mid-sized game: 512 features, vocabulary 25, up to 10 symbols,
/// embedding and hidden size 64, batch 32.
pub fn reference_profile() -> GameConfig {
    GameConfig::builder()
        .n_features(512)
        .vocab_size(25)
        .batch_size(32)
        .max_sentence_length(10)
        .build()
        .unwrap()
}

/// A toy game: 16 features, vocabulary 5, up to 4 symbols, batch 8.
pub fn small_profile() -> GameConfig {
    GameConfig::builder()
        .n_features(16)
        .vocab_size(5)
        .embedding_dim(8)
        .hidden_size(8)
        .batch_size(8)
        .max_sentence_length(4)
        .build()
        .unwrap()
}

/// A freshly initialised game for `config`.
pub fn profile_game(config: GameConfig, seed: u64) -> Game {
    Game::new(config, &mut ChaCha8Rng::seed_from_u64(seed))
}

/// `count` batches of standard-normal targets with [`DISTRACTORS`]
/// distractors each.
pub fn profile_batches(config: &GameConfig, count: usize, seed: u64) -> Vec<GameInputs> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let (rows, cols) = (config.batch_size(), config.n_features());
    (0..count)
        .map(|_| {
            let targets = standard_normal(rows, cols, &mut rng);
            let distractors = (0..DISTRACTORS)
                .map(|_| standard_normal(rows, cols, &mut rng))
                .collect();
            GameInputs::new(targets, distractors)
        })
        .collect()
}
