//! Babble: an emergent-communication referential game.
//!
//! A Sender sees a target's feature vector and emits a variable-length
//! message over a small vocabulary; a Receiver reads the message and
//! guesses a point in feature space; the guess is scored against the
//! target and a set of distractors with a multi-way hinge loss.
//!
//! This is the facade crate that re-exports the public API from all
//! Babble sub-crates.
//!
//! # Quick start
//!
//! ```rust
//! use babble::prelude::*;
//! use ndarray::Array2;
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let config = GameConfig::builder()
//!     .n_features(4)
//!     .vocab_size(10)
//!     .batch_size(2)
//!     .max_sentence_length(5)
//!     .build()?;
//! let mut rng = ChaCha8Rng::seed_from_u64(0);
//! let game = Game::new(config, &mut rng);
//!
//! let inputs = GameInputs::new(Array2::ones((2, 4)), vec![Array2::zeros((2, 4))]);
//! let out = game.play(&inputs, Mode::Evaluation, &mut rng)?;
//! assert_eq!(out.lengths.len(), 2);
//! assert!(out.loss >= 0.0);
//! assert_eq!(out.message.positions(), 6);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `babble-core` | token IDs, modes, vocabulary, configuration, errors |
//! | [`nn`] | `babble-nn` | parameters, affine/embedding/LSTM layers, sampling |
//! | [`game`] | `babble-game` | Sender, Terminator, Receiver, scorer, orchestrator |
//! | [`data`] | `babble-data` | normalisation, distractor sampling, batching |
//! | [`eval`] | `babble-eval` | meters, sequential and worker-pool evaluation |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Token IDs, modes, vocabulary, configuration and errors (`babble-core`).
pub use babble_core as types;

/// Numeric building blocks (`babble-nn`).
///
/// Layers expose their weights through [`nn::Module`] so an external
/// optimiser can update them between forward passes.
pub use babble_nn as nn;

/// The game itself (`babble-game`).
///
/// [`game::Game::play`] runs one forward pass in a given
/// [`types::Mode`].
pub use babble_game as game;

/// Input preparation (`babble-data`).
pub use babble_data as data;

/// Evaluation loops (`babble-eval`).
pub use babble_eval as eval;

/// Common imports for typical Babble usage.
///
/// ```rust
/// use babble::prelude::*;
/// ```
pub mod prelude {
    // Core
    pub use babble_core::{
        ConfigError, GameConfig, GameConfigBuilder, GameError, Mode, TokenId, Vocabulary,
    };

    // Layers
    pub use babble_nn::{Module, Parameter};

    // Game
    pub use babble_game::{
        Game, GameInputs, GameOutput, MessageBatch, Receiver, Scores, Sender, Targets, Token,
    };

    // Data
    pub use babble_data::{DataError, DistractorSampler, FeatureBank, FeatureStats};

    // Evaluation
    pub use babble_eval::{evaluate, evaluate_seeded, AverageMeter, EvalPool, EvalReport};
}
