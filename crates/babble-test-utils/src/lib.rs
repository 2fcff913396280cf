//! Test fixtures for Babble development.
//!
//! [`reference_game`] builds a tiny game whose outputs can be worked out
//! by hand: the Sender's vocabulary projection ignores its hidden state
//! and always prefers one token, and the Receiver's feature projection
//! ignores the message and always answers `[1.0, 0.5]`. With
//! [`reference_inputs`] the target scores are `[2.0, 0.5]` and the
//! distractor scores `[1.0, 1.5]`, so only the second example pays a
//! hinge penalty of `2.0` per unit of message length.
//!
//! [`frozen_game`] fills every parameter from a fixed integer pattern
//! instead, so its outputs depend on both recurrences; they are pinned
//! as constants in the integration tests.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{
    frozen_config, frozen_game, frozen_inputs, frozen_value, random_inputs, reference_config,
    reference_game, reference_game_for, reference_inputs, seeded_game, REFERENCE_BOUNDARY,
    REFERENCE_FILLER,
};
