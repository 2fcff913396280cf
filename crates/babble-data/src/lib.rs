//! Data plumbing for the Babble referential game.
//!
//! Turns a matrix of item features (one row per item) into the
//! [`GameInputs`](babble_game::GameInputs) batches a game consumes:
//!
//! - [`FeatureStats`] fits per-feature mean and deviation on a training
//!   split and normalises any split with them.
//! - [`DistractorSampler`] draws, for every target item, `k` distinct
//!   distractor items.
//! - [`FeatureBank`] gathers those candidate tuples into fixed-size
//!   batches.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod bank;
pub mod error;
pub mod sampler;
pub mod stats;

pub use bank::FeatureBank;
pub use error::DataError;
pub use sampler::{Candidates, DistractorSampler};
pub use stats::FeatureStats;
