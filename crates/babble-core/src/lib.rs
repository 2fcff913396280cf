//! Core types for the Babble referential game.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary of the game (token identifiers, the boundary token,
//! execution modes), the validated [`GameConfig`], and the error types
//! shared by every other crate in the workspace.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod id;
pub mod mode;
pub mod vocab;

pub use config::{GameConfig, GameConfigBuilder};
pub use error::{ConfigError, GameError};
pub use id::TokenId;
pub use mode::Mode;
pub use vocab::{Vocabulary, BOUNDARY_WORD};
