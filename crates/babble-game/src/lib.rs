//! The communication protocol of the Babble referential game.
//!
//! A [`Game`] wires four parts together for each forward pass:
//!
//! 1. [`Sender`] turns the target's features into a variable-length
//!    message, recording each example's stopping length.
//! 2. [`Terminator`] overwrites everything after the stopping length
//!    with the boundary token.
//! 3. [`Receiver`] reads the padded message back into feature space.
//! 4. [`ContrastiveScorer`] scores the target and every distractor
//!    against the Receiver's guess and reduces to loss and accuracy.
//!
//! Token representation follows the [`Mode`](babble_core::Mode) of the
//! pass: relaxed one-hot vectors in training, vocabulary indices in
//! evaluation (see [`MessageBatch`]).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod game;
pub mod receiver;
pub mod scorer;
pub mod sender;
pub mod stopping;
pub mod terminator;
pub mod token;
mod validate;

pub use game::{Game, GameInputs, GameOutput, Targets};
pub use receiver::Receiver;
pub use scorer::{ContrastiveScorer, Scores};
pub use sender::{Generated, Sender};
pub use stopping::{StopState, StopTracker};
pub use terminator::Terminator;
pub use token::{MessageBatch, Position, Token};
