//! Numeric building blocks for the Babble agents.
//!
//! Everything here operates on batch-major `ndarray` matrices
//! (`[batch, width]`) in `f32`:
//!
//! - [`Parameter`] / [`Module`]: named learned matrices and a visitor
//!   interface through which an external optimiser updates them.
//! - [`Linear`], [`Embedding`], [`LstmCell`]: the layers both agents
//!   are assembled from.
//! - [`ops`] and [`sampling`]: softmax, arg-max, one-hot, Gumbel-softmax
//!   relaxation with straight-through selection, categorical draws.
//!
//! The forward path never mutates parameters. All randomness comes from
//! a caller-supplied [`rand::Rng`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod embedding;
pub mod init;
pub mod linear;
pub mod lstm;
pub mod ops;
pub mod param;
pub mod sampling;

pub use embedding::Embedding;
pub use linear::Linear;
pub use lstm::{LstmCell, LstmState};
pub use param::{Module, Parameter};
pub use sampling::StraightThrough;
