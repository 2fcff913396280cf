//! Evaluation loops for the Babble referential game.
//!
//! [`evaluate`] runs a game over a sequence of batches with one caller
//! RNG. [`evaluate_seeded`] and [`EvalPool`] derive each batch's RNG from
//! a base seed and the batch index (`seed ^ index`), so a pool of any
//! size reproduces the sequential seeded run exactly.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod evaluate;
pub mod meter;
pub mod pool;

pub use evaluate::{batch_rng, evaluate, evaluate_seeded, EvalReport};
pub use meter::AverageMeter;
pub use pool::EvalPool;
