//! Message representation in its two execution-mode forms.
//!
//! A whole batch is either relaxed or discrete; mixing forms inside one
//! pass is unrepresentable. Downstream code matches on the tag rather
//! than inspecting numeric types.

use babble_core::{GameError, Mode, TokenId};
use babble_nn::{Embedding, StraightThrough};
use ndarray::{concatenate, s, Array2, Array3, ArrayView1, ArrayView2, Axis};

/// A batch of messages, `positions = max_sentence_length + 1` long.
#[derive(Clone, Debug, PartialEq)]
pub enum MessageBatch {
    /// Training form: straight-through tokens, `[batch, positions, vocab]`.
    Relaxed {
        /// Forward values: exact one-hot rows.
        hard: Array3<f32>,
        /// Relaxed samples the gradient flows through.
        soft: Array3<f32>,
    },
    /// Evaluation form: vocabulary indices, `[batch, positions]`.
    Discrete(Array2<TokenId>),
}

/// One token of one message.
#[derive(Clone, Debug, PartialEq)]
pub enum Token<'a> {
    /// A straight-through token.
    Relaxed {
        /// One-hot forward value.
        hard: ArrayView1<'a, f32>,
        /// Relaxed sample.
        soft: ArrayView1<'a, f32>,
    },
    /// A vocabulary index.
    Discrete(TokenId),
}

impl Token<'_> {
    /// The symbol this token stands for (the hot index of a relaxed token).
    pub fn id(&self) -> TokenId {
        match self {
            Self::Relaxed { hard, .. } => TokenId(babble_nn::ops::argmax(hard.view()) as u32),
            Self::Discrete(t) => *t,
        }
    }
}

/// One position across the whole batch, ready to be embedded.
#[derive(Clone, Debug, PartialEq)]
pub enum Position<'a> {
    /// `[batch, vocab]` one-hot forward values.
    Relaxed(ArrayView2<'a, f32>),
    /// One index per example.
    Discrete(Vec<TokenId>),
}

impl Position<'_> {
    /// Embed: a weighted row combination for relaxed tokens, a row
    /// lookup for discrete ones.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::TokenOutOfRange`] for a discrete token past
    /// the table.
    pub fn embed(&self, embedding: &Embedding) -> Result<Array2<f32>, GameError> {
        match self {
            Self::Relaxed(hard) => Ok(embedding.mix(hard.view())),
            Self::Discrete(tokens) => embedding.lookup(tokens),
        }
    }
}

impl MessageBatch {
    /// Stack relaxed steps (seed first) into a batch.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::ShapeMismatch`] if `steps` is empty or the
    /// steps disagree on shape.
    pub fn from_relaxed_steps(steps: &[StraightThrough]) -> Result<Self, GameError> {
        let first = steps.first().ok_or_else(|| GameError::ShapeMismatch {
            what: "message",
            reason: "no positions".to_string(),
        })?;
        let (batch, vocab) = first.hard.dim();
        let mut hard = Array3::zeros((batch, steps.len(), vocab));
        let mut soft = Array3::zeros((batch, steps.len(), vocab));
        for (t, step) in steps.iter().enumerate() {
            if step.hard.dim() != (batch, vocab) || step.soft.dim() != (batch, vocab) {
                return Err(GameError::ShapeMismatch {
                    what: "message",
                    reason: format!(
                        "position {t} is {:?}, expected {:?}",
                        step.hard.dim(),
                        (batch, vocab)
                    ),
                });
            }
            hard.slice_mut(s![.., t, ..]).assign(&step.hard);
            soft.slice_mut(s![.., t, ..]).assign(&step.soft);
        }
        Ok(Self::Relaxed { hard, soft })
    }

    /// Stack discrete steps (seed first) into a batch.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::ShapeMismatch`] if `steps` is empty or the
    /// steps disagree on batch size.
    pub fn from_discrete_steps(steps: &[Vec<TokenId>]) -> Result<Self, GameError> {
        let first = steps.first().ok_or_else(|| GameError::ShapeMismatch {
            what: "message",
            reason: "no positions".to_string(),
        })?;
        let batch = first.len();
        let mut tokens = Array2::from_elem((batch, steps.len()), TokenId::default());
        for (t, step) in steps.iter().enumerate() {
            if step.len() != batch {
                return Err(GameError::ShapeMismatch {
                    what: "message",
                    reason: format!("position {t} has {} tokens, expected {batch}", step.len()),
                });
            }
            for (b, &token) in step.iter().enumerate() {
                tokens[[b, t]] = token;
            }
        }
        Ok(Self::Discrete(tokens))
    }

    /// The mode this batch was produced in.
    pub fn mode(&self) -> Mode {
        match self {
            Self::Relaxed { .. } => Mode::Training,
            Self::Discrete(_) => Mode::Evaluation,
        }
    }

    /// Number of messages.
    pub fn batch_size(&self) -> usize {
        match self {
            Self::Relaxed { hard, .. } => hard.dim().0,
            Self::Discrete(tokens) => tokens.nrows(),
        }
    }

    /// Number of positions per message, start seed included.
    pub fn positions(&self) -> usize {
        match self {
            Self::Relaxed { hard, .. } => hard.dim().1,
            Self::Discrete(tokens) => tokens.ncols(),
        }
    }

    /// Token `t` of message `b`.
    ///
    /// # Panics
    ///
    /// Panics if `b` or `t` is out of bounds.
    pub fn token(&self, b: usize, t: usize) -> Token<'_> {
        match self {
            Self::Relaxed { hard, soft } => Token::Relaxed {
                hard: hard.slice(s![b, t, ..]),
                soft: soft.slice(s![b, t, ..]),
            },
            Self::Discrete(tokens) => Token::Discrete(tokens[[b, t]]),
        }
    }

    /// Position `t` across the batch.
    ///
    /// # Panics
    ///
    /// Panics if `t` is out of bounds.
    pub fn position(&self, t: usize) -> Position<'_> {
        match self {
            Self::Relaxed { hard, .. } => Position::Relaxed(hard.slice(s![.., t, ..])),
            Self::Discrete(tokens) => Position::Discrete(tokens.column(t).to_vec()),
        }
    }

    /// Symbol ids of every token, `[batch, positions]`, in either form.
    pub fn token_ids(&self) -> Array2<TokenId> {
        match self {
            Self::Relaxed { hard, .. } => {
                let (batch, positions, _) = hard.dim();
                Array2::from_shape_fn((batch, positions), |(b, t)| {
                    TokenId(babble_nn::ops::argmax(hard.slice(s![b, t, ..])) as u32)
                })
            }
            Self::Discrete(tokens) => tokens.clone(),
        }
    }

    /// Join batches along the batch axis.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::ModeMismatch`] if the batches are in
    /// different forms, and [`GameError::ShapeMismatch`] if there are
    /// none or their other dimensions disagree.
    pub fn concat(batches: &[MessageBatch]) -> Result<MessageBatch, GameError> {
        let first = batches.first().ok_or_else(|| GameError::ShapeMismatch {
            what: "message",
            reason: "nothing to concatenate".to_string(),
        })?;
        let mode = first.mode();
        if let Some(other) = batches.iter().find(|m| m.mode() != mode) {
            return Err(GameError::ModeMismatch {
                expected: mode,
                found: other.mode(),
            });
        }
        let shape_err = |e: ndarray::ShapeError| GameError::ShapeMismatch {
            what: "message",
            reason: e.to_string(),
        };
        match first {
            Self::Relaxed { .. } => {
                let mut hards = Vec::with_capacity(batches.len());
                let mut softs = Vec::with_capacity(batches.len());
                for m in batches {
                    if let Self::Relaxed { hard, soft } = m {
                        hards.push(hard.view());
                        softs.push(soft.view());
                    }
                }
                Ok(Self::Relaxed {
                    hard: concatenate(Axis(0), &hards).map_err(shape_err)?,
                    soft: concatenate(Axis(0), &softs).map_err(shape_err)?,
                })
            }
            Self::Discrete(_) => {
                let views: Vec<_> = batches
                    .iter()
                    .filter_map(|m| match m {
                        Self::Discrete(tokens) => Some(tokens.view()),
                        Self::Relaxed { .. } => None,
                    })
                    .collect();
                Ok(Self::Discrete(
                    concatenate(Axis(0), &views).map_err(shape_err)?,
                ))
            }
        }
    }
}
