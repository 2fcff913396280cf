//! Token embedding table, addressed by index or by a distribution.

use babble_core::{GameError, TokenId};
use ndarray::{Array2, ArrayView2, Axis};
use rand::Rng;

use crate::init;
use crate::param::{Module, Parameter};

/// Embedding table of shape `[vocab_size, embedding_dim]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Embedding {
    weight: Parameter,
}

impl Embedding {
    /// A table with standard-normal rows.
    pub fn new<R: Rng + ?Sized>(name: &str, vocab_size: usize, dim: usize, rng: &mut R) -> Self {
        Self {
            weight: Parameter::new(
                format!("{name}.weight"),
                init::standard_normal(vocab_size, dim, rng),
            ),
        }
    }

    /// A table from explicit rows.
    pub fn from_weight(name: &str, weight: Array2<f32>) -> Self {
        Self {
            weight: Parameter::new(format!("{name}.weight"), weight),
        }
    }

    /// Number of rows.
    pub fn vocab_size(&self) -> usize {
        self.weight.shape().0
    }

    /// Width of each row.
    pub fn dim(&self) -> usize {
        self.weight.shape().1
    }

    /// The table parameter.
    pub fn weight(&self) -> &Parameter {
        &self.weight
    }

    /// Direct row lookup for discrete tokens.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::TokenOutOfRange`] for a token past the table.
    pub fn lookup(&self, tokens: &[TokenId]) -> Result<Array2<f32>, GameError> {
        let vocab_size = self.vocab_size();
        let rows = tokens
            .iter()
            .map(|&token| {
                if token.index() < vocab_size {
                    Ok(token.index())
                } else {
                    Err(GameError::TokenOutOfRange { token, vocab_size })
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.weight.value().select(Axis(0), &rows))
    }

    /// Weighted combination of rows for relaxed tokens: `probs · E`.
    ///
    /// For a one-hot row this equals [`lookup`](Self::lookup) of its index.
    pub fn mix(&self, probs: ArrayView2<'_, f32>) -> Array2<f32> {
        probs.dot(&self.weight.value())
    }
}

impl Module for Embedding {
    fn visit_parameters(&self, visitor: &mut dyn FnMut(&Parameter)) {
        visitor(&self.weight);
    }

    fn visit_parameters_mut(&mut self, visitor: &mut dyn FnMut(&mut Parameter)) {
        visitor(&mut self.weight);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::one_hot_rows;
    use ndarray::array;

    fn table() -> Embedding {
        Embedding::from_weight("emb", array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]])
    }

    #[test]
    fn lookup_selects_rows() {
        let e = table();
        let out = e.lookup(&[TokenId(2), TokenId(0)]).unwrap();
        assert_eq!(out, array![[5.0, 6.0], [1.0, 2.0]]);
    }

    #[test]
    fn lookup_rejects_out_of_range() {
        let err = table().lookup(&[TokenId(3)]).unwrap_err();
        assert_eq!(
            err,
            GameError::TokenOutOfRange {
                token: TokenId(3),
                vocab_size: 3
            }
        );
    }

    #[test]
    fn one_hot_mix_equals_lookup() {
        let e = table();
        let mixed = e.mix(one_hot_rows(&[1, 2], 3).view());
        assert_eq!(mixed, e.lookup(&[TokenId(1), TokenId(2)]).unwrap());
    }

    #[test]
    fn mix_weights_rows() {
        let out = table().mix(array![[0.5, 0.5, 0.0]].view());
        assert_eq!(out, array![[2.0, 3.0]]);
    }
}
