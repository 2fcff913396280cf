//! Named learned matrices and the visitor interface over them.

use babble_core::GameError;
use ndarray::{Array2, ArrayView2, ArrayViewMut2};

/// A named, learned matrix.
///
/// Biases are stored as `1 × n` rows so every parameter has the same
/// rank. The shape is fixed at construction: the mutable accessors hand
/// out views, and [`set`](Parameter::set) rejects reshaping.
#[derive(Clone, Debug, PartialEq)]
pub struct Parameter {
    name: String,
    value: Array2<f32>,
}

impl Parameter {
    /// Wrap a matrix under a dotted name such as `sender.to_vocab.weight`.
    pub fn new(name: impl Into<String>, value: Array2<f32>) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// The parameter's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        self.value.dim()
    }

    /// Number of scalar entries.
    pub fn len(&self) -> usize {
        self.value.len()
    }

    /// `true` if the matrix has no entries.
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Read-only view of the values.
    pub fn value(&self) -> ArrayView2<'_, f32> {
        self.value.view()
    }

    /// Mutable view of the values, for in-place optimiser updates.
    pub fn value_mut(&mut self) -> ArrayViewMut2<'_, f32> {
        self.value.view_mut()
    }

    /// Replace the values wholesale.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::ShapeMismatch`] if `value` has a different shape.
    pub fn set(&mut self, value: Array2<f32>) -> Result<(), GameError> {
        if value.dim() != self.value.dim() {
            return Err(GameError::ShapeMismatch {
                what: "parameter",
                reason: format!(
                    "{}: cannot replace {:?} with {:?}",
                    self.name,
                    self.value.dim(),
                    value.dim()
                ),
            });
        }
        self.value = value;
        Ok(())
    }

    /// Set every entry to `v`.
    pub fn fill(&mut self, v: f32) {
        self.value.fill(v);
    }
}

/// Anything that owns [`Parameter`]s.
///
/// Forward computation only ever reads parameters; the visitor
/// methods are the seam through which an external optimiser writes them
/// between passes.
pub trait Module {
    /// Visit every parameter, in a stable order.
    fn visit_parameters(&self, visitor: &mut dyn FnMut(&Parameter));

    /// Visit every parameter mutably, in the same order.
    fn visit_parameters_mut(&mut self, visitor: &mut dyn FnMut(&mut Parameter));

    /// Total number of learned scalars.
    fn parameter_count(&self) -> usize {
        let mut n = 0;
        self.visit_parameters(&mut |p| n += p.len());
        n
    }

    /// Look up a parameter by name and apply `f` to it.
    ///
    /// Returns `false` if no parameter has that name.
    fn with_parameter_mut(&mut self, name: &str, f: &mut dyn FnMut(&mut Parameter)) -> bool {
        let mut found = false;
        self.visit_parameters_mut(&mut |p| {
            if p.name() == name {
                f(p);
                found = true;
            }
        });
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_rejects_reshape() {
        let mut p = Parameter::new("w", Array2::zeros((2, 3)));
        assert!(p.set(Array2::ones((3, 2))).is_err());
        p.set(Array2::ones((2, 3))).unwrap();
        assert!(p.value().iter().all(|&v| v == 1.0));
    }

    #[test]
    fn value_mut_updates_in_place() {
        let mut p = Parameter::new("b", Array2::zeros((1, 4)));
        p.value_mut()[[0, 2]] = 5.0;
        assert_eq!(p.value()[[0, 2]], 5.0);
        assert_eq!(p.shape(), (1, 4));
        assert_eq!(p.len(), 4);
    }
}
