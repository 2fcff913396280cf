//! Affine projection `y = x W + b`.

use babble_core::GameError;
use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::Rng;

use crate::init;
use crate::param::{Module, Parameter};

/// Fully-connected layer with weight `[input_dim, output_dim]` and bias
/// `[1, output_dim]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Linear {
    weight: Parameter,
    bias: Parameter,
}

impl Linear {
    /// A layer with weight and bias uniform in `±1/sqrt(input_dim)`.
    pub fn new<R: Rng + ?Sized>(
        name: &str,
        input_dim: usize,
        output_dim: usize,
        rng: &mut R,
    ) -> Self {
        let bound = init::fan_in_bound(input_dim);
        Self {
            weight: Parameter::new(
                format!("{name}.weight"),
                init::uniform(input_dim, output_dim, bound, rng),
            ),
            bias: Parameter::new(
                format!("{name}.bias"),
                init::uniform(1, output_dim, bound, rng),
            ),
        }
    }

    /// A layer from explicit values.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::ShapeMismatch`] if `bias.len()` differs from
    /// the weight's column count.
    pub fn from_parts(name: &str, weight: Array2<f32>, bias: Array1<f32>) -> Result<Self, GameError> {
        if bias.len() != weight.ncols() {
            return Err(GameError::ShapeMismatch {
                what: "linear",
                reason: format!(
                    "{name}: bias of {} for a weight with {} outputs",
                    bias.len(),
                    weight.ncols()
                ),
            });
        }
        Ok(Self {
            weight: Parameter::new(format!("{name}.weight"), weight),
            bias: Parameter::new(format!("{name}.bias"), bias.insert_axis(Axis(0))),
        })
    }

    /// Width of the input.
    pub fn input_dim(&self) -> usize {
        self.weight.shape().0
    }

    /// Width of the output.
    pub fn output_dim(&self) -> usize {
        self.weight.shape().1
    }

    /// The weight parameter.
    pub fn weight(&self) -> &Parameter {
        &self.weight
    }

    /// The bias parameter.
    pub fn bias(&self) -> &Parameter {
        &self.bias
    }

    /// Apply to a `[batch, input_dim]` matrix.
    ///
    /// # Panics
    ///
    /// Panics if `input` does not have `input_dim` columns; callers
    /// validate widths at their boundary.
    pub fn forward(&self, input: ArrayView2<'_, f32>) -> Array2<f32> {
        let mut out = input.dot(&self.weight.value());
        out += &self.bias.value().row(0);
        out
    }
}

impl Module for Linear {
    fn visit_parameters(&self, visitor: &mut dyn FnMut(&Parameter)) {
        visitor(&self.weight);
        visitor(&self.bias);
    }

    fn visit_parameters_mut(&mut self, visitor: &mut dyn FnMut(&mut Parameter)) {
        visitor(&mut self.weight);
        visitor(&mut self.bias);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn forward_matches_manual() {
        let layer = Linear::from_parts(
            "fc",
            array![[1.0, 0.0], [0.0, 2.0], [1.0, 1.0]],
            array![0.5, -0.5],
        )
        .unwrap();
        let out = layer.forward(array![[1.0, 1.0, 1.0], [0.0, -1.0, 2.0]].view());
        assert_eq!(out, array![[2.5, 2.5], [2.5, -0.5]]);
    }

    #[test]
    fn from_parts_rejects_bias_width() {
        let err = Linear::from_parts("fc", Array2::zeros((3, 2)), Array1::zeros(3)).unwrap_err();
        assert!(matches!(err, GameError::ShapeMismatch { what: "linear", .. }));
    }

    #[test]
    fn seeded_layer_is_bounded_and_named() {
        let layer = Linear::new("proj", 4, 3, &mut ChaCha8Rng::seed_from_u64(0));
        assert_eq!(layer.input_dim(), 4);
        assert_eq!(layer.output_dim(), 3);
        assert!(layer.weight().value().iter().all(|v| v.abs() <= 0.5));
        let mut names = Vec::new();
        layer.visit_parameters(&mut |p| names.push(p.name().to_string()));
        assert_eq!(names, vec!["proj.weight", "proj.bias"]);
        assert_eq!(layer.parameter_count(), 15);
    }
}
