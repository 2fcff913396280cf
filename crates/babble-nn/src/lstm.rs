//! Batched LSTM cell, stepped one token at a time or scanned over a
//! whole sequence.
//!
//! Gates are laid out `[i | f | g | o]` along the `4 * hidden` axis:
//!
//! ```text
//! z  = x W_ih + h W_hh + b_ih + b_hh
//! c' = σ(z_f) ⊙ c + σ(z_i) ⊙ tanh(z_g)
//! h' = σ(z_o) ⊙ tanh(c')
//! ```

use ndarray::{s, Array2, ArrayView2};
use rand::Rng;

use crate::init;
use crate::param::{Module, Parameter};

fn sigmoid(v: f32) -> f32 {
    1.0 / (1.0 + (-v).exp())
}

/// Hidden and cell state for a batch, `[batch, hidden]` each.
///
/// Owned by a single forward pass and dropped with it.
#[derive(Clone, Debug, PartialEq)]
pub struct LstmState {
    /// Hidden state `h`.
    pub hidden: Array2<f32>,
    /// Cell state `c`.
    pub cell: Array2<f32>,
}

impl LstmState {
    /// All-zero state.
    pub fn zeros(batch: usize, hidden: usize) -> Self {
        Self {
            hidden: Array2::zeros((batch, hidden)),
            cell: Array2::zeros((batch, hidden)),
        }
    }

    /// Given hidden state and a zero cell state.
    pub fn from_hidden(hidden: Array2<f32>) -> Self {
        let cell = Array2::zeros(hidden.raw_dim());
        Self { hidden, cell }
    }
}

/// A single LSTM cell shared by every time step.
#[derive(Clone, Debug, PartialEq)]
pub struct LstmCell {
    hidden_dim: usize,
    weight_ih: Parameter,
    weight_hh: Parameter,
    bias_ih: Parameter,
    bias_hh: Parameter,
}

impl LstmCell {
    /// A cell with every weight uniform in `±1/sqrt(hidden_dim)`.
    pub fn new<R: Rng + ?Sized>(
        name: &str,
        input_dim: usize,
        hidden_dim: usize,
        rng: &mut R,
    ) -> Self {
        let bound = init::fan_in_bound(hidden_dim);
        let gates = 4 * hidden_dim;
        Self {
            hidden_dim,
            weight_ih: Parameter::new(
                format!("{name}.weight_ih"),
                init::uniform(input_dim, gates, bound, rng),
            ),
            weight_hh: Parameter::new(
                format!("{name}.weight_hh"),
                init::uniform(hidden_dim, gates, bound, rng),
            ),
            bias_ih: Parameter::new(
                format!("{name}.bias_ih"),
                init::uniform(1, gates, bound, rng),
            ),
            bias_hh: Parameter::new(
                format!("{name}.bias_hh"),
                init::uniform(1, gates, bound, rng),
            ),
        }
    }

    /// Width of the input embedding.
    pub fn input_dim(&self) -> usize {
        self.weight_ih.shape().0
    }

    /// Width of the hidden and cell state.
    pub fn hidden_dim(&self) -> usize {
        self.hidden_dim
    }

    /// Advance one step for the whole batch.
    pub fn step(&self, input: ArrayView2<'_, f32>, state: &LstmState) -> LstmState {
        let h = self.hidden_dim;
        let mut z = input.dot(&self.weight_ih.value());
        z += &state.hidden.dot(&self.weight_hh.value());
        z += &self.bias_ih.value().row(0);
        z += &self.bias_hh.value().row(0);

        let i = z.slice(s![.., 0..h]).mapv(sigmoid);
        let f = z.slice(s![.., h..2 * h]).mapv(sigmoid);
        let g = z.slice(s![.., 2 * h..3 * h]).mapv(f32::tanh);
        let o = z.slice(s![.., 3 * h..4 * h]).mapv(sigmoid);

        let cell = f * &state.cell + i * g;
        let hidden = o * cell.mapv(f32::tanh);
        LstmState { hidden, cell }
    }

    /// Run the cell left to right over a sequence and return the final
    /// state. Every element is consumed; nothing is masked.
    pub fn scan<'a, I>(&self, inputs: I, initial: LstmState) -> LstmState
    where
        I: IntoIterator<Item = ArrayView2<'a, f32>>,
    {
        inputs
            .into_iter()
            .fold(initial, |state, x| self.step(x, &state))
    }
}

impl Module for LstmCell {
    fn visit_parameters(&self, visitor: &mut dyn FnMut(&Parameter)) {
        visitor(&self.weight_ih);
        visitor(&self.weight_hh);
        visitor(&self.bias_ih);
        visitor(&self.bias_hh);
    }

    fn visit_parameters_mut(&mut self, visitor: &mut dyn FnMut(&mut Parameter)) {
        visitor(&mut self.weight_ih);
        visitor(&mut self.weight_hh);
        visitor(&mut self.bias_ih);
        visitor(&mut self.bias_hh);
    }
}
