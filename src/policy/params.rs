use ndarray::{Array1, Array2, ArrayViewD, ArrayViewMutD};
use serde::{Deserialize, Serialize};

/// Parameters of a two-layer perceptron.
///
/// `hidden = relu(x · w1 + b1)` and `output = hidden · w2 + b2`
/// for a row vector input `x`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlpParams {
    /// Input-to-hidden weights; shape `[input_dim, hidden_size]`.
    pub w1: Array2<f64>,
    /// Hidden biases; shape `[hidden_size]`.
    pub b1: Array1<f64>,
    /// Hidden-to-output weights; shape `[hidden_size, output_dim]`.
    pub w2: Array2<f64>,
    /// Output biases; shape `[output_dim]`.
    pub b2: Array1<f64>,
}

impl MlpParams {
    /// All-zero parameters of the given dimensions.
    pub fn zeros(input_dim: usize, hidden_size: usize, output_dim: usize) -> Self {
        Self {
            w1: Array2::zeros((input_dim, hidden_size)),
            b1: Array1::zeros(hidden_size),
            w2: Array2::zeros((hidden_size, output_dim)),
            b2: Array1::zeros(output_dim),
        }
    }

    /// All-zero parameters with the same dimensions as `self`.
    pub fn zeros_like(&self) -> Self {
        Self::zeros(self.input_dim(), self.hidden_size(), self.output_dim())
    }

    pub fn input_dim(&self) -> usize {
        self.w1.nrows()
    }

    pub fn hidden_size(&self) -> usize {
        self.b1.len()
    }

    pub fn output_dim(&self) -> usize {
        self.b2.len()
    }

    /// Total number of scalar parameters.
    pub fn num_parameters(&self) -> usize {
        self.w1.len() + self.b1.len() + self.w2.len() + self.b2.len()
    }

    /// Whether every parameter is finite.
    pub fn is_finite(&self) -> bool {
        self.views()
            .iter()
            .all(|view| view.iter().all(|x| x.is_finite()))
    }

    /// Views of `[w1, b1, w2, b2]`.
    pub fn views(&self) -> [ArrayViewD<f64>; 4] {
        [
            self.w1.view().into_dyn(),
            self.b1.view().into_dyn(),
            self.w2.view().into_dyn(),
            self.b2.view().into_dyn(),
        ]
    }

    /// Mutable views of `[w1, b1, w2, b2]`.
    pub fn views_mut(&mut self) -> [ArrayViewMutD<f64>; 4] {
        [
            self.w1.view_mut().into_dyn(),
            self.b1.view_mut().into_dyn(),
            self.w2.view_mut().into_dyn(),
            self.b2.view_mut().into_dyn(),
        ]
    }
}
