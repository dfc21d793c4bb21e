// ============================================================
// Layer 5 — Recurrent Cells
// ============================================================
// The recurrent core shared by every encoder and the decoder:
// a stack of GRU cells advanced one time step at a time.
//
// GRU update for one layer (x = input, h = previous state):
//   r  = σ(W_r x + U_r h)           reset gate
//   z  = σ(W_z x + U_z h)           update gate
//   n  = tanh(W_n x + r ⊙ U_n h)    candidate
//   h' = (1 − z) ⊙ n + z ⊙ h
//
// The three input projections and the three hidden projections
// are each fused into one Linear layer of width 3·hidden.
//
// Between stacked layers dropout is applied to the output of
// the lower layer before it feeds the next one.
//
// Reference: Cho et al. (2014) GRU
//            Burn Book §3 (Building Blocks)

use burn::{
    nn::{Dropout, DropoutConfig, Linear, LinearConfig},
    prelude::*,
    tensor::activation::{sigmoid, tanh},
};

/// Per-layer hidden state: one [batch, hidden] tensor per layer.
pub type HiddenState<B> = Vec<Tensor<B, 2>>;

#[derive(Config, Debug)]
pub struct StackedGruConfig {
    pub d_input: usize,
    pub d_hidden: usize,
    pub n_layers: usize,
    #[config(default = 0.0)]
    pub dropout: f64,
}

impl StackedGruConfig {
    /// At least one layer is always created.
    pub fn init<B: Backend>(&self, device: &B::Device) -> StackedGru<B> {
        let cells = (0..self.n_layers.max(1))
            .map(|layer| {
                let d_input = if layer == 0 { self.d_input } else { self.d_hidden };
                GruCell {
                    input_gates: LinearConfig::new(d_input, 3 * self.d_hidden).init(device),
                    hidden_gates: LinearConfig::new(self.d_hidden, 3 * self.d_hidden).init(device),
                    d_hidden: self.d_hidden,
                }
            })
            .collect();
        StackedGru {
            cells,
            dropout: DropoutConfig::new(self.dropout).init(),
            d_hidden: self.d_hidden,
        }
    }
}

#[derive(Module, Debug)]
pub struct GruCell<B: Backend> {
    pub input_gates: Linear<B>,
    pub hidden_gates: Linear<B>,
    pub d_hidden: usize,
}

impl<B: Backend> GruCell<B> {
    /// x: [batch, d_input], h: [batch, d_hidden] → [batch, d_hidden]
    pub fn forward(&self, x: Tensor<B, 2>, h: Tensor<B, 2>) -> Tensor<B, 2> {
        let [batch, _] = x.dims();
        let d = self.d_hidden;

        let gx = self.input_gates.forward(x);
        let gh = self.hidden_gates.forward(h.clone());
        let gate = |t: &Tensor<B, 2>, i: usize| t.clone().slice([0..batch, i * d..(i + 1) * d]);

        let reset = sigmoid(gate(&gx, 0) + gate(&gh, 0));
        let update = sigmoid(gate(&gx, 1) + gate(&gh, 1));
        let candidate = tanh(gate(&gx, 2) + reset * gate(&gh, 2));

        update.clone().neg().add_scalar(1.0) * candidate + update * h
    }
}

#[derive(Module, Debug)]
pub struct StackedGru<B: Backend> {
    pub cells: Vec<GruCell<B>>,
    pub dropout: Dropout,
    pub d_hidden: usize,
}

impl<B: Backend> StackedGru<B> {
    pub fn n_layers(&self) -> usize {
        self.cells.len()
    }

    pub fn d_hidden(&self) -> usize {
        self.d_hidden
    }

    pub fn zero_state(&self, batch: usize, device: &B::Device) -> HiddenState<B> {
        (0..self.cells.len())
            .map(|_| Tensor::zeros([batch, self.d_hidden], device))
            .collect()
    }

    /// Advance every layer by one step. Returns the top layer's
    /// output and the new per-layer state.
    pub fn step(&self, x: Tensor<B, 2>, state: HiddenState<B>) -> (Tensor<B, 2>, HiddenState<B>) {
        let mut input = x;
        let mut next = Vec::with_capacity(self.cells.len());

        for (layer, (cell, h)) in self.cells.iter().zip(state).enumerate() {
            if layer > 0 {
                input = self.dropout.forward(input);
            }
            let h = cell.forward(input, h);
            input = h.clone();
            next.push(h);
        }

        (input, next)
    }
}
