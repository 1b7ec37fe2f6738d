use candle_core::{DType, Tensor};
use candle_nn::{AdamW, Linear, Module, Optimizer, ParamsAdamW, VarBuilder, VarMap, linear};

use crate::device::DEVICE;
use crate::error::AgentError;

const LEARNING_RATE: f64 = 0.01;

/// Small fully-connected network with tanh hidden activations and its own
/// optimiser. Each instance owns an independent `VarMap`, so two `Mlp`s
/// never alias parameters.
pub struct Mlp {
    layers: Vec<Linear>,
    optimiser: AdamW,
}

impl Mlp {
    pub fn new(topology: &[usize]) -> Result<Self, AgentError> {
        let var_map = VarMap::new();
        let vb = VarBuilder::from_varmap(&var_map, DType::F32, &DEVICE);
        let mut layers: Vec<Linear> = Vec::with_capacity(topology.len() - 1);
        for i in 0..topology.len() - 1 {
            layers.push(linear(topology[i], topology[i + 1], vb.pp(i))?);
        }

        let optimiser = AdamW::new(
            var_map.all_vars(),
            ParamsAdamW {
                lr: LEARNING_RATE,
                weight_decay: 0.0,
                ..Default::default()
            },
        )?;

        Ok(Self { layers, optimiser })
    }

    /// Forward pass: tanh on hidden layers, raw affine output on the last.
    pub fn forward(&self, inputs: &Tensor) -> Result<Tensor, candle_core::Error> {
        let mut x = inputs.clone();
        for layer in self.layers.iter().take(self.layers.len() - 1) {
            x = layer.forward(&x)?.tanh()?;
        }
        if let Some(last) = self.layers.last() {
            x = last.forward(&x)?;
        }
        Ok(x)
    }

    /// Backward pass and one optimiser update against `loss`.
    pub fn step(&mut self, loss: &Tensor) -> Result<(), candle_core::Error> {
        let grads = loss.backward()?;
        self.optimiser.step(&grads)
    }
}
