use candle_core::{D, Tensor};
use candle_nn::{loss, ops};

use crate::device::DEVICE;
use crate::error::AgentError;
use crate::mlp::Mlp;

const HIDDEN_WIDTH: usize = 24;

/// Capability shared by the policy and value regressors. `predict` is pure
/// and deterministic given the current parameters; `fit` is the only
/// mutator and performs exactly one optimiser step over the whole batch.
pub trait Approximator {
    fn in_dim(&self) -> usize;
    fn out_dim(&self) -> usize;

    /// Output for a single input row.
    fn predict(&self, input: &[f32]) -> Result<Vec<f32>, AgentError>;

    /// One gradient step on a flat row-major batch. `weights`, when given,
    /// scales each example's contribution to the loss; `None` is uniform.
    fn fit(
        &mut self,
        inputs: &[f32],
        targets: &[f32],
        weights: Option<&[f32]>,
    ) -> Result<(), AgentError>;
}

fn check_row(expected: usize, got: usize) -> Result<(), AgentError> {
    if got != expected {
        return Err(AgentError::StateDim { expected, got });
    }
    Ok(())
}

/// Validates a flat fit batch against the regressor's dimensions and
/// returns the row count.
fn check_fit_batch(
    approximator: &impl Approximator,
    inputs: &[f32],
    targets: &[f32],
    weights: Option<&[f32]>,
) -> Result<usize, AgentError> {
    let in_dim = approximator.in_dim();
    if inputs.is_empty() || inputs.len() % in_dim != 0 {
        return Err(AgentError::StateDim {
            expected: in_dim,
            got: inputs.len(),
        });
    }
    let rows = inputs.len() / in_dim;

    let expected_targets = rows * approximator.out_dim();
    if targets.len() != expected_targets {
        return Err(AgentError::BatchShape {
            rows,
            expected: expected_targets,
            got: targets.len(),
        });
    }
    if let Some(weights) = weights {
        if weights.len() != rows {
            return Err(AgentError::BatchShape {
                rows,
                expected: rows,
                got: weights.len(),
            });
        }
    }
    Ok(rows)
}

/// Policy head: state -> probability distribution over actions. Trained
/// with per-example importance-weighted cross-entropy against one-hot
/// targets.
pub struct PolicyNet {
    net: Mlp,
    state_dim: usize,
    actions: usize,
}

impl PolicyNet {
    pub fn new(state_dim: usize, actions: usize) -> Result<Self, AgentError> {
        Ok(Self {
            net: Mlp::new(&[state_dim, HIDDEN_WIDTH, actions])?,
            state_dim,
            actions,
        })
    }
}

impl Approximator for PolicyNet {
    fn in_dim(&self) -> usize {
        self.state_dim
    }

    fn out_dim(&self) -> usize {
        self.actions
    }

    fn predict(&self, input: &[f32]) -> Result<Vec<f32>, AgentError> {
        check_row(self.state_dim, input.len())?;
        let input = Tensor::from_slice(input, (1, self.state_dim), &DEVICE)?;
        let logits = self.net.forward(&input)?;
        let probs = ops::softmax(&logits, D::Minus1)?;
        Ok(probs.squeeze(0)?.to_vec1::<f32>()?)
    }

    fn fit(
        &mut self,
        inputs: &[f32],
        targets: &[f32],
        weights: Option<&[f32]>,
    ) -> Result<(), AgentError> {
        let rows = check_fit_batch(self, inputs, targets, weights)?;
        let inputs = Tensor::from_slice(inputs, (rows, self.state_dim), &DEVICE)?;
        let targets = Tensor::from_slice(targets, (rows, self.actions), &DEVICE)?;

        let logits = self.net.forward(&inputs)?;
        let log_probs = ops::log_softmax(&logits, D::Minus1)?;
        // Cross-entropy per example, then the optional importance weights.
        let mut per_example = log_probs.mul(&targets)?.sum(D::Minus1)?.neg()?;
        if let Some(weights) = weights {
            let weights = Tensor::from_slice(weights, rows, &DEVICE)?;
            per_example = per_example.mul(&weights)?;
        }
        let loss = per_example.mean_all()?;
        self.net.step(&loss)?;
        Ok(())
    }
}

/// Value head: state -> scalar estimate of expected discounted return.
/// Trained with mean squared error; per-example weights scale the squared
/// errors when given, matching the shared fit contract.
pub struct ValueNet {
    net: Mlp,
    state_dim: usize,
}

impl ValueNet {
    pub fn new(state_dim: usize) -> Result<Self, AgentError> {
        Ok(Self {
            net: Mlp::new(&[state_dim, HIDDEN_WIDTH, 1])?,
            state_dim,
        })
    }
}

impl Approximator for ValueNet {
    fn in_dim(&self) -> usize {
        self.state_dim
    }

    fn out_dim(&self) -> usize {
        1
    }

    fn predict(&self, input: &[f32]) -> Result<Vec<f32>, AgentError> {
        check_row(self.state_dim, input.len())?;
        let input = Tensor::from_slice(input, (1, self.state_dim), &DEVICE)?;
        let output = self.net.forward(&input)?;
        Ok(output.squeeze(0)?.to_vec1::<f32>()?)
    }

    fn fit(
        &mut self,
        inputs: &[f32],
        targets: &[f32],
        weights: Option<&[f32]>,
    ) -> Result<(), AgentError> {
        let rows = check_fit_batch(self, inputs, targets, weights)?;
        let inputs = Tensor::from_slice(inputs, (rows, self.state_dim), &DEVICE)?;
        let targets = Tensor::from_slice(targets, (rows, 1), &DEVICE)?;

        let predictions = self.net.forward(&inputs)?;
        let loss = match weights {
            None => loss::mse(&predictions, &targets)?,
            Some(weights) => {
                let weights = Tensor::from_slice(weights, rows, &DEVICE)?;
                let squared = predictions.sub(&targets)?.sqr()?.squeeze(1)?;
                squared.mul(&weights)?.mean_all()?
            }
        };
        self.net.step(&loss)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_predict_is_a_distribution() {
        let policy = PolicyNet::new(4, 2).unwrap();
        let probs = policy.predict(&[0.1, -0.2, 0.05, 0.0]).unwrap();
        assert_eq!(probs.len(), 2);
        assert!(probs.iter().all(|p| *p >= 0.0));
        let total: f32 = probs.iter().sum();
        assert!((total - 1.0).abs() < 1e-5);
    }

    #[test]
    fn predict_is_deterministic() {
        let policy = PolicyNet::new(4, 2).unwrap();
        let state = [0.3, 0.1, -0.4, 0.2];
        assert_eq!(policy.predict(&state).unwrap(), policy.predict(&state).unwrap());

        let value = ValueNet::new(4).unwrap();
        assert_eq!(value.predict(&state).unwrap(), value.predict(&state).unwrap());
    }

    #[test]
    fn predict_rejects_wrong_dimensionality() {
        let policy = PolicyNet::new(4, 2).unwrap();
        match policy.predict(&[1.0, 2.0]) {
            Err(AgentError::StateDim { expected, got }) => {
                assert_eq!(expected, 4);
                assert_eq!(got, 2);
            }
            other => panic!("expected StateDim error, got {other:?}"),
        }
    }

    #[test]
    fn value_predict_is_scalar() {
        let value = ValueNet::new(4).unwrap();
        let out = value.predict(&[0.0, 0.0, 0.0, 0.0]).unwrap();
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn fit_accepts_weighted_and_unweighted_batches() {
        let mut policy = PolicyNet::new(2, 2).unwrap();
        let inputs = [0.0, 1.0, 1.0, 0.0];
        let targets = [1.0, 0.0, 0.0, 1.0];
        policy.fit(&inputs, &targets, Some(&[0.5, 1.0])).unwrap();
        policy.fit(&inputs, &targets, None).unwrap();

        let mut value = ValueNet::new(2).unwrap();
        value.fit(&inputs, &[0.7, -0.3], None).unwrap();
    }

    #[test]
    fn fit_rejects_mismatched_batches() {
        let mut policy = PolicyNet::new(2, 2).unwrap();
        assert!(matches!(
            policy.fit(&[0.0, 1.0], &[1.0, 0.0, 0.0], None),
            Err(AgentError::BatchShape {
                rows: 1,
                expected: 2,
                got: 3
            })
        ));
        assert!(matches!(
            policy.fit(&[0.0, 1.0], &[1.0, 0.0], Some(&[0.5, 0.5])),
            Err(AgentError::BatchShape {
                rows: 1,
                expected: 1,
                got: 2
            })
        ));
        assert!(matches!(
            policy.fit(&[0.0, 1.0, 0.5], &[1.0, 0.0], None),
            Err(AgentError::StateDim { expected: 2, got: 3 })
        ));
    }

    #[test]
    fn value_fit_honors_sample_weights() {
        let mut value = ValueNet::new(2).unwrap();
        let probe = [0.3, -0.7];
        let inputs = [0.0, 1.0, 1.0, 0.0];
        let targets = [5.0, -5.0];

        // Zero weights zero out every gradient, so one step moves nothing.
        let before = value.predict(&probe).unwrap();
        value.fit(&inputs, &targets, Some(&[0.0, 0.0])).unwrap();
        assert_eq!(value.predict(&probe).unwrap(), before);

        value.fit(&inputs, &targets, Some(&[1.0, 1.0])).unwrap();
        assert_ne!(value.predict(&probe).unwrap(), before);
    }
}
