use rand::{Rng, rng};

use crate::approximator::{Approximator, PolicyNet, ValueNet};
use crate::error::AgentError;
use crate::replay::ReplayMemory;
use crate::transition::Transition;

const MEMORY_CAPACITY: usize = 2000;
const GAMMA: f32 = 0.95;
const EPSILON_START: f32 = 1.0;
const EPSILON_MIN: f32 = 0.01;
const EPSILON_DECAY: f32 = 0.995;

/// Floor on the per-example policy fit weight. Keeps every sampled action's
/// gradient strictly positive, so negative-advantage actions get a minimal
/// positive push instead of a penalty. Intentional; changing it changes the
/// learning dynamics.
const POLICY_WEIGHT_FLOOR: f32 = 1e-4;

fn policy_sample_weight(advantage: f32) -> f32 {
    advantage.max(POLICY_WEIGHT_FLOOR)
}

/// Actor-critic agent: an epsilon-greedy policy over the policy regressor's
/// distribution, a replay memory of observed transitions, and a batched
/// update that fits both regressors from one uniform sample. Generic over
/// the predict/fit capability so either regressor can be swapped out.
pub struct ActorCriticAgent<P = PolicyNet, V = ValueNet> {
    state_dim: usize,
    actions: usize,
    batch_size: usize,
    memory: ReplayMemory,
    gamma: f32,
    epsilon: f32,
    epsilon_min: f32,
    epsilon_decay: f32,
    policy: P,
    value: V,
}

impl ActorCriticAgent {
    pub fn new(state_dim: usize, actions: usize, batch_size: usize) -> Result<Self, AgentError> {
        Ok(Self::from_parts(
            PolicyNet::new(state_dim, actions)?,
            ValueNet::new(state_dim)?,
            batch_size,
        ))
    }
}

impl<P: Approximator, V: Approximator> ActorCriticAgent<P, V> {
    /// Composes an agent over two regressors. The state dimension and the
    /// action count come from the policy's own descriptors.
    pub fn from_parts(policy: P, value: V, batch_size: usize) -> Self {
        Self {
            state_dim: policy.in_dim(),
            actions: policy.out_dim(),
            batch_size,
            memory: ReplayMemory::new(MEMORY_CAPACITY),
            gamma: GAMMA,
            epsilon: EPSILON_START,
            epsilon_min: EPSILON_MIN,
            epsilon_decay: EPSILON_DECAY,
            policy,
            value,
        }
    }

    /// Overrides the exploration schedule. The arguments must describe a
    /// valid one: epsilon within [epsilon_min, 1.0] and a decay in [0, 1].
    pub fn with_exploration(mut self, epsilon: f32, epsilon_min: f32, epsilon_decay: f32) -> Self {
        assert!(
            0.0 <= epsilon_min && epsilon_min <= epsilon && epsilon <= 1.0,
            "exploration schedule requires 0 <= epsilon_min <= epsilon <= 1, \
             got epsilon {epsilon} with floor {epsilon_min}"
        );
        assert!(
            (0.0..=1.0).contains(&epsilon_decay),
            "epsilon decay must lie in [0, 1], got {epsilon_decay}"
        );
        self.epsilon = epsilon;
        self.epsilon_min = epsilon_min;
        self.epsilon_decay = epsilon_decay;
        self
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    pub fn memory_len(&self) -> usize {
        self.memory.len()
    }

    fn check_state(&self, state: &[f32]) -> Result<(), AgentError> {
        if state.len() != self.state_dim {
            return Err(AgentError::StateDim {
                expected: self.state_dim,
                got: state.len(),
            });
        }
        Ok(())
    }

    /// Epsilon-greedy action selection. With `explore` set, a uniform draw
    /// at or below epsilon picks a uniformly random action; otherwise the
    /// first-occurring maximum of the policy distribution wins. Epsilon is
    /// never consulted when `explore` is false, so evaluation rollouts are
    /// deterministic.
    pub fn select_action(&self, state: &[f32], explore: bool) -> Result<usize, AgentError> {
        self.check_state(state)?;
        if explore {
            let mut rng = rng();
            if rng.random::<f32>() <= self.epsilon {
                return Ok(rng.random_range(0..self.actions));
            }
        }

        let probs = self.policy.predict(state)?;
        let mut best = 0;
        for (action, p) in probs.iter().enumerate() {
            if *p > probs[best] {
                best = action;
            }
        }
        Ok(best)
    }

    /// Records one transition. No filtering, no deduplication.
    pub fn observe(
        &mut self,
        state: &[f32],
        action: usize,
        reward: f32,
        next_state: &[f32],
        terminal: bool,
    ) -> Result<(), AgentError> {
        self.check_state(state)?;
        self.check_state(next_state)?;
        if action >= self.actions {
            return Err(AgentError::ActionRange {
                action,
                actions: self.actions,
            });
        }
        self.memory.record(Transition::new(
            state.to_vec(),
            action,
            reward,
            next_state.to_vec(),
            terminal,
        ));
        Ok(())
    }

    /// One batched actor-critic update. Silently a no-op until the memory
    /// holds a full batch.
    pub fn train_step(&mut self) -> Result<(), AgentError> {
        if self.memory.len() < self.batch_size {
            return Ok(());
        }

        let batch = self.memory.sample(self.batch_size)?;

        let mut states = Vec::with_capacity(self.batch_size * self.state_dim);
        let mut policy_targets = vec![0.0f32; self.batch_size * self.actions];
        let mut policy_weights = Vec::with_capacity(self.batch_size);
        let mut value_targets = Vec::with_capacity(self.batch_size);

        // All targets and advantages are computed against the value
        // parameters as they stand before either fit below runs.
        for (row, transition) in batch.iter().enumerate() {
            let target = if transition.terminal {
                transition.reward
            } else {
                transition.reward + self.gamma * self.value.predict(&transition.next_state)?[0]
            };
            let advantage = target - self.value.predict(&transition.state)?[0];

            states.extend_from_slice(&transition.state);
            policy_targets[row * self.actions + transition.action] = 1.0;
            policy_weights.push(policy_sample_weight(advantage));
            value_targets.push(target);
        }

        self.policy
            .fit(&states, &policy_targets, Some(&policy_weights))?;
        self.value.fit(&states, &value_targets, None)?;

        self.epsilon = (self.epsilon * self.epsilon_decay).max(self.epsilon_min);
        Ok(())
    }
}
