use crate::error::AgentError;

/// Outcome of one environment step.
pub struct Step {
    pub next_state: Vec<f32>,
    pub reward: f32,
    pub terminal: bool,
}

/// Contract the driver and agent rely on: fixed-length numeric state
/// vectors, a discrete action space, and reset/step transitions. Nothing
/// about the simulation's internals leaks past these signatures.
pub trait Environment {
    fn reset(&mut self) -> Vec<f32>;
    fn step(&mut self, action: usize) -> Result<Step, AgentError>;
    fn state_dim(&self) -> usize;
    fn action_size(&self) -> usize;
}
