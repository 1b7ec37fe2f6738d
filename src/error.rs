use thiserror::Error;

/// Errors surfaced by the learning core. `InsufficientData` is a normal,
/// recoverable condition during warm-up; the rest are caller contract
/// violations or tensor-backend failures.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("requested {requested} transitions but the store holds {available}")]
    InsufficientData { requested: usize, available: usize },

    #[error("state has length {got}, environment state dimension is {expected}")]
    StateDim { expected: usize, got: usize },

    #[error("action index {action} out of range for action space of size {actions}")]
    ActionRange { action: usize, actions: usize },

    #[error("fit batch of {rows} rows expects {expected} values, got {got}")]
    BatchShape {
        rows: usize,
        expected: usize,
        got: usize,
    },

    #[error(transparent)]
    Candle(#[from] candle_core::Error),
}
