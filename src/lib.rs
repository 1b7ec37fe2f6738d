pub mod agent;
pub mod approximator;
pub mod cartpole;
pub mod device;
pub mod env;
pub mod error;
pub mod mlp;
pub mod replay;
pub mod transition;
