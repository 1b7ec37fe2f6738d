use rand::random_range;

use crate::env::{Environment, Step};
use crate::error::AgentError;

const GRAVITY: f32 = 9.8;
const CART_MASS: f32 = 1.0;
const POLE_MASS: f32 = 0.1;
const POLE_HALF_LENGTH: f32 = 0.5;
const FORCE_MAG: f32 = 10.0;
const TAU: f32 = 0.02;

const X_LIMIT: f32 = 2.4;
const THETA_LIMIT_DEGREES: f32 = 12.0;

/// Pole-balancing simulation. State is [x, x_dot, theta, theta_dot];
/// actions push the cart left (0) or right (1). The episode terminates
/// when the cart leaves the track or the pole tips past the angle limit;
/// step caps are the driver's business.
pub struct CartPole {
    state: [f32; 4],
}

impl CartPole {
    pub fn new() -> Self {
        Self { state: [0.0; 4] }
    }

    fn failed(state: &[f32; 4]) -> bool {
        state[0].abs() > X_LIMIT || state[2].abs() > THETA_LIMIT_DEGREES.to_radians()
    }
}

impl Default for CartPole {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for CartPole {
    fn reset(&mut self) -> Vec<f32> {
        self.state = [
            random_range(-0.05..0.05),
            random_range(-0.05..0.05),
            random_range(-0.05..0.05),
            random_range(-0.05..0.05),
        ];
        self.state.to_vec()
    }

    fn step(&mut self, action: usize) -> Result<Step, AgentError> {
        if action >= self.action_size() {
            return Err(AgentError::ActionRange {
                action,
                actions: self.action_size(),
            });
        }

        let [x, x_dot, theta, theta_dot] = self.state;
        let force = if action == 1 { FORCE_MAG } else { -FORCE_MAG };

        let cos_theta = theta.cos();
        let sin_theta = theta.sin();
        let total_mass = CART_MASS + POLE_MASS;
        let temp =
            (force + POLE_MASS * POLE_HALF_LENGTH * theta_dot.powi(2) * sin_theta) / total_mass;
        let theta_acc = (GRAVITY * sin_theta - cos_theta * temp)
            / (POLE_HALF_LENGTH * (4.0 / 3.0 - POLE_MASS * cos_theta.powi(2) / total_mass));
        let x_acc = temp - POLE_MASS * POLE_HALF_LENGTH * theta_acc * cos_theta / total_mass;

        self.state = [
            x + TAU * x_dot,
            x_dot + TAU * x_acc,
            theta + TAU * theta_dot,
            theta_dot + TAU * theta_acc,
        ];

        Ok(Step {
            next_state: self.state.to_vec(),
            reward: 1.0,
            terminal: Self::failed(&self.state),
        })
    }

    fn state_dim(&self) -> usize {
        4
    }

    fn action_size(&self) -> usize {
        2
    }
}
