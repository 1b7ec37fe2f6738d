use anyhow::Result;

use cartpole_ac::agent::ActorCriticAgent;
use cartpole_ac::cartpole::CartPole;
use cartpole_ac::env::Environment;

const MAX_EPISODES: usize = 5000;
const EPISODE_CAP: usize = 200;
const SUCCESS_STEP: usize = 195;
const EVAL_ROLLOUTS: usize = 100;
const BATCH_SIZE: usize = 32;

/// One exploratory episode: act, record, stop at termination or the cap.
/// Returns the number of steps survived.
fn run_episode(agent: &mut ActorCriticAgent, env: &mut CartPole) -> Result<usize> {
    let mut state = env.reset();
    for t in 0..EPISODE_CAP {
        let action = agent.select_action(&state, true)?;
        let step = env.step(action)?;
        agent.observe(&state, action, step.reward, &step.next_state, step.terminal)?;
        state = step.next_state;
        if step.terminal {
            return Ok(t + 1);
        }
    }
    Ok(EPISODE_CAP)
}

/// Greedy evaluation gate: the task counts as solved only when every
/// rollout sustains the pole past `SUCCESS_STEP` steps. Bails out on the
/// first rollout that falls short.
fn evaluate(agent: &ActorCriticAgent, env: &mut CartPole) -> Result<bool> {
    for _ in 0..EVAL_ROLLOUTS {
        let mut state = env.reset();
        let mut survived = 0;
        for t in 0..EPISODE_CAP {
            let action = agent.select_action(&state, false)?;
            let step = env.step(action)?;
            state = step.next_state;
            survived = t + 1;
            if step.terminal {
                break;
            }
        }
        if survived <= SUCCESS_STEP {
            return Ok(false);
        }
    }
    Ok(true)
}

fn main() -> Result<()> {
    let mut env = CartPole::new();
    let mut agent = ActorCriticAgent::new(env.state_dim(), env.action_size(), BATCH_SIZE)?;
    println!(
        "{} actions, {}-dim state",
        env.action_size(),
        env.state_dim()
    );

    for episode in 0..MAX_EPISODES {
        let score = run_episode(&mut agent, &mut env)?;
        agent.train_step()?;
        println!(
            "episode {episode}/{MAX_EPISODES}: score {score}, epsilon {:.3}",
            agent.epsilon()
        );

        if evaluate(&agent, &mut env)? {
            println!("solved after {} training episodes", episode + 1);
            return Ok(());
        }
    }

    println!("stopping after {MAX_EPISODES} episodes without solving");
    Ok(())
}
