//! Example: random agent titrating the default weak-acid setup

use titrate_rl_core::{ActionSpace, Environment};
use titrate_rl_env::{TitrationEnv, TitrationActionSpace};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let mut env = TitrationEnv::default_setup()?;
    let action_space = TitrationActionSpace;

    // Run episodes
    let num_episodes = 10;
    let mut episode_rewards = Vec::new();

    for episode in 0..num_episodes {
        let (_observation, _info) = env.reset().await?;
        let mut total_reward = 0.0;
        let mut steps = 0;

        loop {
            let action = action_space.sample();
            let step = env.step(action).await?;
            total_reward += step.reward.0;
            steps += 1;

            if step.done || step.truncated {
                let ph = step.info.get_f64("pH").unwrap_or(f64::NAN);
                println!(
                    "Episode {}: Total Reward = {:.2}, Steps = {}, Final pH = {:.2}",
                    episode + 1,
                    total_reward,
                    steps,
                    ph
                );
                break;
            }
        }

        episode_rewards.push(total_reward);
    }

    // Print statistics
    let avg_reward: f64 = episode_rewards.iter().sum::<f64>() / episode_rewards.len() as f64;
    println!("\nAverage Reward over {num_episodes} episodes: {avg_reward:.2}");

    env.close().await?;

    Ok(())
}
