//! Example: run an episode and export it as JSON for playback clients
//!
//! Uses a simple hand-written policy (coarse additions far from the
//! equivalence volume, fine additions close to it, stop just short) as a
//! stand-in for a trained agent. Pass a path to control the output file.

use anyhow::Result;
use titrate_rl_core::Observation;
use titrate_rl_env::{run_episode, TitrationAction, TitrationEnv};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let output = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "episode_data.json".to_string());

    let mut env = TitrationEnv::default_setup()?;

    let record = run_episode(&mut env, |obs| {
        // obs = [R, G, B, Vb/Veq, t/Smax]
        let v_ratio = obs.to_vec()[3];
        if v_ratio < 0.90 {
            TitrationAction::Add3000
        } else if v_ratio < 0.97 {
            TitrationAction::Add500
        } else if v_ratio < 0.9935 {
            TitrationAction::Add100
        } else {
            TitrationAction::Stop
        }
    })
    .await?;

    record.write_json(&output)?;

    println!("Episode exported to {output}");
    println!("   Steps: {}", record.summary.total_steps);
    println!("   Final pH: {:.2}", record.summary.final_ph);
    println!("   Final Vb: {:.2} mL", record.summary.final_vb_ml);
    println!("   Total reward: {:.2}", record.summary.total_reward);
    println!("   Success: {}", record.summary.success);

    Ok(())
}
