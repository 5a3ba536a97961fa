use rand::{Rng, SeedableRng};
use reinforce::envs::CartPoleConfig;
use reinforce::logging::DisplayLogger;
use reinforce::simulation::{collect_episode, ActorMode, TrainConfig, Trainer};
use reinforce::{Environment, PolicyConfig, Prng, RLError};
use std::error::Error;
use std::process;

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {}", err);
        let mut source = err.source();
        while let Some(cause) = source {
            eprintln!("  caused by: {}", cause);
            source = cause.source();
        }
        process::exit(1);
    }
}

fn run() -> Result<(), RLError> {
    let env_config = CartPoleConfig::default();
    let policy_config = PolicyConfig::default();
    let training_config = TrainConfig::default();
    println!("{:#?}", env_config);
    println!("{:#?}", policy_config);
    println!("{:#?}", training_config);

    let mut rng = Prng::seed_from_u64(0);
    let env = env_config.build_env(rng.gen());
    let policy =
        policy_config.build_policy(env.observation_dimension(), env.action_count(), &mut rng)?;
    let mut trainer = Trainer::new(training_config, policy, env, Prng::seed_from_u64(rng.gen()))?;
    let mut logger = DisplayLogger::default();

    trainer.run(&mut logger)?;

    let (policy, mut env) = trainer.into_inner();
    let episode = collect_episode(
        &policy,
        &mut env,
        training_config.max_steps_per_episode,
        ActorMode::Evaluation,
        training_config.render,
        &mut rng,
    )?;
    println!("Evaluation episode reward: {}", episode.total_reward());
    Ok(())
}
