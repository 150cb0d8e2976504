//! Ultimate Tic-Tac-Toe engine bridge CLI.
//!
//! Provides three modes of operation:
//! - `play`: Connect to a running engine and play N episodes with a model
//! - `config`: Print the default configuration as TOML
//! - `info`: Print workspace crate versions and the active configuration

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use uttt_bridge::prelude::*;
use uttt_policy::prelude::*;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

/// Bridge between an RL agent and an Ultimate Tic-Tac-Toe engine.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play episodes against a running engine and print statistics.
    Play {
        /// TOML configuration file. Defaults apply when omitted.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of episodes to play.
        #[arg(short = 'n', long, default_value_t = 1)]
        episodes: u32,

        /// Model producing the logits.
        #[arg(short, long, value_enum, default_value_t = PolicyKind::Uniform)]
        policy: PolicyKind,

        /// Take the highest-scoring move instead of sampling.
        #[arg(short, long)]
        greedy: bool,

        /// Let the agent submit moves outside the current sub-board.
        #[arg(long)]
        no_mask: bool,

        /// Give up on an episode after this many steps.
        #[arg(short, long, default_value_t = 1000)]
        max_steps: u32,

        /// Random seed.
        #[arg(short, long, default_value_t = 0)]
        seed: u64,
    },

    /// Print the default configuration as TOML.
    Config,

    /// Print crate information.
    Info {
        /// Configuration file to summarise.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PolicyKind {
    Uniform,
    Random,
}

// ---------------------------------------------------------------------------
// Mode implementations
// ---------------------------------------------------------------------------

fn load_config(path: Option<&Path>) -> Result<BridgeConfig> {
    match path {
        Some(path) => BridgeConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(BridgeConfig::default()),
    }
}

#[derive(Debug, Default)]
struct PlayStats {
    episodes: u32,
    wins: u32,
    losses: u32,
    steps: u64,
    invalid: u64,
    reward: f64,
}

struct PlayOptions {
    episodes: u32,
    policy: PolicyKind,
    greedy: bool,
    mask: bool,
    max_steps: u32,
    seed: u64,
}

fn run_play(config: &BridgeConfig, opts: &PlayOptions) -> Result<()> {
    let model: Box<dyn Model> = match opts.policy {
        PolicyKind::Uniform => Box::new(UniformModel),
        PolicyKind::Random => Box::new(RandomModel::new(opts.seed)),
    };
    let selection = if opts.greedy {
        ActionSelection::Argmax
    } else {
        ActionSelection::Sample
    };
    let mut policy = ModelPolicy::new(model, selection, opts.seed).with_masking(opts.mask);
    let mut env = UtttEnv::from_config(config);
    let mut stats = PlayStats::default();

    info!(
        model = policy.model_name(),
        selection = selection.as_str(),
        episodes = opts.episodes,
        "starting play"
    );

    for ep in 0..opts.episodes {
        let mut obs = env
            .reset()
            .with_context(|| format!("episode {}: reset failed", ep + 1))?;
        let mut last = None;
        for _ in 0..opts.max_steps {
            let action = policy
                .act(&obs, env.cur_state())
                .context("policy produced no action")?;
            let result = env
                .step(action)
                .with_context(|| format!("episode {}: step failed", ep + 1))?;
            stats.steps += 1;
            if !result.valid {
                stats.invalid += 1;
            }
            let done = result.done;
            obs = result.observation.clone();
            last = Some(result);
            if done {
                break;
            }
        }

        let Some(result) = last else {
            continue;
        };
        if !result.done {
            warn!(episode = ep + 1, max_steps = opts.max_steps, "episode hit step limit");
        }
        stats.episodes += 1;
        stats.wins += u32::from(result.info.won);
        stats.losses += u32::from(result.info.lost);
        stats.reward += f64::from(result.info.episode_reward);
        println!(
            "episode {}: turns={}, reward={:.3}, winner={:?}",
            ep + 1,
            result.info.turn,
            result.info.episode_reward,
            env.cur_state().winner
        );
    }

    env.close().context("failed to close engine channels")?;
    println!(
        "\ntotal: episodes={}, wins={}, losses={}, steps={}, invalid={}, reward={:.3}",
        stats.episodes, stats.wins, stats.losses, stats.steps, stats.invalid, stats.reward
    );
    Ok(())
}

fn run_config() -> Result<()> {
    let toml = BridgeConfig::default()
        .to_toml_string()
        .context("failed to serialize default config")?;
    print!("{toml}");
    Ok(())
}

fn run_info(config: &BridgeConfig) {
    println!("uttt v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("crates:");
    println!("  uttt-core   {}", env!("CARGO_PKG_VERSION"));
    println!("  uttt-bridge {}", env!("CARGO_PKG_VERSION"));
    println!("  uttt-policy {}", env!("CARGO_PKG_VERSION"));
    println!();
    match &config.transport {
        TransportConfig::Stream(stream) => println!(
            "transport: stream state={} action={} return={} max_message_size={}",
            stream.state_addr(),
            stream.action_addr(),
            stream.return_addr(),
            stream.max_message_size
        ),
        TransportConfig::File(file) => println!(
            "transport: file dir={} poll={:?}",
            file.dir.display(),
            file.poll_interval()
        ),
    }
    let encoder = BoardEncoder::from_config(&config.encoder);
    println!("observation: {:?}", encoder.shape());
    println!("observation source: {:?}", config.observation_source);
    println!("exploration: {:?}", config.reward.exploration);
    println!("self-play: {}", config.self_play);
    println!();
    println!("edition: 2024");
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Play {
            config,
            episodes,
            policy,
            greedy,
            no_mask,
            max_steps,
            seed,
        }) => {
            let config = load_config(config.as_deref())?;
            run_play(
                &config,
                &PlayOptions {
                    episodes,
                    policy,
                    greedy,
                    mask: !no_mask,
                    max_steps,
                    seed,
                },
            )
        }
        Some(Commands::Config) => run_config(),
        Some(Commands::Info { config }) => {
            run_info(&load_config(config.as_deref())?);
            Ok(())
        }
        None => {
            // Default: print info for the default configuration
            run_info(&BridgeConfig::default());
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn play_defaults() {
        let cli = Cli::parse_from(["uttt-app", "play"]);
        match cli.command {
            Some(Commands::Play {
                episodes,
                greedy,
                no_mask,
                seed,
                ..
            }) => {
                assert_eq!(episodes, 1);
                assert!(!greedy);
                assert!(!no_mask);
                assert_eq!(seed, 0);
            }
            _ => panic!("expected play"),
        }
    }

    #[test]
    fn play_parses_policy() {
        let cli = Cli::parse_from(["uttt-app", "play", "--policy", "random", "--greedy", "-n", "3"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Play {
                policy: PolicyKind::Random,
                greedy: true,
                episodes: 3,
                ..
            })
        ));
    }

    #[test]
    fn missing_config_file_is_error() {
        assert!(load_config(Some(Path::new("/nonexistent/uttt.toml"))).is_err());
    }
}
