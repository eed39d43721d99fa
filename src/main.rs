use std::error::Error;
use std::path::PathBuf;

use clap::Parser;

use gamblers_problem::coin_bet::*;

#[derive(Parser)]
#[command(name = "gamblers_problem")]
#[command(about = "Solves the gambler's problem with value iteration")]
struct Cli {
    /// Probability of the coin coming up heads (repeat to solve several coins)
    #[arg(long = "heads-prob", default_values_t = vec![DEFAULT_HEADS_PROB])]
    heads_probs: Vec<f64>,
    /// Stop once a sweep changes no state value by this much or more
    #[arg(long, default_value_t = DEFAULT_THETA)]
    theta: f64,
    /// Discount factor in (0, 1]
    #[arg(long, default_value_t = DEFAULT_DISCOUNT)]
    discount: f64,
    /// Fail if value iteration hasn't converged after this many sweeps
    #[arg(long)]
    max_sweeps: Option<u64>,
    /// Number of simulated episodes under the final policy (0 = skip)
    #[arg(long, default_value_t = DEFAULT_EPISODES)]
    episodes: u64,
    /// Capital the simulated episodes start with
    #[arg(long, default_value_t = DEFAULT_START_CAPITAL)]
    start_capital: usize,
    /// Seed for the simulation RNG
    #[arg(long)]
    seed: Option<u64>,
    /// Directory for SVG plots of the values and the policy
    #[arg(long)]
    plot_dir: Option<PathBuf>,
    /// Don't print text plots
    #[arg(long)]
    quiet_plots: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let options = RunOptions {
        theta: cli.theta,
        discount: cli.discount,
        max_sweeps: cli.max_sweeps,
        episodes: cli.episodes,
        start_capital: cli.start_capital,
        seed: cli.seed,
        plot_dir: cli.plot_dir,
        text_plots: !cli.quiet_plots,
    };

    for heads_prob in &cli.heads_probs {
        run(*heads_prob, &options)?;
    }

    Ok(())
}
