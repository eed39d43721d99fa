use std::error::Error;
use std::path::{Path, PathBuf};

use log::info;
use plotlib::{
    page::Page,
    repr::Plot,
    style::{PointMarker, PointStyle},
    view::ContinuousView,
};
use prettytable::{Cell, Row, Table};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::solver::simulation::estimate_win_probability;
use crate::solver::*;

pub const DEFAULT_HEADS_PROB: f64 = 0.25;
pub const DEFAULT_THETA: f64 = 0.0001;
pub const DEFAULT_DISCOUNT: f64 = 1.0;
pub const DEFAULT_EPISODES: u64 = 10_000;
pub const DEFAULT_START_CAPITAL: usize = 50;
// Episodes longer than this are counted as losses.
const MAX_EPISODE_STEPS: u32 = 100_000;

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub theta: f64,
    pub discount: f64,
    pub max_sweeps: Option<u64>,
    pub episodes: u64,
    pub start_capital: usize,
    pub seed: Option<u64>,
    pub plot_dir: Option<PathBuf>,
    pub text_plots: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            theta: DEFAULT_THETA,
            discount: DEFAULT_DISCOUNT,
            max_sweeps: None,
            episodes: DEFAULT_EPISODES,
            start_capital: DEFAULT_START_CAPITAL,
            seed: None,
            plot_dir: None,
            text_plots: true,
        }
    }
}

// Points (capital, value) for capital 0..GOAL.
fn state_value_points(state_values: &ValueFunction) -> Vec<(f64, f64)> {
    (0..GOAL)
        .map(|capital| (capital as f64, state_values[capital]))
        .collect()
}

// Points (capital, stake) for capital 0..GOAL.
fn policy_points(policy: &Policy) -> Vec<(f64, f64)> {
    (0..GOAL)
        .map(|capital| (capital as f64, policy[capital] as f64))
        .collect()
}

fn state_values_view(state_values: &ValueFunction) -> ContinuousView {
    let s1 = Plot::new(state_value_points(state_values))
        .point_style(PointStyle::new().marker(PointMarker::Circle));
    ContinuousView::new()
        .add(s1)
        .x_range(0.0, GOAL as f64)
        .x_label("Capital")
        .y_label("Value estimates")
}

fn policy_view(policy: &Policy) -> ContinuousView {
    let s1 = Plot::new(policy_points(policy))
        .point_style(PointStyle::new().marker(PointMarker::Square));
    ContinuousView::new()
        .add(s1)
        .x_range(0.0, GOAL as f64)
        .x_label("Capital")
        .y_label("Final policy (stake)")
}

pub fn solution_table(solution: &Solution) -> Table {
    let mut table = Table::new();
    table.add_row(Row::new(vec![
        Cell::new("Capital"),
        Cell::new("Stake"),
        Cell::new("Value"),
    ]));
    for capital in 1..GOAL {
        table.add_row(Row::new(vec![
            Cell::new(&format!("{}", capital)),
            Cell::new(&format!("{}", solution.policy[capital])),
            Cell::new(&format!("{:.6}", solution.state_values[capital])),
        ]));
    }
    table
}

pub fn print_state_values(state_values: &ValueFunction) -> Result<(), Box<dyn Error>> {
    let v = state_values_view(state_values);
    let text = Page::single(&v)
        .dimensions(100, 50)
        .to_text()
        .map_err(|e| e.to_string())?;
    println!("{}", text);
    Ok(())
}

pub fn print_policy(policy: &Policy) -> Result<(), Box<dyn Error>> {
    let v = policy_view(policy);
    let text = Page::single(&v)
        .dimensions(100, 50)
        .to_text()
        .map_err(|e| e.to_string())?;
    println!("{}", text);
    Ok(())
}

fn plot_path(dir: &Path, name: &str, heads_prob: f64) -> PathBuf {
    dir.join(format!("{}_p{}.svg", name, heads_prob))
}

// Writes SVG plots of the state values and the policy into `dir`.
pub fn save_plots(
    solution: &Solution,
    heads_prob: f64,
    dir: &Path,
) -> Result<(), Box<dyn Error>> {
    std::fs::create_dir_all(dir)?;

    let values_path = plot_path(dir, "values", heads_prob);
    Page::single(&state_values_view(&solution.state_values))
        .save(&values_path)
        .map_err(|e| e.to_string())?;

    let policy_path = plot_path(dir, "policy", heads_prob);
    Page::single(&policy_view(&solution.policy))
        .save(&policy_path)
        .map_err(|e| e.to_string())?;

    info!(
        "Saved plots to {} and {}",
        values_path.display(),
        policy_path.display()
    );
    Ok(())
}

// Solves the game for one coin and reports the result.
pub fn run(heads_prob: f64, options: &RunOptions) -> Result<Solution, Box<dyn Error>> {
    let mut solver = ValueIterationSolver::new(heads_prob, options.theta, options.discount)?;
    if let Some(max_sweeps) = options.max_sweeps {
        solver = solver.with_max_sweeps(max_sweeps);
    }
    let solution = solver.run()?;

    println!(
        "Heads probability {}: converged after {} sweeps",
        heads_prob, solution.sweeps
    );
    solution_table(&solution).printstd();

    if options.text_plots {
        print_state_values(&solution.state_values)?;
        print_policy(&solution.policy)?;
    }

    if let Some(dir) = &options.plot_dir {
        save_plots(&solution, heads_prob, dir)?;
    }

    if options.episodes > 0 {
        let mut rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let win_rate = estimate_win_probability(
            &solution.policy,
            heads_prob,
            options.start_capital,
            options.episodes,
            MAX_EPISODE_STEPS,
            &mut rng,
        )?;
        info!(
            "Simulated {} episodes from capital {}",
            options.episodes, options.start_capital
        );
        println!(
            "Win rate from capital {}: simulated {:.4}, expected {:.4}",
            options.start_capital, win_rate, solution.state_values[options.start_capital]
        );
    }

    Ok(solution)
}
