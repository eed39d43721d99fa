use log::{debug, info};

use crate::error::SolverError;

pub mod simulation;

// Capital at which the gambler reaches the goal.
pub const GOAL: usize = 100;

// Indexed by capital, 0..=GOAL.
pub type ValueFunction = [f64; GOAL + 1];
pub type RewardTable = [f64; GOAL + 1];
// Indexed by capital, 0..GOAL. Entry 0 is unused and always 0.
pub type Policy = [usize; GOAL];

#[derive(Debug, Clone)]
pub struct Solution {
    pub policy: Policy,
    pub state_values: ValueFunction,
    // Number of full sweeps over the live states until convergence.
    pub sweeps: u64,
}

// Value iteration for the gambler's problem.
//
// Sweeps are in-place: a backup for capital s already sees the values written
// for smaller capitals earlier in the same sweep.
#[derive(Debug, Clone, Copy)]
pub struct ValueIterationSolver {
    heads_prob: f64,
    theta: f64,
    discount: f64,
    max_sweeps: Option<u64>,
}

// The reward is zero on all transitions except the one reaching the goal.
pub fn new_reward_table() -> RewardTable {
    let mut rewards = [0.0; GOAL + 1];
    rewards[GOAL] = 1.0;
    rewards
}

// Largest stake allowed with the given capital: the gambler can't bet more
// than they have or more than is needed to reach the goal.
pub fn max_stake(capital: usize) -> usize {
    capital.min(GOAL - capital)
}

// Returns the first stake with the maximum action value and that value.
// Index 0 (no bet) is never a candidate.
fn best_action(action_values: &[f64]) -> (usize, f64) {
    action_values
        .iter()
        .enumerate()
        .skip(1)
        .fold((0, f64::NEG_INFINITY), |(best_stake, best_value), (stake, value)| {
            if *value > best_value {
                (stake, *value)
            } else {
                (best_stake, best_value)
            }
        })
}

impl ValueIterationSolver {
    pub fn new(heads_prob: f64, theta: f64, discount: f64) -> Result<Self, SolverError> {
        // Written so that NaN fails every check.
        if !(heads_prob > 0.0 && heads_prob < 1.0) {
            return Err(SolverError::InvalidParameter(format!(
                "heads probability must be in (0, 1), got {}",
                heads_prob
            )));
        }
        if !(theta > 0.0 && theta.is_finite()) {
            return Err(SolverError::InvalidParameter(format!(
                "theta must be a positive finite number, got {}",
                theta
            )));
        }
        if !(discount > 0.0 && discount <= 1.0) {
            return Err(SolverError::InvalidParameter(format!(
                "discount must be in (0, 1], got {}",
                discount
            )));
        }

        Ok(ValueIterationSolver {
            heads_prob: heads_prob,
            theta: theta,
            discount: discount,
            max_sweeps: None,
        })
    }

    // Bounds the number of sweeps; `run` fails if the bound is hit first.
    pub fn with_max_sweeps(mut self, max_sweeps: u64) -> Self {
        self.max_sweeps = Some(max_sweeps);
        self
    }

    // Returns the expected value of every stake for the given live capital.
    // The result has max_stake(capital) + 1 entries; entry 0 stays 0.
    fn one_step_lookahead(
        &self,
        capital: usize,
        state_values: &ValueFunction,
        rewards: &RewardTable,
    ) -> Vec<f64> {
        let mut action_values = vec![0.0; max_stake(capital) + 1];
        for stake in 1..action_values.len() {
            let win = capital + stake;
            let lose = capital - stake;
            // Bellman backup averaged over heads (win) and tails (lose).
            action_values[stake] = self.heads_prob
                * (rewards[win] + state_values[win] * self.discount)
                + (1.0 - self.heads_prob) * (rewards[lose] + state_values[lose] * self.discount);
        }
        action_values
    }

    // Performs a single in-place sweep over the live states.
    // Returns the maximum change in state values.
    pub fn sweep(&self, rewards: &RewardTable, state_values: &mut ValueFunction) -> f64 {
        let mut max_delta: f64 = 0.0;
        for capital in 1..GOAL {
            let action_values = self.one_step_lookahead(capital, state_values, rewards);
            let (_, best_value) = best_action(&action_values);
            max_delta = max_delta.max((best_value - state_values[capital]).abs());
            state_values[capital] = best_value;
        }
        max_delta
    }

    // Picks the smallest stake with the best expected value in every live state.
    fn extract_policy(&self, rewards: &RewardTable, state_values: &ValueFunction) -> Policy {
        let mut policy = [0; GOAL];
        for capital in 1..GOAL {
            let action_values = self.one_step_lookahead(capital, state_values, rewards);
            policy[capital] = best_action(&action_values).0;
        }
        policy
    }

    pub fn run(&self) -> Result<Solution, SolverError> {
        if self.max_sweeps == Some(0) {
            return Err(SolverError::InvalidParameter(
                "max sweeps must be at least 1".to_string(),
            ));
        }

        info!(
            "Solving for heads probability {} (theta {}, discount {})",
            self.heads_prob, self.theta, self.discount
        );

        let rewards = new_reward_table();
        // Capital 0 and GOAL are terminal and keep value 0.
        let mut state_values = [0.0; GOAL + 1];
        let mut sweeps = 0;
        loop {
            let delta = self.sweep(&rewards, &mut state_values);
            sweeps += 1;
            debug!("Sweep {}: delta {}", sweeps, delta);

            if delta < self.theta {
                break;
            }

            if let Some(max_sweeps) = self.max_sweeps {
                if sweeps >= max_sweeps {
                    return Err(SolverError::NotConverged {
                        sweeps: sweeps,
                        delta: delta,
                    });
                }
            }
        }

        let policy = self.extract_policy(&rewards, &state_values);
        info!(
            "Converged after {} sweeps, V({}) = {:.6}",
            sweeps,
            GOAL / 2,
            state_values[GOAL / 2]
        );

        Ok(Solution {
            policy: policy,
            state_values: state_values,
            sweeps: sweeps,
        })
    }
}

// Solves the gambler's problem and returns the optimal policy and state values.
pub fn solve(
    heads_prob: f64,
    theta: f64,
    discount: f64,
) -> Result<(Policy, ValueFunction), SolverError> {
    let solution = ValueIterationSolver::new(heads_prob, theta, discount)?.run()?;
    Ok((solution.policy, solution.state_values))
}
