use log::warn;
use rand::Rng;

use crate::error::SolverError;
use crate::solver::*;

// Plays a single episode following the policy, starting with `start_capital`.
// Returns the total reward: 1 if a transition reached the goal, 0 otherwise
// (including terminal starts and episodes that didn't finish within
// `max_steps`). Fails if the policy picks an infeasible stake on the way.
pub fn run_episode<R: Rng>(
    policy: &Policy,
    heads_prob: f64,
    start_capital: usize,
    max_steps: u32,
    rng: &mut R,
) -> Result<f64, SolverError> {
    let mut capital = start_capital;
    let mut total_reward = 0.0;
    for _ in 0..max_steps {
        // Final state.
        if capital == 0 || capital >= GOAL {
            return Ok(total_reward);
        }

        let stake = policy[capital];
        if stake < 1 || stake > max_stake(capital) {
            return Err(SolverError::InvalidParameter(format!(
                "policy stakes {} at capital {}, allowed range is [1, {}]",
                stake,
                capital,
                max_stake(capital)
            )));
        }

        if rng.gen_bool(heads_prob) {
            capital += stake;
        } else {
            capital -= stake;
        }
        if capital == GOAL {
            total_reward += 1.0;
        }
    }

    if capital != 0 && capital != GOAL {
        warn!(
            "Episode from capital {} stopped after {} steps at capital {}",
            start_capital, max_steps, capital
        );
    }
    Ok(total_reward)
}

// Estimates the probability of reaching the goal under the policy by playing
// `episodes` episodes from `start_capital`.
pub fn estimate_win_probability<R: Rng>(
    policy: &Policy,
    heads_prob: f64,
    start_capital: usize,
    episodes: u64,
    max_steps: u32,
    rng: &mut R,
) -> Result<f64, SolverError> {
    if start_capital == 0 || start_capital >= GOAL {
        return Err(SolverError::InvalidParameter(format!(
            "start capital must be in [1, {}], got {}",
            GOAL - 1,
            start_capital
        )));
    }
    if episodes == 0 {
        return Err(SolverError::InvalidParameter(
            "number of episodes must be positive".to_string(),
        ));
    }
    if !(heads_prob > 0.0 && heads_prob < 1.0) {
        return Err(SolverError::InvalidParameter(format!(
            "heads probability must be in (0, 1), got {}",
            heads_prob
        )));
    }

    let mut total_reward = 0.0;
    for _ in 0..episodes {
        total_reward += run_episode(policy, heads_prob, start_capital, max_steps, rng)?;
    }

    Ok(total_reward / episodes as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const MAX_STEPS: u32 = 10_000;

    #[test]
    fn terminal_start_states() {
        // No transition happens, so no reward, matching V(0) = V(GOAL) = 0.
        let (policy, values) = solve(0.25, 1e-4, 1.0).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            run_episode(&policy, 0.25, 0, MAX_STEPS, &mut rng).unwrap(),
            values[0]
        );
        assert_eq!(
            run_episode(&policy, 0.25, GOAL, MAX_STEPS, &mut rng).unwrap(),
            values[GOAL]
        );

        for start_capital in &[0, GOAL] {
            assert!(matches!(
                estimate_win_probability(&policy, 0.25, *start_capital, 100, 100, &mut rng),
                Err(SolverError::InvalidParameter(_))
            ));
        }
    }

    #[test]
    fn infeasible_stakes_are_rejected() {
        let (mut policy, _) = solve(0.25, 1e-4, 1.0).unwrap();
        // More than the gambler has.
        policy[10] = 20;
        let mut rng = StdRng::seed_from_u64(5);
        assert!(matches!(
            run_episode(&policy, 0.25, 10, MAX_STEPS, &mut rng),
            Err(SolverError::InvalidParameter(_))
        ));
        assert!(matches!(
            estimate_win_probability(&policy, 0.25, 10, 100, MAX_STEPS, &mut rng),
            Err(SolverError::InvalidParameter(_))
        ));

        // More than is needed to reach the goal.
        let (mut policy, _) = solve(0.25, 1e-4, 1.0).unwrap();
        policy[90] = 20;
        assert!(run_episode(&policy, 0.25, 90, MAX_STEPS, &mut rng).is_err());

        // No bet.
        let (mut policy, _) = solve(0.25, 1e-4, 1.0).unwrap();
        policy[30] = 0;
        assert!(run_episode(&policy, 0.25, 30, MAX_STEPS, &mut rng).is_err());
    }

    #[test]
    fn bold_play_from_midpoint() {
        // Staking everything at 50 ends the episode after a single flip.
        let (policy, _) = solve(0.25, 1e-4, 1.0).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let wins: f64 = (0..200)
            .map(|_| run_episode(&policy, 0.25, 50, 1, &mut rng).unwrap())
            .sum();
        assert!(wins > 0.0 && wins < 200.0);
    }

    #[test]
    fn win_rate_matches_state_values() {
        for (heads_prob, start_capital) in [(0.25, 50), (0.25, 75), (0.4, 30)].iter() {
            let (policy, values) = solve(*heads_prob, 1e-6, 1.0).unwrap();
            let mut rng = StdRng::seed_from_u64(42);
            let win_rate = estimate_win_probability(
                &policy,
                *heads_prob,
                *start_capital,
                20_000,
                MAX_STEPS,
                &mut rng,
            )
            .unwrap();
            assert!(
                (win_rate - values[*start_capital]).abs() < 0.02,
                "{} from {}: {} vs {}",
                heads_prob,
                start_capital,
                win_rate,
                values[*start_capital]
            );
        }
    }

    #[test]
    fn invalid_rollout_parameters() {
        let (policy, _) = solve(0.25, 1e-4, 1.0).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        assert!(estimate_win_probability(&policy, 0.25, GOAL + 1, 10, MAX_STEPS, &mut rng).is_err());
        assert!(estimate_win_probability(&policy, 0.25, 50, 0, MAX_STEPS, &mut rng).is_err());
        assert!(estimate_win_probability(&policy, 1.0, 50, 10, MAX_STEPS, &mut rng).is_err());
    }
}
