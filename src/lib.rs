pub mod coin_bet;
pub mod error;
pub mod solver;

pub use error::SolverError;
pub use solver::{solve, Policy, Solution, ValueFunction, ValueIterationSolver};
