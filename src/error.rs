use thiserror::Error;

// Errors that can occur while solving or simulating the coin bet game.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Value iteration did not converge after {sweeps} sweeps (last delta {delta})")]
    NotConverged { sweeps: u64, delta: f64 },
}
