//! Error types for the simulation harness.

use lidarscope_env::EnvError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    /// Surface or dimension failure inside a run
    #[error("Environment error: {0}")]
    Env(#[from] EnvError),

    /// Writing the frame export failed
    #[error("Export failed: {0}")]
    Export(#[from] std::io::Error),
}
