//! Error types for the LidarScope environment abstraction.

use thiserror::Error;

/// Errors that can occur in the environment abstraction layer.
#[derive(Debug, Error)]
pub enum EnvError {
    /// Width or height was zero, negative, or not finite
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: f64, height: f64 },

    /// The backend could not present a frame
    #[error("Surface error: {0}")]
    SurfaceError(String),
}

impl EnvError {
    /// Creates a surface error.
    pub fn surface(msg: impl Into<String>) -> Self {
        Self::SurfaceError(msg.into())
    }
}
