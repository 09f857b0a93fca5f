//! Error handling for the benchmark driver

use thiserror::Error;

/// Result type for benchmark runs
pub type BenchResult<T> = Result<T, BenchError>;

/// Benchmark driver errors
#[derive(Error, Debug)]
pub enum BenchError {
    /// Invalid command-line arguments
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    /// Elements were lost or consumed more than once
    #[error("{failed} elements failed the consumption check")]
    Verification {
        /// Number of elements whose mark differed from one
        failed: usize,
    },

    /// CSV output error
    #[error("csv output error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("error: {0}")]
    Generic(#[from] anyhow::Error),
}

impl BenchError {
    /// Create an invalid arguments error
    pub fn invalid_args(msg: impl Into<String>) -> Self {
        Self::InvalidArgs(msg.into())
    }
}
