//! Error handling for the chipsim CLI

use thiserror::Error;

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// CLI-level errors, layering the engine and program-file errors under a
/// single type the binary's `main` can log and translate into an exit
/// code.
#[derive(Error, Debug)]
pub enum CliError {
    /// Simulation engine error.
    #[error("engine error: {0}")]
    Core(#[from] chipsim_core::CoreError),

    /// Program-file parsing or mapping error.
    #[error("program error: {0}")]
    Program(#[from] chipsim_program::ProgramError),

    /// Configuration file error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Config file deserialization error.
    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid command arguments.
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    /// Catch-all for unexpected failures.
    #[error("error: {0}")]
    Generic(#[from] anyhow::Error),
}

impl CliError {
    /// Construct a [`CliError::Config`].
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Construct a [`CliError::InvalidArgs`].
    pub fn invalid_args(msg: impl Into<String>) -> Self {
        Self::InvalidArgs(msg.into())
    }
}
