//! Error types for the central authority

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CentralError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The actor task has exited and no longer accepts commands
    #[error("Central actor stopped")]
    ActorStopped,

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, CentralError>;
