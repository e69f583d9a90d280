use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Resume not accessible/found at {path}: {reason}")]
    ResumeUnavailable { path: PathBuf, reason: String },

    #[error("Portal error: {0}")]
    Portal(String),

    #[error("Notification error: {0}")]
    Notify(String),

    #[error("Could not determine home directory")]
    NoHomeDir,
}

pub type Result<T> = std::result::Result<T, Error>;
