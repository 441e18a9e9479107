use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("parse error: {0}")]
    Parse(String),
    #[error("{0}")]
    Shape(String),
    #[error("relation '{0}' not found")]
    NotFound(String),
    #[error("relation '{0}' already exists")]
    AlreadyExists(String),
    #[error("column count mismatch")]
    ColumnCountMismatch,
    #[error("type mismatch")]
    TypeMismatch,
    #[error("constraint violation: {0}")]
    Constraint(String),
    #[error("{0} is not supported")]
    Unsupported(String),
    #[error("{0} is not implemented")]
    Unimplemented(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("engine stopped")]
    EngineStopped,
    #[error("statement timed out after {0:?}")]
    Timeout(Duration),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Remote(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Rebuilds an error from the message an engine sent over the protocol.
    ///
    /// Only the relation lookup errors are recovered as typed variants, since
    /// those are the ones callers branch on. Everything else stays `Remote`.
    #[must_use]
    pub fn from_remote(message: String) -> Self {
        if let Some(name) = message
            .strip_prefix("relation '")
            .and_then(|rest| rest.strip_suffix("' not found"))
        {
            return Self::NotFound(name.to_string());
        }
        if let Some(name) = message
            .strip_prefix("relation '")
            .and_then(|rest| rest.strip_suffix("' already exists"))
        {
            return Self::AlreadyExists(name.to_string());
        }
        if message == "engine stopped" {
            return Self::EngineStopped;
        }
        Self::Remote(message)
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
