use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::mapreduce::reduce::TaskState;

/// Failure reported by a reduce function for a single key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ReductionError(String);

impl ReductionError {
    pub fn new(message: impl Into<String>) -> Self {
        ReductionError(message.into())
    }
}

impl From<String> for ReductionError {
    fn from(message: String) -> Self {
        ReductionError(message)
    }
}

impl From<&str> for ReductionError {
    fn from(message: &str) -> Self {
        ReductionError(message.to_owned())
    }
}

/// Every way a reduce task can end up in [`TaskState::Fatal`].
#[derive(Debug, Error)]
pub enum ReduceError {
    /// A shard is missing or unreadable, usually because its map task failed.
    #[error("failed to open shard {}: {source}", .path.display())]
    InputOpen { path: PathBuf, source: io::Error },

    #[error("failed to read shard {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    /// The shard holds bytes that are not a complete record. Distinct from a
    /// shard that simply ran out of records.
    #[error("malformed record #{record} in shard {}: {source}", .path.display())]
    MalformedRecord {
        path: PathBuf,
        record: usize,
        source: serde_json::Error,
    },

    #[error("reduce function failed for key {key:?}: {source}")]
    Reduction { key: String, source: ReductionError },

    #[error("failed to open output {}: {source}", .path.display())]
    OutputOpen { path: PathBuf, source: io::Error },

    #[error("failed to write output {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to move finished output into place at {}: {source}", .path.display())]
    Commit { path: PathBuf, source: io::Error },
}

impl ReduceError {
    /// The state the task was in when it failed.
    pub fn state(&self) -> TaskState {
        match self {
            ReduceError::InputOpen { .. } => TaskState::OpeningInputs,
            ReduceError::Read { .. } | ReduceError::MalformedRecord { .. } => TaskState::Reading,
            ReduceError::Reduction { .. }
            | ReduceError::OutputOpen { .. }
            | ReduceError::Write { .. }
            | ReduceError::Commit { .. } => TaskState::ReducingAndWriting,
        }
    }
}

pub type Result<T> = std::result::Result<T, ReduceError>;
