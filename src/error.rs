//! Crate-wide error types.
//!
//! Busy rejections and wizard validation failures are user-facing state,
//! not failures of the program; they surface as a log line and an inline
//! field error respectively and never pass through here.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeckError {
    #[error("{step}: failed to launch engine: {source}")]
    Spawn {
        step: &'static str,
        source: std::io::Error,
    },

    #[error("{step}: exited with status {code}")]
    ExitStatus { step: &'static str, code: i32 },

    #[error("{step}: timed out after {secs}s")]
    Timeout { step: &'static str, secs: u64 },

    #[error("status query failed: {0}")]
    StatusFetch(String),

    #[error("config write failed: {0}")]
    Persistence(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type DeckResult<T> = Result<T, DeckError>;
