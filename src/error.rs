use thiserror::Error;

use crate::{domain::tender::DedupKey, services::sink::Destination};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SkipReason {
    #[error("listing has no title")]
    MissingTitle,

    #[error("duplicate of an earlier record: {0}")]
    Duplicate(DedupKey),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseWarning {
    #[error("unrecognised deadline {0:?}")]
    Deadline(String),

    #[error("unrecognised value {0:?}")]
    Value(String),

    #[error("not an absolute link {0:?}")]
    Url(String),
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("failed to load {url}: {reason}")]
    PageLoad { url: String, reason: String },

    #[error("timed out after {secs}s loading {url}")]
    Timeout { url: String, secs: u64 },

    #[error("no elements matched {selector:?} on {url}")]
    SelectorNotFound { url: String, selector: String },

    #[error("invalid {kind} rule {payload:?}: {reason}")]
    InvalidSelector {
        kind: &'static str,
        payload: String,
        reason: String,
    },
}

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("could not write {destination}: {reason}")]
    WriteFailure {
        destination: Destination,
        reason: String,
    },
}

impl SinkError {
    pub fn write_failure(destination: Destination, reason: impl ToString) -> Self {
        SinkError::WriteFailure {
            destination,
            reason: reason.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum FatalError {
    #[error("browser session could not be established: {0}")]
    Session(String),

    #[error("invalid configuration: {0}")]
    Configuration(String),
}
