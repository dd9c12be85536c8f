use std::fmt;

use flightwatch_core::{CriteriaError, TrackerView};
use serde_json::Value;
use thiserror::Error;

/// What a cable connection reports back to its connection task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Text(String),
    /// Socket closed; `clean` when the peer sent a close frame.
    Closed { clean: bool },
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("invalid cable url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("send failed: {0}")]
    Send(String),
    #[error("invalid tracker settings: {0}")]
    InvalidSettings(String),
}

/// Everything a tracker reports to its owner, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerEvent {
    View(TrackerView),
    TerminalResult(Value),
    CancelRequested,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitFailure {
    InvalidCriteria(CriteriaError),
    InvalidEndpoint,
    Rejected { status: u16 },
    MissingJobId,
    Timeout,
    Network,
}

impl fmt::Display for SubmitFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitFailure::InvalidCriteria(err) => write!(f, "invalid search: {err}"),
            SubmitFailure::InvalidEndpoint => write!(f, "invalid api endpoint"),
            SubmitFailure::Rejected { status } => {
                write!(f, "search rejected with status {status}")
            }
            SubmitFailure::MissingJobId => write!(f, "response carried no job id"),
            SubmitFailure::Timeout => write!(f, "timeout"),
            SubmitFailure::Network => write!(f, "network error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct SubmitError {
    pub kind: SubmitFailure,
    pub message: String,
}

impl SubmitError {
    pub(crate) fn new(kind: SubmitFailure, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<CriteriaError> for SubmitError {
    fn from(err: CriteriaError) -> Self {
        let message = err.to_string();
        SubmitError::new(SubmitFailure::InvalidCriteria(err), message)
    }
}
