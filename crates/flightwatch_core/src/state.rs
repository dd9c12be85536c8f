use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::view_model::TrackerView;
use crate::SearchCriteria;

/// Server-issued identifier of a background search job.
///
/// The REST endpoint may hand out either a number or a string; the original
/// JSON type is preserved so the subscribe identifier echoes it unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobId {
    Number(u64),
    Text(String),
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobId::Number(n) => write!(f, "{n}"),
            JobId::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for JobId {
    fn from(value: u64) -> Self {
        JobId::Number(value)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        JobId::Text(value.to_string())
    }
}

impl From<String> for JobId {
    fn from(value: String) -> Self {
        JobId::Text(value)
    }
}

/// Transport health, independent of job progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Connecting,
    Connected,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

/// Lifecycle of one job subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Connecting,
    Subscribing,
    InProgress,
    Reconnecting,
    /// The server closed the socket cleanly before any result arrived.
    Closed,
    Terminal(Outcome),
}

impl Phase {
    /// Phases in which a live connection attempt may deliver events.
    pub fn accepts_transport_events(self) -> bool {
        matches!(
            self,
            Phase::Connecting | Phase::Subscribing | Phase::InProgress
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Terminal(_))
    }
}

/// Fixed timings and wire constants for job tracking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    pub channel: String,
    pub progress_step: u8,
    /// Highest value the simulated ticker may reach; 100 is reserved for completion.
    pub progress_cap: u8,
    pub tick_interval: Duration,
    pub reconnect_delay: Duration,
    pub delivery_delay: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            channel: "FlightsChannel".to_string(),
            progress_step: 1,
            progress_cap: 99,
            tick_interval: Duration::from_millis(500),
            reconnect_delay: Duration::from_millis(3000),
            delivery_delay: Duration::from_millis(500),
        }
    }
}

pub(crate) const STATUS_INITIAL: &str = "Initializing flight search...";
pub(crate) const STATUS_CONNECTING: &str = "Connecting to search service...";
pub(crate) const STATUS_SUBSCRIBING: &str = "Connected to search service. Subscribing...";
pub(crate) const STATUS_IN_PROGRESS: &str = "Search in progress...";
pub(crate) const STATUS_COMPLETE: &str = "Search complete!";
pub(crate) const STATUS_TRANSPORT_ERROR: &str = "Connection error. Retrying...";
pub(crate) const STATUS_CONNECTION_LOST: &str = "Connection lost. Trying to reconnect...";
pub(crate) const STATUS_CLOSED: &str = "Connection closed by server";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerState {
    config: TrackerConfig,
    job_id: Option<JobId>,
    criteria: Option<SearchCriteria>,
    phase: Phase,
    connection: ConnectionState,
    progress: u8,
    status_message: String,
    error: Option<String>,
    last_transport_error: Option<String>,
    // Attempt and ticker numbers only ever grow, so events from a previous
    // job or connection can never match the live ones.
    attempt: u64,
    ticker: Option<u64>,
    last_ticker: u64,
    pending_delivery: Option<Value>,
    delivered: bool,
    dirty: bool,
}

impl Default for TrackerState {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

impl TrackerState {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            job_id: None,
            criteria: None,
            phase: Phase::Idle,
            connection: ConnectionState::Connecting,
            progress: 0,
            status_message: STATUS_INITIAL.to_string(),
            error: None,
            last_transport_error: None,
            attempt: 0,
            ticker: None,
            last_ticker: 0,
            pending_delivery: None,
            delivered: false,
            dirty: false,
        }
    }

    pub fn view(&self) -> TrackerView {
        TrackerView {
            job_id: self.job_id.clone(),
            phase: self.phase,
            connection: self.connection,
            progress: self.progress,
            status_message: self.status_message.clone(),
            error: self.error.clone(),
            last_transport_error: self.last_transport_error.clone(),
            criteria: self.criteria.clone(),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn job_id(&self) -> Option<&JobId> {
        self.job_id.as_ref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    pub fn ticker(&self) -> Option<u64> {
        self.ticker
    }

    pub fn is_attached(&self) -> bool {
        self.job_id.is_some()
    }

    /// Returns whether the view changed since the last call, clearing the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn is_live_attempt(&self, attempt: u64) -> bool {
        self.is_attached() && self.attempt == attempt
    }

    pub(crate) fn attach(&mut self, job_id: JobId, criteria: SearchCriteria) {
        self.job_id = Some(job_id);
        self.criteria = Some(criteria);
        self.progress = 0;
        self.error = None;
        self.last_transport_error = None;
        self.pending_delivery = None;
        self.delivered = false;
        self.begin_attempt();
    }

    pub(crate) fn begin_attempt(&mut self) {
        self.attempt += 1;
        self.ticker = None;
        self.phase = Phase::Connecting;
        self.connection = ConnectionState::Connecting;
        self.set_status(STATUS_CONNECTING);
    }

    pub(crate) fn mark_subscribing(&mut self) {
        self.phase = Phase::Subscribing;
        self.connection = ConnectionState::Connected;
        self.last_transport_error = None;
        self.set_status(STATUS_SUBSCRIBING);
    }

    /// Enters `InProgress` and returns the number of the freshly started ticker.
    pub(crate) fn start_ticker(&mut self) -> u64 {
        self.last_ticker += 1;
        self.ticker = Some(self.last_ticker);
        self.phase = Phase::InProgress;
        self.set_status(STATUS_IN_PROGRESS);
        self.last_ticker
    }

    pub(crate) fn advance_progress(&mut self) {
        let cap = self.config.progress_cap.min(99);
        if self.progress >= cap {
            return;
        }
        let next = self
            .progress
            .saturating_add(self.config.progress_step)
            .min(cap);
        self.set_progress(next);
    }

    pub(crate) fn set_progress(&mut self, value: u8) {
        let value = value.min(100);
        if self.progress != value {
            self.progress = value;
            self.dirty = true;
        }
    }

    pub(crate) fn complete(&mut self, payload: Value) {
        self.phase = Phase::Terminal(Outcome::Success);
        self.ticker = None;
        self.pending_delivery = Some(payload);
        self.set_progress(100);
        self.set_status(STATUS_COMPLETE);
    }

    pub(crate) fn fail(&mut self, message: String) {
        self.phase = Phase::Terminal(Outcome::Failure);
        self.ticker = None;
        self.set_status(&format!("Error: {message}"));
        self.error = Some(message);
    }

    pub(crate) fn lose_connection(&mut self, status: &str, reason: Option<String>) {
        self.phase = Phase::Reconnecting;
        self.connection = ConnectionState::Error;
        self.ticker = None;
        self.last_transport_error = reason;
        self.set_status(status);
    }

    pub(crate) fn close_cleanly(&mut self) {
        self.phase = Phase::Closed;
        self.connection = ConnectionState::Error;
        self.ticker = None;
        self.set_status(STATUS_CLOSED);
    }

    pub(crate) fn take_delivery(&mut self) -> Option<Value> {
        if self.delivered || self.phase != Phase::Terminal(Outcome::Success) {
            return None;
        }
        let payload = self.pending_delivery.take()?;
        self.delivered = true;
        Some(payload)
    }

    pub(crate) fn reset_to_idle(&mut self) {
        self.job_id = None;
        self.criteria = None;
        self.phase = Phase::Idle;
        self.connection = ConnectionState::Connecting;
        self.progress = 0;
        self.error = None;
        self.last_transport_error = None;
        self.ticker = None;
        self.pending_delivery = None;
        self.delivered = false;
        self.set_status(STATUS_INITIAL);
        self.dirty = true;
    }

    fn set_status(&mut self, status: &str) {
        self.status_message = status.to_string();
        self.dirty = true;
    }
}
