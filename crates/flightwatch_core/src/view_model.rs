use crate::{ConnectionState, JobId, Phase, SearchCriteria};

/// Snapshot of everything the loading screen displays.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrackerView {
    pub job_id: Option<JobId>,
    pub phase: Phase,
    pub connection: ConnectionState,
    pub progress: u8,
    pub status_message: String,
    pub error: Option<String>,
    pub last_transport_error: Option<String>,
    pub criteria: Option<SearchCriteria>,
}

impl TrackerView {
    /// Label for the connection indicator dot.
    pub fn connection_label(&self) -> &'static str {
        match self.connection {
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Error => "error",
        }
    }
}
