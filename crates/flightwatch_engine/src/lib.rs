//! Flightwatch engine: cable transport, job tracker runtime and search submission.
mod sink;
mod submit;
mod tracker;
mod transport;
mod types;

pub use sink::{ChannelSink, TrackerSink};
pub use submit::{ReqwestSubmitter, SearchSubmitter, SubmitSettings};
pub use tracker::{JobStatusTracker, TrackerHandle, TrackerSettings};
pub use transport::{CableConnection, Connector, TungsteniteConnector};
pub use types::{SubmitError, SubmitFailure, TrackerEvent, TransportError, TransportEvent};
