use crate::{Inbound, JobId, SearchCriteria};

/// Everything that can happen to a tracker: user intent, transport callbacks
/// and timer fires. Transport and timer events carry the attempt or ticker
/// number they were started under so stale deliveries can be recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// A job id became available; start tracking it.
    Attach {
        job_id: JobId,
        criteria: SearchCriteria,
    },
    /// The socket for `attempt` finished its handshake.
    TransportOpened { attempt: u64 },
    /// A decoded frame arrived on the socket for `attempt`.
    FrameReceived { attempt: u64, inbound: Inbound },
    /// Connecting, reading or writing failed.
    TransportFailed { attempt: u64, reason: String },
    /// The socket closed. `clean` is true when a close frame was received.
    TransportClosed { attempt: u64, clean: bool },
    /// Progress ticker fired.
    ProgressTick { ticker: u64 },
    /// Reconnect backoff elapsed.
    ReconnectDue { attempt: u64 },
    /// Cosmetic delay after completion elapsed; hand the result over.
    DeliveryDue,
    /// User asked to leave the loading screen.
    CancelRequested,
    /// The owner lost interest (screen unmounted or job id cleared).
    Detach,
    /// Fallback for placeholder wiring.
    NoOp,
}
