use std::time::Duration;

use serde_json::Value;

/// Side effects requested by [`crate::update`]; executed by the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    OpenTransport { attempt: u64 },
    Send { attempt: u64, text: String },
    CloseTransport,
    StartTicker { ticker: u64, interval: Duration },
    StopTicker,
    ScheduleReconnect { attempt: u64, delay: Duration },
    ScheduleDelivery { delay: Duration },
    /// Invoke the terminal-result callback with the success payload.
    DeliverResult(Value),
    /// Invoke the cancel callback.
    NotifyCancelled,
    /// Release the connection and every pending timer.
    Teardown,
}
