//! Flightwatch core: job-status state machine, cable wire format and search
//! data types. Pure; no IO.
mod criteria;
mod effect;
mod envelope;
mod msg;
mod results;
mod state;
mod update;
mod view_model;

pub use criteria::{Currency, CriteriaError, SearchCriteria, MAX_ADULTS, MIN_ADULTS};
pub use effect::Effect;
pub use envelope::{
    decode_frame, subscribe_command, ControlKind, DecodeError, Inbound, TerminalPayload,
};
pub use msg::Msg;
pub use results::{extract_flights, Endpoint, FlightOffer};
pub use state::{ConnectionState, JobId, Outcome, Phase, TrackerConfig, TrackerState};
pub use update::update;
pub use view_model::TrackerView;
