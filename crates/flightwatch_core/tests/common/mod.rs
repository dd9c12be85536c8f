#![allow(dead_code)]

use std::sync::Once;
use std::time::Duration;

use chrono::NaiveDate;
use flightwatch_core::{
    update, ControlKind, Currency, Effect, Inbound, JobId, Msg, SearchCriteria, TerminalPayload,
    TrackerConfig, TrackerState,
};
use serde_json::Value;

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

pub fn criteria() -> SearchCriteria {
    SearchCriteria {
        origin: "LHR".to_string(),
        destination: "JFK".to_string(),
        departure_date: NaiveDate::from_ymd_opt(2026, 11, 2).unwrap(),
        return_date: NaiveDate::from_ymd_opt(2026, 11, 9),
        adults: 2,
        currency: Currency::Gbp,
    }
}

/// Steps of ten so a handful of ticks reaches the cap.
pub fn config() -> TrackerConfig {
    TrackerConfig {
        progress_step: 10,
        tick_interval: Duration::from_millis(500),
        reconnect_delay: Duration::from_millis(3000),
        delivery_delay: Duration::from_millis(500),
        ..TrackerConfig::default()
    }
}

pub fn attach(job_id: impl Into<JobId>) -> (TrackerState, Vec<Effect>) {
    update(
        TrackerState::new(config()),
        Msg::Attach {
            job_id: job_id.into(),
            criteria: criteria(),
        },
    )
}

pub fn frame(state: TrackerState, inbound: Inbound) -> (TrackerState, Vec<Effect>) {
    let attempt = state.attempt();
    update(state, Msg::FrameReceived { attempt, inbound })
}

pub fn confirm(state: TrackerState) -> (TrackerState, Vec<Effect>) {
    frame(state, Inbound::Control(ControlKind::ConfirmSubscription))
}

pub fn success(body: Value) -> Inbound {
    Inbound::Terminal(TerminalPayload::Success(body))
}

pub fn failure(message: &str) -> Inbound {
    Inbound::Terminal(TerminalPayload::Failure {
        message: message.to_string(),
        body: serde_json::json!({ "errors": message }),
    })
}

/// Attaches, opens the transport and confirms the subscription.
pub fn in_progress(job_id: impl Into<JobId>) -> TrackerState {
    let (state, _) = attach(job_id);
    let attempt = state.attempt();
    let (state, _) = update(state, Msg::TransportOpened { attempt });
    let (state, _) = confirm(state);
    state
}

pub fn tick(state: TrackerState) -> (TrackerState, Vec<Effect>) {
    let ticker = state.ticker().expect("ticker running");
    update(state, Msg::ProgressTick { ticker })
}

pub fn started_ticker(effects: &[Effect]) -> Option<u64> {
    effects.iter().find_map(|effect| match effect {
        Effect::StartTicker { ticker, .. } => Some(*ticker),
        _ => None,
    })
}
