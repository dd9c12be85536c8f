use crate::state::{STATUS_CONNECTION_LOST, STATUS_TRANSPORT_ERROR};
use crate::{
    subscribe_command, ControlKind, Effect, Inbound, Msg, Phase, TerminalPayload, TrackerState,
};

/// Pure update function: applies a message to state and returns any effects.
///
/// Events tagged with an attempt or ticker number other than the live one
/// are dropped without touching state. Nothing but `Attach` has any effect
/// while idle.
pub fn update(mut state: TrackerState, msg: Msg) -> (TrackerState, Vec<Effect>) {
    let effects = match msg {
        Msg::Attach { job_id, criteria } => {
            if state.job_id() == Some(&job_id) {
                return (state, Vec::new());
            }
            let mut effects = Vec::with_capacity(2);
            if state.is_attached() {
                effects.push(Effect::Teardown);
            }
            state.attach(job_id, criteria);
            effects.push(Effect::OpenTransport {
                attempt: state.attempt(),
            });
            effects
        }
        Msg::TransportOpened { attempt } => {
            if !state.is_live_attempt(attempt) || state.phase() != Phase::Connecting {
                return (state, Vec::new());
            }
            let Some(job_id) = state.job_id() else {
                return (state, Vec::new());
            };
            let text = subscribe_command(&state.config().channel, job_id);
            state.mark_subscribing();
            vec![Effect::Send { attempt, text }]
        }
        Msg::FrameReceived { attempt, inbound } => {
            if !state.is_live_attempt(attempt) || !state.phase().accepts_transport_events() {
                return (state, Vec::new());
            }
            apply_inbound(&mut state, inbound)
        }
        Msg::TransportFailed { attempt, reason } => {
            if !state.is_live_attempt(attempt) || !state.phase().accepts_transport_events() {
                return (state, Vec::new());
            }
            state.lose_connection(STATUS_TRANSPORT_ERROR, Some(reason));
            reconnect_effects(&state)
        }
        Msg::TransportClosed { attempt, clean } => {
            if !state.is_live_attempt(attempt) || !state.phase().accepts_transport_events() {
                return (state, Vec::new());
            }
            if clean {
                state.close_cleanly();
                vec![Effect::StopTicker, Effect::CloseTransport]
            } else {
                state.lose_connection(STATUS_CONNECTION_LOST, None);
                reconnect_effects(&state)
            }
        }
        Msg::ProgressTick { ticker } => {
            if state.phase() == Phase::InProgress && state.ticker() == Some(ticker) {
                state.advance_progress();
            }
            Vec::new()
        }
        Msg::ReconnectDue { attempt } => {
            if !state.is_live_attempt(attempt) || state.phase() != Phase::Reconnecting {
                return (state, Vec::new());
            }
            state.begin_attempt();
            vec![Effect::OpenTransport {
                attempt: state.attempt(),
            }]
        }
        Msg::DeliveryDue => match state.take_delivery() {
            Some(payload) => vec![Effect::DeliverResult(payload)],
            None => Vec::new(),
        },
        Msg::CancelRequested => {
            if state.is_attached() {
                state.reset_to_idle();
                vec![Effect::Teardown, Effect::NotifyCancelled]
            } else {
                vec![Effect::NotifyCancelled]
            }
        }
        Msg::Detach => {
            if !state.is_attached() {
                return (state, Vec::new());
            }
            state.reset_to_idle();
            vec![Effect::Teardown]
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn apply_inbound(state: &mut TrackerState, inbound: Inbound) -> Vec<Effect> {
    match inbound {
        Inbound::Control(ControlKind::ConfirmSubscription) => {
            // A repeated confirmation must not start a second ticker.
            if state.phase() != Phase::Subscribing {
                return Vec::new();
            }
            let ticker = state.start_ticker();
            vec![Effect::StartTicker {
                ticker,
                interval: state.config().tick_interval,
            }]
        }
        Inbound::Control(ControlKind::Ping | ControlKind::Welcome) | Inbound::Unrecognized => {
            Vec::new()
        }
        Inbound::Progress(value) => {
            state.set_progress(value);
            Vec::new()
        }
        Inbound::Terminal(TerminalPayload::Success(payload)) => {
            state.complete(payload);
            vec![
                Effect::StopTicker,
                Effect::CloseTransport,
                Effect::ScheduleDelivery {
                    delay: state.config().delivery_delay,
                },
            ]
        }
        Inbound::Terminal(TerminalPayload::Failure { message, .. }) => {
            state.fail(message);
            vec![Effect::StopTicker, Effect::CloseTransport]
        }
    }
}

fn reconnect_effects(state: &TrackerState) -> Vec<Effect> {
    vec![
        Effect::StopTicker,
        Effect::CloseTransport,
        Effect::ScheduleReconnect {
            attempt: state.attempt(),
            delay: state.config().reconnect_delay,
        },
    ]
}
