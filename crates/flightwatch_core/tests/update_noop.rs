use flightwatch_core::{update, Msg, TrackerState};

#[test]
fn update_is_noop() {
    let state = TrackerState::default();
    let (next, effects) = update(state.clone(), Msg::NoOp);

    assert_eq!(state, next);
    assert!(effects.is_empty());
}

#[test]
fn idle_tracker_ignores_transport_and_timer_events() {
    let state = TrackerState::default();
    for msg in [
        Msg::TransportOpened { attempt: 0 },
        Msg::TransportClosed {
            attempt: 0,
            clean: false,
        },
        Msg::ProgressTick { ticker: 1 },
        Msg::ReconnectDue { attempt: 0 },
        Msg::DeliveryDue,
        Msg::Detach,
    ] {
        let (next, effects) = update(state.clone(), msg);
        assert_eq!(state, next);
        assert!(effects.is_empty());
    }
}
