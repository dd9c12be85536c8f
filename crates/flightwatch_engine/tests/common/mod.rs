#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;

use chrono::NaiveDate;
use flightwatch_core::{Currency, SearchCriteria, TrackerConfig};
use flightwatch_engine::{
    CableConnection, Connector, TrackerEvent, TrackerSettings, TransportError, TransportEvent,
};
use tokio::sync::mpsc;
use tokio::time::timeout;

pub const WAIT: Duration = Duration::from_secs(5);

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

pub fn criteria() -> SearchCriteria {
    SearchCriteria {
        origin: "OSL".to_string(),
        destination: "BCN".to_string(),
        departure_date: NaiveDate::from_ymd_opt(2027, 5, 1).unwrap(),
        return_date: None,
        adults: 1,
        currency: Currency::Eur,
    }
}

/// Fast timings so tests finish in milliseconds.
pub fn settings(cable_url: &str) -> TrackerSettings {
    TrackerSettings {
        cable_url: cable_url.to_string(),
        config: TrackerConfig {
            progress_step: 5,
            tick_interval: Duration::from_millis(10),
            reconnect_delay: Duration::from_millis(40),
            delivery_delay: Duration::from_millis(20),
            ..TrackerConfig::default()
        },
    }
}

/// The test's end of one scripted connection.
pub struct ServerSide {
    pub sent: mpsc::UnboundedReceiver<String>,
    pub events: mpsc::UnboundedSender<TransportEvent>,
}

impl ServerSide {
    pub fn push_text(&self, text: &str) {
        let _ = self.events.send(TransportEvent::Text(text.to_string()));
    }

    pub fn push(&self, event: TransportEvent) {
        let _ = self.events.send(event);
    }

    pub async fn next_sent(&mut self) -> String {
        timeout(WAIT, self.sent.recv())
            .await
            .expect("client sent nothing")
            .expect("connection dropped")
    }
}

/// In-memory connector: every successful connect hands a [`ServerSide`] to the test.
pub struct ScriptedConnector {
    accepted: mpsc::UnboundedSender<ServerSide>,
    refusals: AtomicUsize,
    pub connects: AtomicUsize,
    pub closes: Arc<AtomicUsize>,
}

impl ScriptedConnector {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<ServerSide>) {
        Self::refusing(0)
    }

    /// Refuses the first `refusals` connection attempts.
    pub fn refusing(refusals: usize) -> (Arc<Self>, mpsc::UnboundedReceiver<ServerSide>) {
        let (accepted, rx) = mpsc::unbounded_channel();
        let connector = Arc::new(Self {
            accepted,
            refusals: AtomicUsize::new(refusals),
            connects: AtomicUsize::new(0),
            closes: Arc::new(AtomicUsize::new(0)),
        });
        (connector, rx)
    }
}

#[async_trait::async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self, _url: &str) -> Result<Box<dyn CableConnection>, TransportError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let refused = self
            .refusals
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if refused {
            return Err(TransportError::Connect("connection refused".to_string()));
        }

        let (sent_tx, sent_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let _ = self.accepted.send(ServerSide {
            sent: sent_rx,
            events: events_tx,
        });
        Ok(Box::new(ScriptedConnection {
            sent: sent_tx,
            events: events_rx,
            closes: self.closes.clone(),
        }))
    }
}

struct ScriptedConnection {
    sent: mpsc::UnboundedSender<String>,
    events: mpsc::UnboundedReceiver<TransportEvent>,
    closes: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl CableConnection for ScriptedConnection {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.sent
            .send(text)
            .map_err(|_| TransportError::Send("peer gone".to_string()))
    }

    async fn next_event(&mut self) -> TransportEvent {
        self.events
            .recv()
            .await
            .unwrap_or(TransportEvent::Closed { clean: false })
    }

    async fn close(&mut self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

pub async fn accept(rx: &mut mpsc::UnboundedReceiver<ServerSide>) -> ServerSide {
    timeout(WAIT, rx.recv())
        .await
        .expect("no connection attempt")
        .expect("connector dropped")
}

/// Reads tracker events until `pick` returns something.
pub async fn wait_for<T>(
    rx: &mut mpsc::UnboundedReceiver<TrackerEvent>,
    mut pick: impl FnMut(&TrackerEvent) -> Option<T>,
) -> T {
    timeout(WAIT, async {
        loop {
            let event = rx.recv().await.expect("tracker sink closed");
            if let Some(found) = pick(&event) {
                return found;
            }
        }
    })
    .await
    .expect("timed out waiting for tracker event")
}

/// Collects whatever the tracker reports within `window`.
pub async fn drain_for(
    rx: &mut mpsc::UnboundedReceiver<TrackerEvent>,
    window: Duration,
) -> Vec<TrackerEvent> {
    let mut events = Vec::new();
    let _ = timeout(window, async {
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
    })
    .await;
    events
}

pub fn subscribe_text(job_id: &str) -> String {
    format!(
        r#"{{"command":"subscribe","identifier":"{{\"channel\":\"FlightsChannel\",\"job_id\":\"{job_id}\"}}"}}"#
    )
}
