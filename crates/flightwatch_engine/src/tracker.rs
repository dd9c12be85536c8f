use std::sync::Arc;
use std::time::Duration;

use engine_logging::{engine_debug, engine_error, engine_info, engine_warn};
use flightwatch_core::{update, Effect, JobId, Msg, SearchCriteria, TrackerConfig, TrackerState};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};

use crate::transport::{spawn_connection, ConnectionHandle};
use crate::{Connector, TrackerSink, TransportError};

const CLOSE_GRACE: Duration = Duration::from_secs(2);

/// Where and how to track jobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerSettings {
    pub cable_url: String,
    pub config: TrackerConfig,
}

impl TrackerSettings {
    pub fn new(cable_url: impl Into<String>) -> Self {
        Self {
            cable_url: cable_url.into(),
            config: TrackerConfig::default(),
        }
    }

    fn validate(&self) -> Result<(), TransportError> {
        let invalid = |reason: String| TransportError::InvalidUrl {
            url: self.cable_url.clone(),
            reason,
        };
        let url = url::Url::parse(&self.cable_url).map_err(|err| invalid(err.to_string()))?;
        match url.scheme() {
            "ws" | "wss" => {}
            other => return Err(invalid(format!("unsupported scheme {other}"))),
        }
        if self.config.tick_interval.is_zero() {
            return Err(TransportError::InvalidSettings(
                "tick interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Everything a tracker holds that must not outlive its interest in the job.
#[derive(Default)]
struct Resources {
    connection: Option<ConnectionHandle>,
    ticker: Option<JoinHandle<()>>,
    reconnect: Option<JoinHandle<()>>,
    delivery: Option<JoinHandle<()>>,
    /// Connection tasks still sending their close frame.
    closing: Vec<JoinHandle<()>>,
}

impl Resources {
    fn close_connection(&mut self) {
        self.closing.retain(|task| !task.is_finished());
        if let Some(task) = self.connection.take().and_then(ConnectionHandle::close) {
            self.closing.push(task);
        }
    }

    /// Waits until every cancelled connection has closed its socket.
    async fn finish_closing(&mut self) {
        for task in self.closing.drain(..) {
            match tokio::time::timeout(CLOSE_GRACE, task).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => engine_error!("Connection task ended abnormally: {}", err),
                Err(_) => engine_warn!("Cable close did not finish within {:?}", CLOSE_GRACE),
            }
        }
    }

    fn teardown(&mut self) {
        self.close_connection();
        cancel_timer(&mut self.ticker);
        cancel_timer(&mut self.reconnect);
        cancel_timer(&mut self.delivery);
    }
}

impl Drop for Resources {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn replace_timer(slot: &mut Option<JoinHandle<()>>, task: JoinHandle<()>) {
    if let Some(previous) = slot.replace(task) {
        previous.abort();
    }
}

fn cancel_timer(slot: &mut Option<JoinHandle<()>>) {
    if let Some(task) = slot.take() {
        task.abort();
    }
}

/// Follows one job over the cable until it completes, fails or is abandoned.
///
/// All state lives on a single task; transport callbacks and timer fires are
/// funnelled into it as [`Msg`]s and applied in arrival order.
pub struct JobStatusTracker {
    state: TrackerState,
    resources: Resources,
    cable_url: String,
    connector: Arc<dyn Connector>,
    sink: Arc<dyn TrackerSink>,
    events: mpsc::UnboundedSender<Msg>,
}

impl JobStatusTracker {
    /// Starts tracking `job_id`. Must be called from within a tokio runtime.
    pub fn spawn(
        job_id: JobId,
        criteria: SearchCriteria,
        settings: TrackerSettings,
        connector: Arc<dyn Connector>,
        sink: Arc<dyn TrackerSink>,
    ) -> Result<TrackerHandle, TransportError> {
        settings.validate()?;
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        engine_info!("Tracking job {} via {}", job_id, settings.cable_url);
        let _ = events_tx.send(Msg::Attach { job_id, criteria });

        let tracker = JobStatusTracker {
            state: TrackerState::new(settings.config),
            resources: Resources::default(),
            cable_url: settings.cable_url,
            connector,
            sink,
            events: events_tx.clone(),
        };
        let task = tokio::spawn(tracker.run(events_rx));

        Ok(TrackerHandle {
            events: events_tx,
            task: Some(task),
        })
    }

    async fn run(mut self, mut events_rx: mpsc::UnboundedReceiver<Msg>) {
        while let Some(msg) = events_rx.recv().await {
            self.dispatch(msg);
            if !self.state.is_attached() {
                break;
            }
        }
        self.resources.teardown();
        self.resources.finish_closing().await;
        engine_debug!("Tracker stopped");
    }

    fn dispatch(&mut self, msg: Msg) {
        match &msg {
            Msg::TransportFailed { attempt, reason } => {
                engine_warn!("Cable attempt {} failed: {}", attempt, reason);
            }
            Msg::TransportClosed { attempt, clean } => {
                engine_info!("Cable attempt {} closed (clean={})", attempt, clean);
            }
            _ => {}
        }

        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        let view = state.consume_dirty().then(|| state.view());
        self.state = state;

        if let Some(view) = view {
            self.sink.view(view);
        }
        for effect in effects {
            self.execute(effect);
        }
    }

    fn execute(&mut self, effect: Effect) {
        engine_debug!("Tracker effect {:?}", effect);
        match effect {
            Effect::OpenTransport { attempt } => {
                self.resources.connection = Some(spawn_connection(
                    self.connector.clone(),
                    self.cable_url.clone(),
                    attempt,
                    self.events.clone(),
                ));
            }
            Effect::Send { attempt, text } => match &self.resources.connection {
                Some(connection) if connection.attempt() == attempt => connection.send(text),
                _ => engine_warn!("No open connection for attempt {}; dropping send", attempt),
            },
            Effect::CloseTransport => self.resources.close_connection(),
            Effect::StartTicker { ticker, interval } => {
                let task = self.spawn_ticker(ticker, interval);
                replace_timer(&mut self.resources.ticker, task);
            }
            Effect::StopTicker => cancel_timer(&mut self.resources.ticker),
            Effect::ScheduleReconnect { attempt, delay } => {
                engine_info!("Reconnecting in {:?}", delay);
                let task = self.spawn_after(delay, Msg::ReconnectDue { attempt });
                replace_timer(&mut self.resources.reconnect, task);
            }
            Effect::ScheduleDelivery { delay } => {
                let task = self.spawn_after(delay, Msg::DeliveryDue);
                replace_timer(&mut self.resources.delivery, task);
            }
            Effect::DeliverResult(payload) => self.sink.terminal_result(payload),
            Effect::NotifyCancelled => self.sink.cancel_requested(),
            Effect::Teardown => self.resources.teardown(),
        }
    }

    fn spawn_ticker(&self, ticker: u64, period: Duration) -> JoinHandle<()> {
        let events = self.events.clone();
        tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                if events.send(Msg::ProgressTick { ticker }).is_err() {
                    break;
                }
            }
        })
    }

    fn spawn_after(&self, delay: Duration, msg: Msg) -> JoinHandle<()> {
        let events = self.events.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(msg);
        })
    }
}

/// Owner's side of a running tracker.
///
/// Dropping the handle detaches the tracker; use [`TrackerHandle::shutdown`]
/// or [`TrackerHandle::cancel`] to wait until every socket and timer is gone.
pub struct TrackerHandle {
    events: mpsc::UnboundedSender<Msg>,
    task: Option<JoinHandle<()>>,
}

impl TrackerHandle {
    /// User cancel: tears down and invokes the sink's `cancel_requested`.
    pub async fn cancel(mut self) {
        let _ = self.events.send(Msg::CancelRequested);
        self.join().await;
    }

    /// Stops tracking without notifying the sink.
    pub async fn shutdown(mut self) {
        let _ = self.events.send(Msg::Detach);
        self.join().await;
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    async fn join(&mut self) {
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                engine_error!("Tracker task ended abnormally: {}", err);
            }
        }
    }
}

impl Drop for TrackerHandle {
    fn drop(&mut self) {
        if self.task.is_some() {
            let _ = self.events.send(Msg::Detach);
        }
    }
}
