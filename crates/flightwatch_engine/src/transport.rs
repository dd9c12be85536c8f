use std::sync::Arc;

use engine_logging::{engine_debug, engine_info, engine_trace, engine_warn};
use flightwatch_core::{decode_frame, Msg};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{header::ORIGIN, HeaderValue};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

use crate::{TransportError, TransportEvent};

/// One open socket to the cable server.
#[async_trait::async_trait]
pub trait CableConnection: Send {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError>;

    /// Waits for the next frame or for the socket to end. Must be safe to drop
    /// while pending.
    async fn next_event(&mut self) -> TransportEvent;

    async fn close(&mut self);
}

#[async_trait::async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<Box<dyn CableConnection>, TransportError>;
}

/// Websocket connector backed by tokio-tungstenite.
#[derive(Debug, Clone, Default)]
pub struct TungsteniteConnector {
    origin: Option<String>,
}

impl TungsteniteConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sends an `Origin` header; cable servers usually check it against an allow list.
    pub fn with_origin(origin: impl Into<String>) -> Self {
        Self {
            origin: Some(origin.into()),
        }
    }
}

#[async_trait::async_trait]
impl Connector for TungsteniteConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn CableConnection>, TransportError> {
        let mut request = url
            .into_client_request()
            .map_err(|err| TransportError::InvalidUrl {
                url: url.to_string(),
                reason: err.to_string(),
            })?;
        if let Some(origin) = self.origin.as_deref() {
            let value = HeaderValue::from_str(origin)
                .map_err(|err| TransportError::Connect(format!("bad origin header: {err}")))?;
            request.headers_mut().insert(ORIGIN, value);
        }

        let (stream, _response) = connect_async(request)
            .await
            .map_err(|err| TransportError::Connect(err.to_string()))?;
        Ok(Box::new(TungsteniteConnection { stream }))
    }
}

struct TungsteniteConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait::async_trait]
impl CableConnection for TungsteniteConnection {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.stream
            .send(Message::Text(text.into()))
            .await
            .map_err(|err| TransportError::Send(err.to_string()))
    }

    async fn next_event(&mut self) -> TransportEvent {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    return TransportEvent::Text(text.as_str().to_owned());
                }
                Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes.to_vec()) {
                    Ok(text) => return TransportEvent::Text(text),
                    Err(_) => {
                        engine_warn!("Skipping non-UTF-8 binary frame ({} bytes)", bytes.len());
                    }
                },
                Some(Ok(Message::Close(frame))) => {
                    engine_debug!("Cable close frame received: {:?}", frame);
                    return TransportEvent::Closed { clean: true };
                }
                // Ping/pong are answered by tungstenite itself.
                Some(Ok(_)) => {}
                Some(Err(err)) => return TransportEvent::Failed(err.to_string()),
                None => return TransportEvent::Closed { clean: false },
            }
        }
    }

    async fn close(&mut self) {
        if let Err(err) = self.stream.close(None).await {
            engine_debug!("Cable close failed: {}", err);
        }
    }
}

/// Owner's side of a running connection task. Dropping it starts closing the
/// socket; [`ConnectionHandle::close`] also hands back the task to await.
pub(crate) struct ConnectionHandle {
    attempt: u64,
    outgoing: mpsc::UnboundedSender<String>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ConnectionHandle {
    pub(crate) fn attempt(&self) -> u64 {
        self.attempt
    }

    pub(crate) fn send(&self, text: String) {
        if self.outgoing.send(text).is_err() {
            engine_debug!("Connection task for attempt {} already gone", self.attempt);
        }
    }

    /// Cancels the connection task and returns it so the caller can wait
    /// for the close frame to go out.
    pub(crate) fn close(mut self) -> Option<JoinHandle<()>> {
        self.cancel.cancel();
        self.task.take()
    }
}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

pub(crate) fn spawn_connection(
    connector: Arc<dyn Connector>,
    url: String,
    attempt: u64,
    events: mpsc::UnboundedSender<Msg>,
) -> ConnectionHandle {
    let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let task = tokio::spawn(run_connection(
        connector,
        url,
        attempt,
        outgoing_rx,
        events,
        cancel.clone(),
    ));
    ConnectionHandle {
        attempt,
        outgoing: outgoing_tx,
        cancel,
        task: Some(task),
    }
}

async fn run_connection(
    connector: Arc<dyn Connector>,
    url: String,
    attempt: u64,
    mut outgoing: mpsc::UnboundedReceiver<String>,
    events: mpsc::UnboundedSender<Msg>,
    cancel: CancellationToken,
) {
    let connected = tokio::select! {
        biased;
        _ = cancel.cancelled() => return,
        result = connector.connect(&url) => result,
    };
    let mut connection = match connected {
        Ok(connection) => connection,
        Err(err) => {
            engine_warn!("Cable connect failed on attempt {}: {}", attempt, err);
            let _ = events.send(Msg::TransportFailed {
                attempt,
                reason: err.to_string(),
            });
            return;
        }
    };

    engine_info!("Cable connected attempt={} url={}", attempt, url);
    if events.send(Msg::TransportOpened { attempt }).is_err() {
        connection.close().await;
        return;
    }

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                engine_debug!("Closing cable connection for attempt {}", attempt);
                connection.close().await;
                return;
            }
            Some(text) = outgoing.recv() => {
                engine_trace!("Cable send attempt={} {}", attempt, text);
                if let Err(err) = connection.send_text(text).await {
                    let _ = events.send(Msg::TransportFailed {
                        attempt,
                        reason: err.to_string(),
                    });
                    return;
                }
            }
            event = connection.next_event() => match event {
                TransportEvent::Text(text) => match decode_frame(&text) {
                    Ok(inbound) => {
                        engine_trace!("Cable recv attempt={} {:?}", attempt, inbound);
                        if events.send(Msg::FrameReceived { attempt, inbound }).is_err() {
                            connection.close().await;
                            return;
                        }
                    }
                    Err(err) => {
                        engine_warn!("Dropping malformed cable frame: {} ({})", err, text);
                    }
                },
                TransportEvent::Closed { clean } => {
                    let _ = events.send(Msg::TransportClosed { attempt, clean });
                    return;
                }
                TransportEvent::Failed(reason) => {
                    let _ = events.send(Msg::TransportFailed { attempt, reason });
                    return;
                }
            },
        }
    }
}
