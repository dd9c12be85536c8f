use flightwatch_core::TrackerView;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::TrackerEvent;

/// Receives everything a tracker wants its owner to know.
pub trait TrackerSink: Send + Sync {
    /// The displayed state changed.
    fn view(&self, view: TrackerView);

    /// Called at most once per job, and only for a success payload.
    fn terminal_result(&self, payload: Value);

    fn cancel_requested(&self);
}

pub struct ChannelSink {
    tx: mpsc::UnboundedSender<TrackerEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<TrackerEvent>) -> Self {
        Self { tx }
    }

    pub fn channel() -> (Self, mpsc::UnboundedReceiver<TrackerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    fn emit(&self, event: TrackerEvent) {
        let _ = self.tx.send(event);
    }
}

impl TrackerSink for ChannelSink {
    fn view(&self, view: TrackerView) {
        self.emit(TrackerEvent::View(view));
    }

    fn terminal_result(&self, payload: Value) {
        self.emit(TrackerEvent::TerminalResult(payload));
    }

    fn cancel_requested(&self) {
        self.emit(TrackerEvent::CancelRequested);
    }
}
