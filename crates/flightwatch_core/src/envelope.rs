//! Cable wire format.
//!
//! Inbound frames come in two shapes: the job payload nested under `message`,
//! or the payload fields at the top level of the envelope. [`decode_frame`]
//! folds both into a single [`Inbound`] before the state machine sees them.

use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::JobId;

/// Fields whose presence marks a success-shaped payload.
const RESULT_FIELDS: [&str; 3] = ["data", "flights", "offers"];
const ERRORS_FIELD: &str = "errors";
const PROGRESS_FIELD: &str = "progress";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Ping,
    Welcome,
    ConfirmSubscription,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalPayload {
    Success(Value),
    Failure { message: String, body: Value },
}

/// Canonical form of one inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Control(ControlKind),
    Terminal(TerminalPayload),
    Progress(u8),
    Unrecognized,
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("frame is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("frame is not a JSON object")]
    NotAnObject,
}

/// Builds the subscribe command for `channel`, scoped to `job_id`.
///
/// The identifier is a JSON document encoded as a string, as the cable
/// server expects.
pub fn subscribe_command(channel: &str, job_id: &JobId) -> String {
    let identifier = json!({
        "channel": channel,
        "job_id": job_id,
    });
    json!({
        "command": "subscribe",
        "identifier": identifier.to_string(),
    })
    .to_string()
}

pub fn decode_frame(text: &str) -> Result<Inbound, DecodeError> {
    let value: Value = serde_json::from_str(text)?;
    let Value::Object(envelope) = value else {
        return Err(DecodeError::NotAnObject);
    };

    if let Some(kind) = envelope.get("type").and_then(Value::as_str) {
        match kind {
            "ping" => return Ok(Inbound::Control(ControlKind::Ping)),
            "welcome" => return Ok(Inbound::Control(ControlKind::Welcome)),
            "confirm_subscription" => {
                return Ok(Inbound::Control(ControlKind::ConfirmSubscription))
            }
            _ => {}
        }
    }

    let payload = match envelope.get("message") {
        Some(Value::Object(inner)) => inner,
        _ => &envelope,
    };
    Ok(classify(payload))
}

fn classify(payload: &Map<String, Value>) -> Inbound {
    let present = |field: &str| payload.get(field).is_some_and(|v| !v.is_null());

    // Failure wins when both shapes are present.
    if present(ERRORS_FIELD) {
        let message = render_errors(&payload[ERRORS_FIELD]);
        return Inbound::Terminal(TerminalPayload::Failure {
            message,
            body: Value::Object(payload.clone()),
        });
    }
    if RESULT_FIELDS.iter().any(|field| present(field)) {
        return Inbound::Terminal(TerminalPayload::Success(Value::Object(payload.clone())));
    }
    if let Some(progress) = payload.get(PROGRESS_FIELD).and_then(Value::as_f64) {
        return Inbound::Progress(progress.clamp(0.0, 100.0).round() as u8);
    }
    Inbound::Unrecognized
}

fn render_errors(errors: &Value) -> String {
    match errors {
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}
