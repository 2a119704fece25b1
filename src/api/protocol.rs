//! Wire protocol for the control channel.
//!
//! One JSON object per message. Requests carry a `type` discriminator and
//! decode into a tagged enum; anything that does not match one of the
//! request shapes is answered with a protocol error and never reaches
//! dispatch. Responses mirror the operation that produced them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::audio::{DiscoveredApp, StepDirection, DEFAULT_STEP_PERCENT};

/// A validated client request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    /// Absolute volume set; the percent saturates downstream.
    #[serde(rename = "setVolume")]
    SetVolume { app: String, value: f32 },

    /// Flip the target's mute flag.
    #[serde(rename = "toggleMute")]
    ToggleMute { app: String },

    /// Read the target's current volume.
    #[serde(rename = "getStatus")]
    GetStatus { app: String },

    /// Relative volume step.
    #[serde(rename = "adjustVolume")]
    AdjustVolume {
        app: String,
        direction: StepDirection,
        #[serde(default = "default_amount")]
        amount: f32,
    },

    /// Enumerate the applications currently rendering audio.
    #[serde(rename = "getRunningApps")]
    GetRunningApps,
}

fn default_amount() -> f32 {
    DEFAULT_STEP_PERCENT
}

impl Request {
    /// Parse and validate one message.
    ///
    /// Classification is staged so every rejection maps to the most
    /// specific protocol error: payload shape first, then the
    /// discriminator, then per-operation required fields, and finally the
    /// full typed decode.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(text).map_err(|_| ProtocolError::BadFormat)?;
        let object = value.as_object().ok_or(ProtocolError::BadFormat)?;
        let kind = object
            .get("type")
            .and_then(Value::as_str)
            .ok_or(ProtocolError::MissingType)?;

        let required: &[&str] = match kind {
            "setVolume" => &["app", "value"],
            "toggleMute" | "getStatus" => &["app"],
            "adjustVolume" => &["app", "direction"],
            "getRunningApps" => &[],
            _ => return Err(ProtocolError::UnknownCommand),
        };
        for field in required {
            if !object.contains_key(*field) {
                return Err(match *field {
                    "app" => ProtocolError::MissingApp,
                    _ => ProtocolError::MissingFields,
                });
            }
        }
        if required.contains(&"app") && !object["app"].is_string() {
            return Err(ProtocolError::MissingApp);
        }

        serde_json::from_value(value).map_err(|_| ProtocolError::BadFormat)
    }
}

/// Pre-dispatch request rejection, reported verbatim on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// Payload was not a JSON object, or a field value was unusable.
    BadFormat,
    /// No `type` discriminator string.
    MissingType,
    /// The discriminator named no known operation.
    UnknownCommand,
    /// The operation requires an `app` target and none was given.
    MissingApp,
    /// Another required field was absent.
    MissingFields,
}

impl ProtocolError {
    /// Exact wire string for the `error` field.
    pub fn as_str(self) -> &'static str {
        match self {
            ProtocolError::BadFormat => "bad format",
            ProtocolError::MissingType => "missing type",
            ProtocolError::UnknownCommand => "unknown command",
            ProtocolError::MissingApp => "missing app",
            ProtocolError::MissingFields => "missing fields",
        }
    }
}

/// Operation outcome flag on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Fail,
}

impl From<bool> for Status {
    fn from(ok: bool) -> Self {
        if ok {
            Status::Ok
        } else {
            Status::Fail
        }
    }
}

/// One discovered application on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunningApp {
    pub app: String,
    pub icon: String,
}

impl From<DiscoveredApp> for RunningApp {
    fn from(app: DiscoveredApp) -> Self {
        Self {
            app: app.name,
            icon: app.icon,
        }
    }
}

/// A serialized reply. Every handled message produces exactly one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    /// `setVolume` / `toggleMute` outcome.
    Ack { status: Status },

    /// `getStatus` outcome; volume is 0 on a miss.
    Volume {
        app: String,
        volume: u32,
        status: Status,
    },

    /// `adjustVolume` outcome with the resulting volume as feedback.
    Adjusted { status: Status, volume: u32 },

    /// `getRunningApps` payload.
    RunningApps {
        #[serde(rename = "runningApps")]
        running_apps: Vec<RunningApp>,
    },

    /// Pre-dispatch rejection.
    Error { error: &'static str },
}

impl Response {
    pub fn ack(ok: bool) -> Self {
        Response::Ack { status: ok.into() }
    }

    pub fn error(error: ProtocolError) -> Self {
        Response::Error {
            error: error.as_str(),
        }
    }
}
