//! Request dispatch.
//!
//! Maps validated requests onto the audio components and composes one
//! response per request. Failures past the parse boundary are contained
//! here; nothing propagates to the transport.

use crate::audio::{AppDiscovery, AudioError, VolumeEngine};

use super::protocol::{ProtocolError, Request, Response};

/// Dispatches validated requests to the audio components.
///
/// Collaborators are injected at construction; the handler itself holds no
/// state across messages.
pub struct CommandHandler {
    engine: VolumeEngine,
    discovery: AppDiscovery,
}

impl CommandHandler {
    pub fn new(engine: VolumeEngine, discovery: AppDiscovery) -> Self {
        Self { engine, discovery }
    }

    /// Handle one raw message and produce exactly one response.
    pub fn handle_text(&self, text: &str) -> Response {
        log::debug!("request: {text}");
        match Request::parse(text) {
            Ok(request) => self.dispatch(request),
            Err(error) => {
                log::warn!("rejected request: {}", error.as_str());
                Response::error(error)
            }
        }
    }

    fn dispatch(&self, request: Request) -> Response {
        let result = match request {
            Request::SetVolume { app, value } => {
                self.engine.set_volume(&app, value).map(Response::ack)
            }
            Request::ToggleMute { app } => self.engine.toggle_mute(&app).map(Response::ack),
            Request::GetStatus { app } => {
                self.engine.current_volume(&app).map(|volume| Response::Volume {
                    app,
                    volume: volume.unwrap_or(0),
                    status: volume.is_some().into(),
                })
            }
            Request::AdjustVolume {
                app,
                direction,
                amount,
            } => self
                .engine
                .step_volume(&app, direction, amount)
                .map(|volume| Response::Adjusted {
                    status: volume.is_some().into(),
                    volume: volume.unwrap_or(0),
                }),
            Request::GetRunningApps => {
                self.discovery.list_running_apps().map(|apps| Response::RunningApps {
                    running_apps: apps.into_iter().map(Into::into).collect(),
                })
            }
        };

        result.unwrap_or_else(|error: AudioError| {
            log::error!("audio operation failed: {error}");
            Response::error(ProtocolError::BadFormat)
        })
    }
}
