//! Mixdeck - per-application volume control for hardware control surfaces.
//!
//! Bridges a remote control surface to the operating system's per-app audio
//! mixer over a local WebSocket channel: set, step, and toggle volume by
//! application name, and enumerate the applications currently playing.

mod api;
mod audio;

use anyhow::Context;

use api::{CommandHandler, ControlServer};
use audio::{AppDiscovery, VolumeEngine};

/// Fixed port the control channel listens on.
const CONTROL_PORT: u16 = 8181;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    log::info!("Starting mixdeck v{}", env!("CARGO_PKG_VERSION"));

    let backend = audio::create_backend();
    backend
        .initialize()
        .context("failed to acquire the default render endpoint")?;

    let engine = VolumeEngine::new(backend.clone());
    let discovery = AppDiscovery::new(backend);
    let handler = CommandHandler::new(engine, discovery);

    let server = ControlServer::bind(handler, CONTROL_PORT)
        .await
        .context("failed to bind the control channel")?;
    server.run().await.context("control server terminated")?;

    Ok(())
}
