//! Control channel for remote mixer access.
//!
//! WebSocket server, wire protocol, and request dispatch.

mod handlers;
mod protocol;
mod server;

pub use handlers::CommandHandler;
pub use server::ControlServer;
