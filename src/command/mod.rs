//! Real-time directional commands over the device WebSocket.
//!
//! - `types`: commands, jog inputs and the connection state
//! - `channel`: the connection state machine and drop-when-not-open dispatch
//! - `websocket`: the tungstenite link thread behind a channel
//! - `task`: the executor task wiring UI requests to the channel

pub mod channel;
pub mod task;
pub mod types;
pub mod websocket;

pub use task::{JogRequest, can_reconnect, command_task};
pub use types::{ArrowKey, Command, ConnectionState, JogButton, JogInput};
