//! Connection state machine for the command channel.
//!
//! `Connecting -> Open -> Closed`, with `Closed` reachable from anywhere.
//! Commands are sent only while `Open` and silently dropped otherwise; there
//! is no queue and no retry. Reconnecting is an explicit operator action and
//! starts a new connection generation, so late events from an abandoned
//! connection cannot move the state.

use super::{Command, ConnectionState};

/// The transport went away while sending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportClosed(pub String);

impl std::fmt::Display for TransportClosed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Transport closed: {}", self.0)
    }
}

impl std::error::Error for TransportClosed {}

/// Outbound side of one connection.
pub trait CommandTransport {
    /// Hand one text frame to the connection, in call order.
    fn transmit(&mut self, frame: &str) -> Result<(), TransportClosed>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Sent,
    /// Not sent; carries the state the channel was in.
    Dropped(ConnectionState),
}

pub struct CommandChannel<T> {
    state: ConnectionState,
    generation: u64,
    transport: Option<T>,
}

impl<T: CommandTransport> CommandChannel<T> {
    /// Start the first connection. `connect` receives the generation number
    /// the transport must tag its events with.
    pub fn connect<F: FnOnce(u64) -> T>(connect: F) -> Self {
        Self {
            state: ConnectionState::Connecting,
            generation: 0,
            transport: Some(connect(0)),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Handshake finished. Returns `true` when the state changed.
    pub fn on_open(&mut self, generation: u64) -> bool {
        if generation != self.generation || self.state != ConnectionState::Connecting {
            return false;
        }
        self.state = ConnectionState::Open;
        true
    }

    /// Transport error or close frame. Returns `true` when the state changed.
    pub fn on_closed(&mut self, generation: u64) -> bool {
        if generation != self.generation || self.state == ConnectionState::Closed {
            return false;
        }
        self.close();
        true
    }

    /// Send `command` if the channel is open, otherwise drop it.
    pub fn dispatch(&mut self, command: Command) -> DispatchOutcome {
        if self.state != ConnectionState::Open {
            return DispatchOutcome::Dropped(self.state);
        }
        let Some(transport) = self.transport.as_mut() else {
            return DispatchOutcome::Dropped(self.state);
        };
        match transport.transmit(command.token()) {
            Ok(()) => DispatchOutcome::Sent,
            Err(e) => {
                log::warn!("Command {} lost: {}", command, e);
                self.close();
                DispatchOutcome::Dropped(ConnectionState::Closed)
            }
        }
    }

    /// Close the channel and release the transport.
    pub fn close(&mut self) {
        self.state = ConnectionState::Closed;
        self.transport = None;
    }

    /// Start a new connection, only from `Closed`.
    ///
    /// Returns `false` (and does not call `connect`) in any other state.
    pub fn reconnect<F: FnOnce(u64) -> T>(&mut self, connect: F) -> bool {
        if self.state != ConnectionState::Closed {
            return false;
        }
        self.generation += 1;
        self.transport = Some(connect(self.generation));
        self.state = ConnectionState::Connecting;
        true
    }
}
