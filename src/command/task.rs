//! Executor task owning the command channel.

use embassy_futures::select::{Either, select};

use super::channel::{CommandChannel, DispatchOutcome};
use super::websocket::{self, LINK_EVENTS, LinkEvent};
use super::{Command, ConnectionState};
use crate::ui::UIRefreshState;
use crate::{JogRequestQueueReceiver, UIRefreshQueueSender};

/// Operator input for the command channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JogRequest {
    Dispatch(Command),
    /// Open a fresh connection; ignored unless the channel is closed.
    Reconnect,
}

/// Connect to `ws_url` and relay jog commands while the connection is open.
///
/// # Parameters
///
/// * `ws_url` - Full WebSocket URL of the device's command endpoint
/// * `ui_refresh_tx` - Channel for connection state changes
/// * `request_rx` - Jog commands and reconnect requests from the UI
#[embassy_executor::task]
pub async fn command_task(ws_url: String, ui_refresh_tx: UIRefreshQueueSender, request_rx: JogRequestQueueReceiver) {
    let mut channel = CommandChannel::connect(|generation| websocket::open(&ws_url, generation));
    let mut shown = channel.state();
    let _ = ui_refresh_tx.try_send(UIRefreshState::ConnectionChanged(shown));

    loop {
        match select(LINK_EVENTS.receive(), request_rx.receive()).await {
            Either::First(LinkEvent::Opened(generation)) => {
                if channel.on_open(generation) {
                    log::info!("Command channel #{} open", generation);
                }
            }
            Either::First(LinkEvent::Closed(generation, reason)) => {
                if channel.on_closed(generation) {
                    log::warn!("Command channel #{} closed: {}", generation, reason);
                } else {
                    log::debug!("Ignoring close of superseded channel #{}", generation);
                }
            }
            Either::Second(JogRequest::Dispatch(command)) => match channel.dispatch(command) {
                DispatchOutcome::Sent => log::debug!("Sent {}", command),
                DispatchOutcome::Dropped(state) => log::debug!("Dropped {} while {}", command, state),
            },
            Either::Second(JogRequest::Reconnect) => {
                if channel.reconnect(|generation| websocket::open(&ws_url, generation)) {
                    log::info!("Reconnecting command channel as #{}", channel.generation());
                } else {
                    log::debug!("Reconnect ignored while {}", channel.state());
                }
            }
        }

        if channel.state() != shown {
            shown = channel.state();
            let _ = ui_refresh_tx.try_send(UIRefreshState::ConnectionChanged(shown));
        }
    }
}

/// Whether the jog pad should offer a reconnect.
pub fn can_reconnect(state: ConnectionState) -> bool {
    state == ConnectionState::Closed
}
