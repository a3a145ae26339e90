// UI module for the chute monitor dashboard
//
// - `app_state`: dashboard state, refresh handling and the eframe update loop
// - `top_panel`: live telemetry table, polling controls and theme toggle
// - `right_panel`: settings form and password change
// - `jog_pad`: directional buttons, arrow keys and connection state

pub mod app_state;
pub mod jog_pad;
pub mod right_panel;
pub mod top_panel;

use chrono::{DateTime, Local};

use crate::command::ConnectionState;
use crate::settings::ConfigDocument;
use crate::telemetry::TelemetrySample;

pub use app_state::{AppState, Theme};

/// Messages from the executor tasks to the UI thread.
#[derive(Debug)]
pub enum UIRefreshState {
    Alert(String),
    TelemetryUpdated(TelemetrySample, DateTime<Local>),
    TelemetryFailed(String, u32), // error and consecutive failure count
    PollingChanged(bool),
    SettingsLoaded(ConfigDocument),
    SettingsLoadFailed(String),
    SettingsSubmitted,
    SettingsSubmitFailed(String),
    SettingsRejected(String),
    ConnectionChanged(ConnectionState),
}
