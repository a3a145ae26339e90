//! # Application State Management
//!
//! `AppState` holds everything the dashboard shows and implements `eframe::App`.
//! Each frame it drains `ui_refresh_rx`, then renders the panels. Operator
//! actions never call the device directly: they become requests on the task
//! queues, and their results come back as `UIRefreshState` messages.

use chrono::{DateTime, Local};
use eframe::egui;
use serde::{Deserialize, Serialize};

use super::UIRefreshState;
use crate::command::{Command, ConnectionState, JogInput, JogRequest};
use crate::settings::{ConfigDocument, LoadState, SettingsForm, SettingsRequest};
use crate::telemetry::{PollerControl, TelemetrySample};

/// eframe storage key of the theme preference.
pub const THEME_STORAGE_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn visuals(self) -> egui::Visuals {
        match self {
            Theme::Dark => egui::Visuals::dark(),
            Theme::Light => egui::Visuals::light(),
        }
    }
}

/// Central dashboard state.
pub struct AppState {
    /// Optional alert message to display in a modal dialog.
    pub alert: Option<String>,
    pub ui_refresh_rx: crate::UIRefreshQueueReceiver,
    pub poller_control_tx: crate::PollerControlQueueSender,
    pub settings_request_tx: crate::SettingsRequestQueueSender,
    pub jog_request_tx: crate::JogRequestQueueSender,
    /// Shown in the window header.
    pub device_url: String,

    // Telemetry
    pub sample: Option<TelemetrySample>,
    pub last_update: Option<DateTime<Local>>,
    pub last_poll_error: Option<String>,
    pub consecutive_failures: u32,
    pub polling: bool,

    // Settings
    /// Last document known to be on the device; the form is overlaid onto it.
    pub settings_base: ConfigDocument,
    pub settings_form: SettingsForm,
    pub load_state: LoadState,
    pub load_error: Option<String>,
    /// Inline error under the submit button.
    pub submit_error: Option<String>,
    /// Document sent and not yet acknowledged.
    pub pending_submission: Option<ConfigDocument>,
    pub password_input: String,

    // Command channel
    pub connection: ConnectionState,

    pub theme: Theme,
    applied_theme: Option<Theme>,
}

impl AppState {
    /// Create the dashboard state, loading the theme preference if stored.
    ///
    /// # Parameters
    ///
    /// * `device_url` - Device address, for display
    /// * `rx` - Receiver for refresh messages from the tasks
    /// * `poller_control_tx` - Start/stop requests for the telemetry task
    /// * `settings_request_tx` - Submit and password requests for the settings task
    /// * `jog_request_tx` - Commands and reconnects for the command task
    /// * `storage` - Optional persistent storage
    pub fn new(
        device_url: String,
        rx: crate::UIRefreshQueueReceiver,
        poller_control_tx: crate::PollerControlQueueSender,
        settings_request_tx: crate::SettingsRequestQueueSender,
        jog_request_tx: crate::JogRequestQueueSender,
        storage: Option<&dyn eframe::Storage>,
    ) -> Self {
        let theme: Theme = storage.and_then(|s| eframe::get_value(s, THEME_STORAGE_KEY)).unwrap_or_default();
        let settings_base = ConfigDocument::default();

        Self {
            alert: None,
            ui_refresh_rx: rx,
            poller_control_tx,
            settings_request_tx,
            jog_request_tx,
            device_url,
            sample: None,
            last_update: None,
            last_poll_error: None,
            consecutive_failures: 0,
            polling: false,
            settings_form: SettingsForm::from_document(&settings_base),
            settings_base,
            load_state: LoadState::NotLoaded,
            load_error: None,
            submit_error: None,
            pending_submission: None,
            password_input: String::new(),
            connection: ConnectionState::Connecting,
            theme,
            applied_theme: None,
        }
    }

    /// Apply one message from the tasks.
    pub fn apply_refresh(&mut self, msg: UIRefreshState) {
        match msg {
            UIRefreshState::Alert(alert_msg) => {
                self.alert = Some(alert_msg);
            }
            UIRefreshState::TelemetryUpdated(sample, at) => {
                self.sample = Some(sample);
                self.last_update = Some(at);
                self.last_poll_error = None;
                self.consecutive_failures = 0;
            }
            UIRefreshState::TelemetryFailed(error, failures) => {
                // The previous sample stays on screen.
                self.last_poll_error = Some(error);
                self.consecutive_failures = failures;
            }
            UIRefreshState::PollingChanged(running) => {
                self.polling = running;
            }
            UIRefreshState::SettingsLoaded(document) => {
                // Edits made while the load was in flight are kept.
                if self.settings_form == SettingsForm::from_document(&self.settings_base) {
                    self.settings_form = SettingsForm::from_document(&document);
                }
                self.settings_base = document;
                self.load_state = LoadState::Loaded;
                self.load_error = None;
            }
            UIRefreshState::SettingsLoadFailed(error) => {
                self.load_error = Some(error);
            }
            UIRefreshState::SettingsSubmitted => {
                if let Some(document) = self.pending_submission.take() {
                    self.settings_base = document;
                }
            }
            UIRefreshState::SettingsSubmitFailed(error) => {
                self.pending_submission = None;
                self.alert = Some(format!("Saving settings failed: {}", error));
            }
            UIRefreshState::SettingsRejected(error) => {
                self.pending_submission = None;
                self.submit_error = Some(error);
            }
            UIRefreshState::ConnectionChanged(state) => {
                self.connection = state;
            }
        }
    }

    /// Time since the rendered sample was received.
    pub fn staleness(&self, now: DateTime<Local>) -> Option<chrono::Duration> {
        self.last_update.map(|at| now.signed_duration_since(at))
    }

    pub fn set_polling(&mut self, running: bool) {
        let control = if running { PollerControl::Start } else { PollerControl::Stop };
        if self.poller_control_tx.try_send(control).is_err() {
            log::warn!("Poller control queue full, {:?} dropped", control);
        }
    }

    /// Convert the form and hand it to the settings task.
    ///
    /// Validation errors are shown inline and nothing is sent.
    /// Whether the form may be pushed to the device.
    ///
    /// Before the device's document has been loaded the form only holds
    /// defaults, and pushing those would overwrite the device's settings.
    pub fn can_submit(&self) -> bool {
        self.load_state == LoadState::Loaded && self.pending_submission.is_none()
    }

    pub fn submit_settings(&mut self) {
        if self.load_state != LoadState::Loaded {
            self.submit_error = Some("Settings have not been loaded from the device".to_string());
            return;
        }
        match self.settings_form.to_document(&self.settings_base) {
            Ok(document) => {
                self.submit_error = None;
                match self.settings_request_tx.try_send(SettingsRequest::Submit(document.clone())) {
                    Ok(()) => self.pending_submission = Some(document),
                    Err(_) => self.alert = Some("A settings request is still in progress".to_string()),
                }
            }
            Err(e) => {
                self.submit_error = Some(e.to_string());
            }
        }
    }

    pub fn change_password(&mut self) {
        let password = std::mem::take(&mut self.password_input);
        if self.settings_request_tx.try_send(SettingsRequest::ChangePassword(password)).is_err() {
            self.alert = Some("A settings request is still in progress".to_string());
        }
    }

    /// Forward one discrete input to the command task.
    pub fn jog(&mut self, input: JogInput) {
        let command = Command::from(input);
        if self.jog_request_tx.try_send(JogRequest::Dispatch(command)).is_err() {
            log::debug!("Jog queue full, {} dropped", command);
        }
    }

    pub fn reconnect(&mut self) {
        let _ = self.jog_request_tx.try_send(JogRequest::Reconnect);
    }

    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
    }
}

impl eframe::App for AppState {
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, THEME_STORAGE_KEY, &self.theme);
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Repaint periodically so background updates are visible without input
        ctx.request_repaint_after(std::time::Duration::from_millis(100));

        if self.applied_theme != Some(self.theme) {
            ctx.set_visuals(self.theme.visuals());
            self.applied_theme = Some(self.theme);
        }

        while let Ok(msg) = self.ui_refresh_rx.try_receive() {
            self.apply_refresh(msg);
        }

        if let Some(alert) = self.alert.clone() {
            egui::Modal::new(egui::Id::new("alert")).show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.add_space(20.0);
                    ui.label(alert);
                    ui.add_space(20.0);

                    if ui.button("OK").clicked() {
                        self.alert = None;
                    }
                    ui.add_space(10.0);
                });
            });
        }

        super::top_panel::render(ctx, self);
        super::right_panel::render(ctx, self);
        super::jog_pad::render(ctx, self);
    }
}
