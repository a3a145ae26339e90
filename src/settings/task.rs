//! Executor task owning the configuration sync.
//!
//! Loads once at startup, then serves operator requests one at a time, so a
//! load and a submit can never overlap.

use super::{ConfigSync, ConfigDocument, SubmitStatus, ValidationError};
use crate::device::{DeviceClient, worker};
use crate::ui::UIRefreshState;
use crate::{SettingsRequestQueueReceiver, UIRefreshQueueSender};

/// Operator actions handled by [`settings_task`].
#[derive(Debug, Clone)]
pub enum SettingsRequest {
    /// Write an edited document (already converted from the form).
    Submit(ConfigDocument),
    /// Replace the web UI password.
    ChangePassword(String),
}

#[embassy_executor::task]
pub async fn settings_task(client: DeviceClient, ui_refresh_tx: UIRefreshQueueSender, request_rx: SettingsRequestQueueReceiver) {
    let mut sync = ConfigSync::new();

    match sync.load(&client).await {
        Ok(document) => {
            log::info!("Loaded settings for site '{}' from {}", document.site_name, client.base_url());
            let _ = ui_refresh_tx.try_send(UIRefreshState::SettingsLoaded(document.clone()));
        }
        Err(e) => {
            log::warn!("Settings not loaded, form keeps defaults: {}", e);
            let _ = ui_refresh_tx.try_send(UIRefreshState::SettingsLoadFailed(e.to_string()));
        }
    }

    loop {
        match request_rx.receive().await {
            SettingsRequest::Submit(document) => {
                let refresh = match sync.submit(&client, &document).await {
                    Ok(SubmitStatus::Sent) => {
                        log::info!("Settings submitted");
                        UIRefreshState::SettingsSubmitted
                    }
                    Ok(SubmitStatus::Failed(e)) => {
                        log::warn!("Settings submit failed: {}", e);
                        UIRefreshState::SettingsSubmitFailed(e.to_string())
                    }
                    Err(e) => {
                        log::warn!("Settings rejected before sending: {}", e);
                        UIRefreshState::SettingsRejected(e.to_string())
                    }
                };
                let _ = ui_refresh_tx.try_send(refresh);
            }
            SettingsRequest::ChangePassword(password) => {
                let refresh = if password.is_empty() {
                    UIRefreshState::Alert(ValidationError::EmptyPassword.to_string())
                } else {
                    let device = client.clone();
                    match worker::offload("password-change", move || device.post_password(&password)).await {
                        Ok(()) => {
                            log::info!("Password changed");
                            UIRefreshState::Alert("Password changed".to_string())
                        }
                        Err(e) => {
                            log::warn!("Password change failed: {}", e);
                            UIRefreshState::Alert(format!("Password change failed: {}", e))
                        }
                    }
                };
                let _ = ui_refresh_tx.try_send(refresh);
            }
        }
    }
}
