//! Reconciliation between the device's configuration and the local copy.

use super::{ConfigDocument, ValidationError};
use crate::device::DeviceError;

/// Where the configuration document is read from and written to.
#[allow(async_fn_in_trait)]
pub trait SettingsStore {
    async fn fetch_settings(&self) -> Result<ConfigDocument, DeviceError>;
    async fn push_settings(&self, document: &ConfigDocument) -> Result<(), DeviceError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    NotLoaded,
    Loaded,
}

/// Result of a submission that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitStatus {
    Sent,
    Failed(DeviceError),
}

/// Owns the local copy of the configuration.
///
/// The device stays the source of truth: the local copy changes only on a
/// successful load or after the device accepted a submission.
#[derive(Debug)]
pub struct ConfigSync {
    local: ConfigDocument,
    state: LoadState,
}

impl Default for ConfigSync {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigSync {
    pub fn new() -> Self {
        Self {
            local: ConfigDocument::default(),
            state: LoadState::NotLoaded,
        }
    }

    pub fn local(&self) -> &ConfigDocument {
        &self.local
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    /// Read the device configuration into the local copy.
    ///
    /// On failure the local copy and the load state are left as they were.
    pub async fn load<S: SettingsStore>(&mut self, store: &S) -> Result<&ConfigDocument, DeviceError> {
        let document = store.fetch_settings().await?;
        self.local = document;
        self.state = LoadState::Loaded;
        Ok(&self.local)
    }

    /// Validate `edited` and write it to the device once.
    ///
    /// # Returns
    /// * `Err(ValidationError)` without any request when the document is invalid
    /// * `Ok(SubmitStatus::Failed)` when the request itself failed; nothing is retried
    /// * `Ok(SubmitStatus::Sent)` when the device accepted it
    pub async fn submit<S: SettingsStore>(&mut self, store: &S, edited: &ConfigDocument) -> Result<SubmitStatus, ValidationError> {
        edited.validate()?;
        match store.push_settings(edited).await {
            Ok(()) => {
                self.local = edited.clone();
                Ok(SubmitStatus::Sent)
            }
            Err(e) => Ok(SubmitStatus::Failed(e)),
        }
    }
}
