//! Device configuration: the document, its editing form and the sync logic.
//!
//! - `document`: `ConfigDocument` with default substitution and field preservation
//! - `form`: text-backed editing model and numeric coercion
//! - `validation`: errors reported to the operator before anything is sent
//! - `sync`: one-time load and explicit submit against a `SettingsStore`
//! - `task`: executor task serving settings and password requests from the UI

pub mod document;
pub mod form;
pub mod sync;
pub mod task;
pub mod validation;

pub use document::{ConfigDocument, ThresholdRange};
pub use form::SettingsForm;
pub use sync::{ConfigSync, LoadState, SettingsStore, SubmitStatus};
pub use task::{SettingsRequest, settings_task};
pub use validation::ValidationError;
