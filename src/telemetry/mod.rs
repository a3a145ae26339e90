//! Live telemetry polling.
//!
//! - `types`: the telemetry snapshot and the source trait it is read through
//! - `poller`: request sequencing, stale-on-failure rendering and the tick cadence
//! - `task`: the executor task driving the poller against the device

pub mod poller;
pub mod task;
pub mod types;

pub use poller::{PollCadence, PollOutcome, PollTicket, TelemetryPoller};
pub use task::{PollerControl, telemetry_task};
pub use types::{LiveSource, TelemetrySample};
