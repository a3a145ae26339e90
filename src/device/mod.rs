//! Access to the monitoring device's HTTP API.
//!
//! The device exposes a handful of JSON endpoints next to the command
//! WebSocket. All calls here are blocking; async tasks reach them through
//! [`worker`], which runs each call on its own thread and hands the result
//! back to the executor.

pub mod client;
pub mod error;
pub mod worker;

pub use client::DeviceClient;
pub use error::DeviceError;
