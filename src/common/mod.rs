//! Pieces shared by the tasks and the UI.

pub mod app_config;

pub use app_config::DashboardConfig;
