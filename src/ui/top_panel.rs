//! # Top Panel - Live Telemetry
//!
//! Column 1 holds the telemetry table, column 2 the update status, column 3
//! the polling and theme controls.

use chrono::Local;
use eframe::egui;

use crate::ui::{AppState, Theme};

/// Seconds without a fresh sample before the update time is highlighted.
const STALE_AFTER_SECS: i64 = 15;

pub fn render(ctx: &egui::Context, state: &mut AppState) {
    egui::TopBottomPanel::top("top_telemetry").exact_height(170.0).show(ctx, |ui| {
        ui.columns(3, |cols| {
            cols[0].vertical(|ui| {
                ui.heading("Live Telemetry");
                ui.separator();
                render_table(ui, state);
            });

            cols[1].vertical(|ui| {
                render_status(ui, state);
            });

            cols[2].vertical(|ui| {
                render_controls(ui, state);
            });
        });
    });
}

fn render_table(ui: &mut egui::Ui, state: &AppState) {
    egui::Grid::new("telemetry_grid").num_columns(4).striped(true).show(ui, |ui| {
        let rows = state.sample.unwrap_or_default().rows();
        // Two fields per line keeps the table inside the fixed panel height.
        for pair in rows.chunks(2) {
            for (label, value) in pair {
                let value = if state.sample.is_some() { format!("{:.1}", value) } else { "-".to_string() };
                ui.label(format!("{}:", label));
                ui.label(egui::RichText::new(value).monospace().strong());
            }
            ui.end_row();
        }
    });
}

fn render_status(ui: &mut egui::Ui, state: &AppState) {
    ui.heading("Status");
    ui.separator();

    ui.horizontal(|ui| {
        ui.label("Device:");
        ui.label(egui::RichText::new(&state.device_url).strong());
    });

    ui.horizontal(|ui| {
        ui.label("Last update:");
        match (state.last_update, state.staleness(Local::now())) {
            (Some(at), Some(age)) => {
                let text = egui::RichText::new(at.format("%H:%M:%S").to_string()).monospace().strong();
                if age.num_seconds() >= STALE_AFTER_SECS {
                    ui.label(text.color(egui::Color32::YELLOW));
                    ui.label(format!("({} s ago)", age.num_seconds()));
                } else {
                    ui.label(text);
                }
            }
            _ => {
                ui.label(egui::RichText::new("--:--:--").monospace());
            }
        }
    });

    if let Some(error) = &state.last_poll_error {
        ui.label(
            egui::RichText::new(format!("Poll failed ({}x): {}", state.consecutive_failures, error)).color(egui::Color32::RED),
        );
    }
}

fn render_controls(ui: &mut egui::Ui, state: &mut AppState) {
    ui.heading("Controls");
    ui.separator();

    ui.horizontal(|ui| {
        ui.label("Polling:");
        if state.polling {
            ui.label(egui::RichText::new("running").strong().color(egui::Color32::GREEN));
            if ui.button("Pause").clicked() {
                state.set_polling(false);
            }
        } else {
            ui.label(egui::RichText::new("paused").strong());
            if ui.button("Resume").clicked() {
                state.set_polling(true);
            }
        }
    });

    ui.horizontal(|ui| {
        ui.label("Theme:");
        let label = match state.theme {
            Theme::Dark => "Switch to light",
            Theme::Light => "Switch to dark",
        };
        if ui.button(label).clicked() {
            state.toggle_theme();
        }
    });
}
