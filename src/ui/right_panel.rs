//! # Right Panel - Device Settings
//!
//! Edits the `SettingsForm` in place. Nothing here talks to the device: the
//! submit and password buttons only queue requests through `AppState`.

use eframe::egui;

use crate::settings::LoadState;
use crate::ui::AppState;

pub fn render(ctx: &egui::Context, state: &mut AppState) {
    egui::SidePanel::right("settings_right").exact_width(380.0).show(ctx, |ui| {
        ui.heading("Settings");
        ui.separator();

        match (state.load_state, &state.load_error) {
            (LoadState::Loaded, _) => {
                ui.label(egui::RichText::new("Loaded from device").color(egui::Color32::GREEN));
            }
            (LoadState::NotLoaded, Some(error)) => {
                ui.label(egui::RichText::new(format!("Not loaded: {}", error)).color(egui::Color32::RED));
            }
            (LoadState::NotLoaded, None) => {
                ui.label("Loading...");
            }
        }

        egui::ScrollArea::vertical().show(ui, |ui| {
            render_form(ui, state);
            ui.add_space(8.0);

            ui.add_enabled_ui(state.can_submit(), |ui| {
                if ui.button("Save settings").clicked() {
                    state.submit_settings();
                }
            });
            if let Some(error) = &state.submit_error {
                ui.label(egui::RichText::new(error).color(egui::Color32::RED));
            }

            ui.add_space(12.0);
            ui.separator();
            render_password(ui, state);
        });
    });
}

fn text_row(ui: &mut egui::Ui, label: &str, value: &mut String) {
    ui.label(label);
    ui.text_edit_singleline(value);
    ui.end_row();
}

fn render_form(ui: &mut egui::Ui, state: &mut AppState) {
    let form = &mut state.settings_form;

    egui::CollapsingHeader::new("General").default_open(true).show(ui, |ui| {
        egui::Grid::new("general_grid").num_columns(2).show(ui, |ui| {
            text_row(ui, "Site name", &mut form.site_name);
            text_row(ui, "UI user", &mut form.ui_user);
            ui.label("Debug");
            ui.checkbox(&mut form.debug_enable, "enabled");
            ui.end_row();
        });
    });

    egui::CollapsingHeader::new("Wi-Fi").default_open(true).show(ui, |ui| {
        egui::Grid::new("wifi_grid").num_columns(2).show(ui, |ui| {
            text_row(ui, "SSID", &mut form.wifi_ssid);
            ui.label("Password");
            ui.add(egui::TextEdit::singleline(&mut form.wifi_password).password(true));
            ui.end_row();
        });
    });

    egui::CollapsingHeader::new("MQTT").default_open(true).show(ui, |ui| {
        egui::Grid::new("mqtt_grid").num_columns(2).show(ui, |ui| {
            text_row(ui, "Host", &mut form.mqtt_host);
            text_row(ui, "Port", &mut form.mqtt_port);
            text_row(ui, "User", &mut form.mqtt_user);
            ui.label("Password");
            ui.add(egui::TextEdit::singleline(&mut form.mqtt_pass).password(true));
            ui.end_row();
            text_row(ui, "QoS (0-2)", &mut form.mqtt_qos);
        });
    });

    egui::CollapsingHeader::new("Thresholds").default_open(true).show(ui, |ui| {
        if form.thresholds.is_empty() {
            ui.label("No threshold groups on the device");
            return;
        }
        egui::Grid::new("threshold_grid").num_columns(3).striped(true).show(ui, |ui| {
            ui.strong("Metric");
            ui.strong("Min");
            ui.strong("Max");
            ui.end_row();
            for row in form.thresholds.iter_mut() {
                ui.label(&row.metric);
                ui.add(egui::TextEdit::singleline(&mut row.min).desired_width(80.0));
                ui.add(egui::TextEdit::singleline(&mut row.max).desired_width(80.0));
                ui.end_row();
            }
        });
    });

    egui::CollapsingHeader::new("Clog detection").default_open(true).show(ui, |ui| {
        egui::Grid::new("clog_grid").num_columns(2).show(ui, |ui| {
            text_row(ui, "Minimum", &mut form.clog_min);
            text_row(ui, "Hold (s)", &mut form.clog_hold);
        });
    });
}

fn render_password(ui: &mut egui::Ui, state: &mut AppState) {
    ui.label(egui::RichText::new("Web UI password").strong());
    ui.horizontal(|ui| {
        ui.add(egui::TextEdit::singleline(&mut state.password_input).password(true).desired_width(200.0));
        if ui.button("Change").clicked() {
            state.change_password();
        }
    });
}
