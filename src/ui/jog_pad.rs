//! # Central Panel - Jog Pad
//!
//! Four directional buttons plus the arrow keys. Every click and every key
//! press event (including host key repeats) sends one command; nothing is
//! debounced or merged. Arrow keys are ignored while a text field has focus so
//! editing the settings form never moves the servos.

use eframe::egui;

use crate::command::{ArrowKey, ConnectionState, JogButton, JogInput, can_reconnect};
use crate::ui::AppState;

const BUTTON_SIZE: f32 = 64.0;

pub fn render(ctx: &egui::Context, state: &mut AppState) {
    if !ctx.wants_keyboard_input() {
        for key in pressed_arrows(ctx) {
            state.jog(JogInput::Key(key));
        }
    }

    egui::CentralPanel::default().show(ctx, |ui| {
        ui.heading("Pointing");
        ui.separator();

        ui.horizontal(|ui| {
            ui.label("Command channel:");
            let color = match state.connection {
                ConnectionState::Open => egui::Color32::GREEN,
                ConnectionState::Connecting => egui::Color32::YELLOW,
                ConnectionState::Closed => egui::Color32::RED,
            };
            ui.label(egui::RichText::new(state.connection.to_string()).strong().color(color));
            if can_reconnect(state.connection) && ui.button("Reconnect").clicked() {
                state.reconnect();
            }
        });
        ui.add_space(16.0);

        ui.vertical_centered(|ui| {
            if jog_button(ui, "Y+") {
                state.jog(JogInput::Button(JogButton::YPlus));
            }
            ui.horizontal(|ui| {
                let pad = (ui.available_width() - 3.0 * BUTTON_SIZE).max(0.0) / 2.0;
                ui.add_space(pad);
                if jog_button(ui, "X-") {
                    state.jog(JogInput::Button(JogButton::XMinus));
                }
                ui.add_space(BUTTON_SIZE);
                if jog_button(ui, "X+") {
                    state.jog(JogInput::Button(JogButton::XPlus));
                }
            });
            if jog_button(ui, "Y-") {
                state.jog(JogInput::Button(JogButton::YMinus));
            }
        });

        ui.add_space(16.0);
        ui.label(egui::RichText::new("Arrow keys jog as well while no text field is focused.").weak());
    });
}

fn jog_button(ui: &mut egui::Ui, label: &str) -> bool {
    ui.add_sized([BUTTON_SIZE, BUTTON_SIZE], egui::Button::new(egui::RichText::new(label).heading())).clicked()
}

/// Arrow key presses of this frame, in event order.
fn pressed_arrows(ctx: &egui::Context) -> Vec<ArrowKey> {
    ctx.input(|i| {
        i.events
            .iter()
            .filter_map(|event| match event {
                egui::Event::Key { key, pressed: true, .. } => arrow_key(*key),
                _ => None,
            })
            .collect()
    })
}

fn arrow_key(key: egui::Key) -> Option<ArrowKey> {
    match key {
        egui::Key::ArrowUp => Some(ArrowKey::Up),
        egui::Key::ArrowDown => Some(ArrowKey::Down),
        egui::Key::ArrowLeft => Some(ArrowKey::Left),
        egui::Key::ArrowRight => Some(ArrowKey::Right),
        _ => None,
    }
}
