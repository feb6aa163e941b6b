//! Command log.

use egui::{Color32, RichText, Ui};
use hv_control::{Coordinator, LogLevel};

pub fn show(ui: &mut Ui, coordinator: &mut Coordinator) {
    ui.horizontal(|ui| {
        ui.heading("Command Log");
        if ui.button("Clear Log").clicked() {
            coordinator.clear_log();
        }
    });

    egui::ScrollArea::vertical()
        .stick_to_bottom(true)
        .auto_shrink([false, false])
        .show(ui, |ui| {
            for entry in coordinator.display().log.entries() {
                let text = RichText::new(entry.to_string()).monospace();
                let text = match entry.level {
                    LogLevel::Info => text,
                    LogLevel::Warn => text.color(Color32::YELLOW),
                    LogLevel::Error => text.color(Color32::LIGHT_RED),
                };
                ui.label(text);
            }
        });
}
