//! Channel status table.

use egui::{Color32, RichText, Ui};
use hv_control::Coordinator;
use hv_core::{ChannelIndicator, OutputState};

use super::traced;

const HEADERS: [&str; 7] = [
    "Channel", "Status", "VSET (V)", "VMON (V)", "ISET (A)", "IMON (A)", "Control",
];

fn indicator_color(indicator: ChannelIndicator) -> Color32 {
    match indicator {
        ChannelIndicator::Overcurrent => Color32::RED,
        ChannelIndicator::Ramping => Color32::YELLOW,
        ChannelIndicator::On => Color32::LIGHT_GREEN,
        ChannelIndicator::Off => Color32::LIGHT_GRAY,
    }
}

pub fn show(ui: &mut Ui, coordinator: &mut Coordinator) {
    ui.heading("Channel Status");

    if coordinator.display().rows().is_empty() {
        ui.label("Connect to a device to see its channels.");
        return;
    }

    let connected = coordinator.is_connected();
    let mut switch: Option<(usize, OutputState)> = None;

    egui::Grid::new("channel_status")
        .striped(true)
        .spacing([12.0, 4.0])
        .show(ui, |ui| {
            for header in HEADERS {
                ui.strong(header);
            }
            ui.end_row();

            for row in coordinator.display().rows() {
                ui.label(format!("CH{}", row.channel));

                let indicator = row.indicator();
                ui.label(
                    RichText::new(format!("{:^8}", indicator.label()))
                        .monospace()
                        .color(Color32::BLACK)
                        .background_color(indicator_color(indicator)),
                );

                ui.monospace(row.vset_text());
                ui.monospace(row.vmon_text());
                ui.monospace(row.iset_text());
                ui.monospace(row.imon_text());

                ui.horizontal(|ui| {
                    if ui.add_enabled(connected, egui::Button::new("ON")).clicked() {
                        switch = Some((row.channel, OutputState::On));
                    }
                    if ui.add_enabled(connected, egui::Button::new("OFF")).clicked() {
                        switch = Some((row.channel, OutputState::Off));
                    }
                });
                ui.end_row();
            }
        });

    if let Some((channel, state)) = switch {
        traced("Output switch", coordinator.switch_output(channel, state));
    }
}
