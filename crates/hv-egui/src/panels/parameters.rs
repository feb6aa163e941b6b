//! Parameter entry and quick voltage ramp.

use egui::Ui;
use hv_control::Coordinator;
use hv_core::Parameter;

use super::traced;
use crate::forms::{ParameterForm, RampForm};

pub fn show(
    ui: &mut Ui,
    coordinator: &mut Coordinator,
    form: &mut ParameterForm,
    ramp: &mut RampForm,
) {
    ui.heading("Set Parameters");

    let channel_count = coordinator
        .session()
        .map(|s| s.channel_count())
        .unwrap_or(1);
    form.clamp_channel(channel_count);
    let connected = coordinator.is_connected();

    egui::Grid::new("set_parameters")
        .num_columns(3)
        .spacing([8.0, 6.0])
        .show(ui, |ui| {
            ui.label("Channel:");
            egui::ComboBox::from_id_salt("parameter_channel")
                .selected_text(form.channel.to_string())
                .width(60.0)
                .show_ui(ui, |ui| {
                    for ch in 0..channel_count {
                        ui.selectable_value(&mut form.channel, ch, ch.to_string());
                    }
                });
            ui.end_row();

            ui.label("Parameter:");
            egui::ComboBox::from_id_salt("parameter_name")
                .selected_text(form.parameter.name())
                .width(80.0)
                .show_ui(ui, |ui| {
                    for parameter in Parameter::SETTABLE {
                        ui.selectable_value(&mut form.parameter, parameter, parameter.name());
                    }
                });
            ui.end_row();

            ui.label("Value:");
            ui.add(egui::TextEdit::singleline(&mut form.value).desired_width(120.0));
            ui.label(form.unit());
            ui.end_row();
        });

    if ui
        .add_enabled(connected, egui::Button::new("Set Parameter"))
        .clicked()
    {
        traced(
            "Set parameter",
            coordinator.submit_set(form.channel, form.parameter, &form.value),
        );
    }

    ui.add_space(8.0);
    ui.group(|ui| {
        ui.strong("Quick Voltage Ramp");
        ui.horizontal(|ui| {
            ui.label("Voltage:");
            ui.add(egui::TextEdit::singleline(&mut ramp.target).desired_width(70.0));
            ui.label("V");
            ui.label("Speed:");
            ui.add(egui::TextEdit::singleline(&mut ramp.rate).desired_width(70.0));
            ui.label("V/s");
            if ui
                .add_enabled(connected, egui::Button::new("Ramp Voltage"))
                .clicked()
            {
                traced(
                    "Ramp",
                    coordinator.submit_ramp(form.channel, &ramp.target, &ramp.rate),
                );
            }
        });
    });
}
