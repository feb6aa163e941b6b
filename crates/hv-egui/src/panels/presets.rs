//! Voltage and current shortcut buttons.

use egui::Ui;
use hv_control::Coordinator;
use hv_core::{Parameter, CURRENT_PRESETS_UA, VOLTAGE_PRESETS};

use super::traced;
use crate::forms::ParameterForm;

pub fn show(ui: &mut Ui, coordinator: &mut Coordinator, form: &mut ParameterForm) {
    ui.heading("Quick Presets");

    ui.horizontal(|ui| {
        ui.label("Voltage:");
        for volts in VOLTAGE_PRESETS {
            if ui.button(format!("{}V", volts)).clicked() {
                form.preset(Parameter::Vset, volts);
                traced(
                    "Voltage preset",
                    coordinator.apply_voltage_preset(form.channel, volts),
                );
            }
        }
    });

    ui.horizontal(|ui| {
        ui.label("Current:");
        for microamps in CURRENT_PRESETS_UA {
            if ui.button(format!("{} uA", microamps)).clicked() {
                form.preset(Parameter::Iset, microamps * 1e-6);
                traced(
                    "Current preset",
                    coordinator.apply_current_preset(form.channel, microamps),
                );
            }
        }
    });
}
