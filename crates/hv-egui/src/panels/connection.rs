//! Connection bar and device information.

use egui::{Color32, RichText, Ui};
use hv_control::{ConnectionStatus, Coordinator};
use hv_core::ConnectionKind;

use crate::forms::ConnectionForm;

pub fn show(ui: &mut Ui, coordinator: &mut Coordinator, form: &mut ConnectionForm) {
    let busy = coordinator.is_connected() || coordinator.is_connecting();

    ui.horizontal(|ui| {
        ui.add_enabled_ui(!busy, |ui| {
            ui.label("Port/IP:");
            ui.add(egui::TextEdit::singleline(&mut form.address).desired_width(140.0));

            ui.label("Connection Type:");
            let mut kind = form.kind;
            egui::ComboBox::from_id_salt("connection_kind")
                .selected_text(kind.label())
                .width(90.0)
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut kind, ConnectionKind::Usb, "USB");
                    ui.selectable_value(&mut kind, ConnectionKind::Ethernet, "Ethernet");
                });
            form.set_kind(kind);

            ui.label("Device ID:");
            ui.add(egui::TextEdit::singleline(&mut form.device_id).desired_width(40.0));
        });

        let button = if busy { "Disconnect" } else { "Connect" };
        if ui.button(button).clicked() {
            if busy {
                coordinator.disconnect();
            } else {
                match form.target() {
                    Ok(target) => coordinator.connect(target),
                    Err(message) => coordinator.reject_connect(message),
                }
            }
        }

        let status = coordinator.display().connection;
        let color = match status {
            ConnectionStatus::Connected => Color32::GREEN,
            ConnectionStatus::Connecting => Color32::YELLOW,
            ConnectionStatus::Disconnected => Color32::RED,
        };
        ui.label(RichText::new(status.label()).color(color));
    });

    ui.separator();
    ui.horizontal(|ui| {
        ui.strong("Device Information:");
        ui.label(coordinator.display().device_info.as_str());
    });
}
