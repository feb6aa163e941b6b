//! Auto-refresh toggle, manual refresh, all-off and the monitoring indicator.

use egui::{Color32, RichText, Ui};
use hv_control::{Coordinator, MonitorStatus};

use super::traced;

pub fn show(ui: &mut Ui, coordinator: &mut Coordinator, confirm_all_off: &mut bool) {
    ui.horizontal(|ui| {
        let mut auto_refresh = coordinator.auto_refresh();
        let seconds = coordinator.settings().poll_interval().as_secs_f64();
        if ui
            .checkbox(&mut auto_refresh, format!("Auto Refresh ({}s)", seconds))
            .changed()
        {
            coordinator.set_auto_refresh(auto_refresh);
        }

        if ui.button("Manual Refresh").clicked() {
            traced("Manual refresh", coordinator.manual_refresh());
        }

        if ui.button("All Channels OFF").clicked() {
            if coordinator.is_connected() {
                *confirm_all_off = true;
            } else {
                // Reports "Not connected to device"
                traced("All off", coordinator.all_channels_off());
            }
        }

        ui.separator();
        ui.label("Monitoring:");
        let status = coordinator.display().monitor;
        let color = match status {
            MonitorStatus::Running => Color32::GREEN,
            MonitorStatus::Stopped => Color32::RED,
        };
        ui.label(RichText::new(status.label()).color(color));

        if let Some(at) = coordinator.display().last_refresh() {
            ui.weak(format!("last refresh {}", at.format("%H:%M:%S")));
        }
    });
}
