//! Modal windows: error notices and the all-off confirmation.

use hv_control::Coordinator;

use super::traced;

pub fn show_error(ctx: &egui::Context, coordinator: &mut Coordinator) {
    let Some(notice) = coordinator.display().current_error().cloned() else {
        return;
    };

    let mut dismissed = false;
    egui::Window::new(notice.title)
        .id(egui::Id::new("error_notice"))
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.label(notice.message.as_str());
            ui.add_space(8.0);
            if ui.button("OK").clicked() {
                dismissed = true;
            }
        });

    if dismissed {
        coordinator.dismiss_error();
    }
}

pub fn show_confirm_all_off(ctx: &egui::Context, coordinator: &mut Coordinator, open: &mut bool) {
    if !*open {
        return;
    }

    egui::Window::new("Confirm")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.label("Turn OFF all channels?");
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui.button("Yes").clicked() {
                    traced("All off", coordinator.all_channels_off());
                    *open = false;
                }
                if ui.button("No").clicked() {
                    *open = false;
                }
            });
        });
}
