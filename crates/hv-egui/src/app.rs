//! Main application window.

use std::time::Duration;

use eframe::egui;
use hv_control::Coordinator;
use tokio::runtime::Runtime;

use crate::forms::{ConnectionForm, ParameterForm, RampForm};
use crate::panels;

/// How often the window repaints to pick up background results.
const REPAINT_INTERVAL: Duration = Duration::from_millis(100);

/// Longest we wait for the session to close on exit.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

pub struct HvApp {
    /// Tokio runtime for device I/O; outlives the coordinator's tasks
    runtime: Runtime,
    coordinator: Coordinator,
    connection_form: ConnectionForm,
    parameter_form: ParameterForm,
    ramp_form: RampForm,
    confirm_all_off: bool,
    shut_down: bool,
}

impl HvApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, runtime: Runtime, coordinator: Coordinator) -> Self {
        let connection_form = ConnectionForm::from_target(&coordinator.settings().connection);
        Self {
            runtime,
            coordinator,
            connection_form,
            parameter_form: ParameterForm::default(),
            ramp_form: RampForm::default(),
            confirm_all_off: false,
            shut_down: false,
        }
    }

    /// Stop monitoring and close the session, waiting briefly for the device.
    fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        tracing::info!("Shutting down HV control panel");

        let coordinator = &mut self.coordinator;
        let closed = self
            .runtime
            .block_on(async { tokio::time::timeout(SHUTDOWN_TIMEOUT, coordinator.shutdown()).await });
        if closed.is_err() {
            tracing::warn!("Session did not close within {:?}", SHUTDOWN_TIMEOUT);
        }
    }
}

impl eframe::App for HvApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.coordinator.process_events();

        if ctx.input(|i| i.viewport().close_requested()) {
            self.shutdown();
        }

        egui::TopBottomPanel::top("connection").show(ctx, |ui| {
            ui.add_space(4.0);
            panels::connection::show(ui, &mut self.coordinator, &mut self.connection_form);
            ui.add_space(4.0);
        });

        egui::TopBottomPanel::bottom("log")
            .resizable(true)
            .default_height(160.0)
            .show(ctx, |ui| {
                panels::log::show(ui, &mut self.coordinator);
            });

        egui::SidePanel::right("parameters")
            .resizable(false)
            .default_width(320.0)
            .show(ctx, |ui| {
                panels::parameters::show(
                    ui,
                    &mut self.coordinator,
                    &mut self.parameter_form,
                    &mut self.ramp_form,
                );
                ui.separator();
                panels::presets::show(ui, &mut self.coordinator, &mut self.parameter_form);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            panels::channels::show(ui, &mut self.coordinator);
            ui.add_space(8.0);
            panels::controls::show(ui, &mut self.coordinator, &mut self.confirm_all_off);
        });

        panels::dialogs::show_confirm_all_off(ctx, &mut self.coordinator, &mut self.confirm_all_off);
        panels::dialogs::show_error(ctx, &mut self.coordinator);

        ctx.request_repaint_after(REPAINT_INTERVAL);
    }
}

impl Drop for HvApp {
    fn drop(&mut self) {
        self.shutdown();
    }
}
