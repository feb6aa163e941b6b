//! CAEN HV Control Panel - egui desktop application
//!
//! Talks to the simulated supply; a real transport plugs in through
//! `hv_core::SessionFactory`.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use eframe::egui;
use hv_control::{ControlSettings, Coordinator};
use hv_driver_mock::MockHvFactory;
use hv_egui::{Cli, HvApp};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = ControlSettings::load_from(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    cli.apply(&mut settings);
    settings.validate()?;

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&settings.log_level))
        .context("invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("Starting CAEN HV Control Panel");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    let factory = MockHvFactory::from_config(&settings.simulator);
    tracing::info!(
        channels = settings.simulator.channels,
        mode = ?settings.simulator.mode,
        "Using simulated supply"
    );
    let coordinator = Coordinator::new(runtime.handle().clone(), Arc::new(factory), settings);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 760.0])
            .with_min_inner_size([800.0, 560.0])
            .with_title("CAEN Desktop HV Control"),
        ..Default::default()
    };

    eframe::run_native(
        "CAEN Desktop HV Control",
        options,
        Box::new(move |cc| Ok(Box::new(HvApp::new(cc, runtime, coordinator)))),
    )
    .map_err(|e| anyhow::anyhow!("window error: {}", e))
}
