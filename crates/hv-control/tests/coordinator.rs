//! Coordinator behaviour against the simulated supply, on a paused clock.

use std::sync::Arc;
use std::time::Duration;

use hv_control::{
    Coordinator, ConnectionStatus, ControlSettings, LogLevel, MonitorState, MonitorStatus,
};
use hv_core::{ChannelIndicator, ConnectionTarget, HvError, OutputState, Parameter};
use hv_driver_mock::{ErrorConfig, ErrorScenario, MockHvFactory, MockHvSupply};
use tokio::runtime::Handle;

fn supply_with_presets() -> hv_driver_mock::MockHvSupplyBuilder {
    let mut builder = MockHvSupply::builder().channels(4);
    for ch in 0..4 {
        builder = builder.preset(ch, Parameter::Vset, 100.0 * (ch as f64 + 1.0));
    }
    builder
}

fn coordinator(supply: &MockHvSupply, auto_refresh: bool) -> Coordinator {
    let settings = ControlSettings {
        auto_refresh,
        ..Default::default()
    };
    Coordinator::new(
        Handle::current(),
        Arc::new(MockHvFactory::new(supply.clone())),
        settings,
    )
}

/// Drain events until `done` holds, letting paused time run forward.
async fn wait_until(coordinator: &mut Coordinator, done: impl Fn(&Coordinator) -> bool) {
    for _ in 0..2000 {
        coordinator.process_events();
        if done(coordinator) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached: {:?}", coordinator);
}

/// Drain events while `duration` of paused time passes.
async fn run_for(coordinator: &mut Coordinator, duration: Duration) {
    let steps = duration.as_millis() / 10;
    for _ in 0..steps {
        tokio::time::sleep(Duration::from_millis(10)).await;
        coordinator.process_events();
    }
}

async fn connected(supply: &MockHvSupply, auto_refresh: bool) -> Coordinator {
    let mut coordinator = coordinator(supply, auto_refresh);
    coordinator.connect(ConnectionTarget::default());
    wait_until(&mut coordinator, |c| c.is_connected()).await;
    coordinator
}

fn refreshes_logged(coordinator: &Coordinator) -> usize {
    coordinator
        .display()
        .log
        .entries()
        .filter(|e| e.message == "Refresh completed")
        .count()
}

#[tokio::test(start_paused = true)]
async fn test_connect_reports_device() {
    let supply = supply_with_presets().model("DT1471ET").build();
    let coordinator = connected(&supply, false).await;

    let display = coordinator.display();
    assert_eq!(display.connection, ConnectionStatus::Connected);
    assert_eq!(display.device_info, "DT1471ET (4 channels)");
    assert_eq!(display.rows().len(), 4);
    assert!(display.log.contains("Connecting to /dev/ttyACM0 (Device ID: 0) using USB"));
    assert!(display.log.contains("Connected successfully! Device: DT1471ET"));
    assert_eq!(display.monitor, MonitorStatus::Stopped);
}

#[tokio::test(start_paused = true)]
async fn test_refresh_yields_one_reading_per_channel() {
    let supply = supply_with_presets().build();
    let mut coordinator = connected(&supply, false).await;

    coordinator.manual_refresh().unwrap();
    wait_until(&mut coordinator, |c| refreshes_logged(c) == 1).await;

    assert_eq!(supply.journal().count("status"), 4);
    for ch in 0..4 {
        let row = coordinator.display().row(ch).unwrap();
        let reading = row.reading.unwrap();
        assert_eq!(reading.channel, ch);
        assert_eq!(reading.vset, 100.0 * (ch as f64 + 1.0));
        assert!(row.updated.is_some());
    }
    assert!(coordinator.display().log.contains("Refreshing channel status..."));

    let updates: Vec<String> = coordinator
        .display()
        .log
        .messages()
        .into_iter()
        .filter(|m| m.starts_with("Updating CH"))
        .collect();
    assert_eq!(updates.len(), 4);
    assert_eq!(updates[2], "Updating CH2: VSET=300.0, VMON=0.0, Status=OFF");
}

#[tokio::test(start_paused = true)]
async fn test_readings_are_applied_as_each_channel_completes() {
    let supply = supply_with_presets()
        .latency("get", Duration::from_millis(100))
        .build();
    let mut coordinator = connected(&supply, false).await;

    coordinator.manual_refresh().unwrap();
    wait_until(&mut coordinator, |c| {
        c.display().row(0).is_some_and(|row| row.updated.is_some())
    })
    .await;

    let display = coordinator.display();
    assert!(display.row(3).unwrap().updated.is_none());
    assert_eq!(refreshes_logged(&coordinator), 0);
    assert!(display.log.contains("Updating CH0"));
    assert!(!display.log.contains("Updating CH3"));

    wait_until(&mut coordinator, |c| refreshes_logged(c) == 1).await;
    assert!(coordinator.display().row(3).unwrap().updated.is_some());
}

#[tokio::test]
async fn test_invalid_connection_parameters_are_reported() {
    let supply = supply_with_presets().build();
    let mut coordinator = coordinator(&supply, true);

    coordinator.reject_connect("Invalid device ID: 'abc'");

    let display = coordinator.display();
    let notice = display.current_error().unwrap();
    assert_eq!(notice.title, "Connection Error");
    assert!(notice.message.contains("Invalid device ID: 'abc'"));

    let entry = display.log.entries().last().unwrap();
    assert_eq!(entry.level, LogLevel::Error);
    assert_eq!(entry.message, "Connection failed: Invalid device ID: 'abc'");

    assert_eq!(display.connection, ConnectionStatus::Disconnected);
    assert!(!coordinator.is_connecting());
    assert_eq!(supply.journal().count("connect"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_failing_channel_does_not_affect_others() {
    let supply = supply_with_presets()
        .error_config(ErrorConfig::scenario(ErrorScenario::ChannelFault {
            channel: 1,
        }))
        .build();
    let mut coordinator = connected(&supply, false).await;

    coordinator.manual_refresh().unwrap();
    wait_until(&mut coordinator, |c| refreshes_logged(c) == 1).await;

    let display = coordinator.display();
    let failed = display.row(1).unwrap().reading.unwrap();
    assert_eq!(failed.vset, 0.0);
    assert_eq!(failed.output, OutputState::Off);
    assert_eq!(display.row(1).unwrap().indicator(), ChannelIndicator::Off);

    for ch in [0, 2, 3] {
        let reading = display.row(ch).unwrap().reading.unwrap();
        assert_eq!(reading.vset, 100.0 * (ch as f64 + 1.0));
    }
    assert!(display.log.contains("Error reading CH1"));
    // A failed read is logged, not shown as a modal
    assert!(display.current_error().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_monitor_waits_interval_after_each_pass() {
    let supply = supply_with_presets()
        .latency("get", Duration::from_millis(100))
        .build();
    let mut coordinator = connected(&supply, true).await;

    wait_until(&mut coordinator, |c| refreshes_logged(c) >= 2).await;
    assert_eq!(coordinator.display().monitor, MonitorStatus::Running);

    let calls = supply.journal().calls();
    let first_pass_end = calls
        .iter()
        .filter(|c| c.operation == "status" && c.channel == Some(3))
        .map(|c| c.finished)
        .next()
        .unwrap();
    let second_pass_start = calls
        .iter()
        .filter(|c| c.operation == "get" && c.started > first_pass_end)
        .map(|c| c.started)
        .next()
        .unwrap();

    let gap = second_pass_start - first_pass_end;
    assert!(gap >= Duration::from_millis(2000), "gap {:?}", gap);
    assert!(gap < Duration::from_millis(2050), "gap {:?}", gap);
}

#[tokio::test(start_paused = true)]
async fn test_disabling_monitor_stops_ticks() {
    let supply = supply_with_presets().build();
    let mut coordinator = connected(&supply, true).await;
    wait_until(&mut coordinator, |c| {
        c.display().monitor == MonitorStatus::Running && refreshes_logged(c) >= 1
    })
    .await;

    coordinator.set_auto_refresh(false);
    assert_eq!(coordinator.display().monitor, MonitorStatus::Stopped);
    wait_until(&mut coordinator, |c| c.monitor_state() == &MonitorState::Idle).await;

    let status_reads = supply.journal().count("status");
    run_for(&mut coordinator, Duration::from_secs(10)).await;
    assert_eq!(supply.journal().count("status"), status_reads);
    assert_eq!(coordinator.display().monitor, MonitorStatus::Stopped);
    assert!(coordinator.display().log.contains("Auto refresh disabled"));
}

#[tokio::test(start_paused = true)]
async fn test_enabling_monitor_without_session_stays_stopped() {
    let supply = supply_with_presets().build();
    let mut coordinator = coordinator(&supply, false);

    coordinator.set_auto_refresh(true);
    run_for(&mut coordinator, Duration::from_secs(5)).await;

    assert_eq!(coordinator.display().monitor, MonitorStatus::Stopped);
    assert_eq!(coordinator.monitor_state(), &MonitorState::Idle);
    assert!(supply.journal().calls().is_empty());

    // Polling starts once a session exists
    coordinator.connect(ConnectionTarget::default());
    wait_until(&mut coordinator, |c| c.display().monitor == MonitorStatus::Running).await;
}

#[tokio::test(start_paused = true)]
async fn test_iset_round_trip() {
    let supply = supply_with_presets().build();
    let mut coordinator = connected(&supply, false).await;

    coordinator.submit_set(0, Parameter::Iset, "5e-6").unwrap();
    wait_until(&mut coordinator, |c| refreshes_logged(c) == 1).await;

    let raw = supply.peek(Parameter::Iset, 0).unwrap();
    assert!((raw - 5.0).abs() < 1e-9, "device holds {} uA", raw);
    let row = coordinator.display().row(0).unwrap();
    assert!((row.reading.unwrap().iset - 5e-6).abs() < 1e-15);
    assert_eq!(row.iset_text(), "5.00e-6");
    assert!(coordinator.display().log.contains("Parameter set successfully"));
}

#[tokio::test(start_paused = true)]
async fn test_vset_validation_happens_before_device() {
    let supply = supply_with_presets().build();
    let mut coordinator = connected(&supply, false).await;

    for bad in ["-1", "5001"] {
        let err = coordinator.submit_set(0, Parameter::Vset, bad).unwrap_err();
        assert!(matches!(err, HvError::Validation(_)));
    }
    run_for(&mut coordinator, Duration::from_millis(500)).await;
    assert_eq!(supply.journal().count("set"), 0);
    assert_eq!(
        coordinator.display().current_error().unwrap().message,
        "VSET must be between 0 and 5000V"
    );

    coordinator.submit_set(0, Parameter::Vset, "0").unwrap();
    coordinator.submit_set(1, Parameter::Vset, "5000").unwrap();
    run_for(&mut coordinator, Duration::from_millis(500)).await;
    assert_eq!(supply.journal().count("set"), 2);
    assert_eq!(supply.peek(Parameter::Vset, 1), Some(5000.0));
}

#[tokio::test(start_paused = true)]
async fn test_unknown_channel_rejected() {
    let supply = supply_with_presets().build();
    let mut coordinator = connected(&supply, false).await;

    let err = coordinator
        .switch_output(7, OutputState::On)
        .unwrap_err();
    assert!(matches!(err, HvError::Validation(_)));
    run_for(&mut coordinator, Duration::from_millis(200)).await;
    assert_eq!(supply.journal().count("output"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_post_command_refresh_follows_completion() {
    let supply = supply_with_presets()
        .latency("set", Duration::from_millis(500))
        .build();
    let mut coordinator = connected(&supply, false).await;

    coordinator.submit_set(2, Parameter::Vset, "750").unwrap();
    wait_until(&mut coordinator, |c| refreshes_logged(c) == 1).await;

    let set = supply.journal().calls_of("set").remove(0);
    assert!(set.succeeded);
    let first_read = supply
        .journal()
        .calls_of("get")
        .into_iter()
        .find(|c| c.started >= set.started)
        .unwrap();
    assert!(first_read.started >= set.finished + Duration::from_millis(100));
    assert_eq!(
        coordinator.display().row(2).unwrap().reading.unwrap().vset,
        750.0
    );
}

#[tokio::test(start_paused = true)]
async fn test_failed_command_notifies_without_refresh() {
    let supply = supply_with_presets()
        .error_config(ErrorConfig::scenario(ErrorScenario::Timeout { operation: "ramp" }))
        .build();
    let mut coordinator = connected(&supply, false).await;

    coordinator.submit_ramp(1, "1500", "25").unwrap();
    wait_until(&mut coordinator, |c| c.display().current_error().is_some()).await;
    run_for(&mut coordinator, Duration::from_millis(500)).await;

    let display = coordinator.display();
    assert!(display.log.contains("Ramping CH1 to 1500V at 25V/s"));
    assert!(display.log.contains("Ramp error on CH1"));
    assert!(display.current_error().unwrap().message.contains("timed out"));
    assert_eq!(supply.journal().count("get"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_ramp_and_presets_reach_device() {
    let supply = supply_with_presets().build();
    let mut coordinator = connected(&supply, false).await;

    coordinator.submit_ramp(2, "1500", "25").unwrap();
    coordinator.apply_voltage_preset(0, 500.0).unwrap();
    coordinator.apply_current_preset(0, 10.0).unwrap();
    wait_until(&mut coordinator, |c| refreshes_logged(c) == 3).await;

    assert_eq!(supply.peek(Parameter::Vset, 2), Some(1500.0));
    assert_eq!(supply.peek(Parameter::Rup, 2), Some(25.0));
    assert_eq!(supply.peek(Parameter::Vset, 0), Some(500.0));
    let raw = supply.peek(Parameter::Iset, 0).unwrap();
    assert!((raw - 10.0).abs() < 1e-9);
    assert!(coordinator.display().log.contains("Voltage ramp completed"));
}

#[tokio::test(start_paused = true)]
async fn test_all_channels_off_issues_one_command_per_channel() {
    let supply = supply_with_presets()
        .error_config(ErrorConfig::scenario(ErrorScenario::ChannelFault {
            channel: 1,
        }))
        .build();
    let mut coordinator = connected(&supply, false).await;

    assert_eq!(coordinator.all_channels_off().unwrap(), 4);
    wait_until(&mut coordinator, |c| refreshes_logged(c) == 1).await;

    let offs = supply.journal().calls_of("output");
    let channels: Vec<_> = offs.iter().map(|c| c.channel.unwrap()).collect();
    assert_eq!(channels, vec![0, 1, 2, 3]);
    assert!(offs.iter().all(|c| c.output == Some(OutputState::Off)));
    assert!(!offs[1].succeeded);

    let display = coordinator.display();
    assert!(display.log.contains("Turn OFF CH0"));
    assert!(display.log.contains("Error turning off CH1"));
    assert!(display.log.contains("Turn OFF CH3"));
    assert_eq!(display.pending_errors(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_commands_without_session_report_not_connected() {
    let supply = supply_with_presets().build();
    let mut coordinator = coordinator(&supply, false);

    assert!(matches!(
        coordinator.manual_refresh(),
        Err(HvError::NotConnected)
    ));
    assert!(matches!(
        coordinator.all_channels_off(),
        Err(HvError::NotConnected)
    ));
    assert!(matches!(
        coordinator.submit_set(0, Parameter::Vset, "10"),
        Err(HvError::NotConnected)
    ));
    assert_eq!(
        coordinator.display().current_error().unwrap().message,
        "Not connected to device"
    );
    assert!(supply.journal().calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_connection_failure() {
    let supply = supply_with_presets()
        .error_config(ErrorConfig::scenario(ErrorScenario::Timeout {
            operation: "connect",
        }))
        .build();
    let mut coordinator = coordinator(&supply, true);

    coordinator.connect(ConnectionTarget::default());
    wait_until(&mut coordinator, |c| !c.is_connecting()).await;

    let display = coordinator.display();
    assert_eq!(display.connection, ConnectionStatus::Disconnected);
    assert_eq!(display.current_error().unwrap().title, "Connection Error");
    assert!(display.log.contains("failed"));
    assert_eq!(display.monitor, MonitorStatus::Stopped);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_cancels_in_flight_refresh() {
    let supply = supply_with_presets()
        .latency("get", Duration::from_secs(1))
        .build();
    let mut coordinator = connected(&supply, false).await;

    coordinator.manual_refresh().unwrap();
    run_for(&mut coordinator, Duration::from_millis(1500)).await;
    coordinator.disconnect();
    run_for(&mut coordinator, Duration::from_secs(30)).await;

    let display = coordinator.display();
    assert_eq!(display.connection, ConnectionStatus::Disconnected);
    assert_eq!(display.device_info, "Not connected");
    assert!(display.rows().iter().all(|r| r.reading.is_none()));
    assert_eq!(refreshes_logged(&coordinator), 0);
    assert!(display.log.contains("Disconnected"));
    assert_eq!(supply.journal().count("close"), 1);
    // The cancelled read never completed
    assert!(supply.journal().count("get") < 16);
}

#[tokio::test(start_paused = true)]
async fn test_abandoned_connect_is_closed_and_ignored() {
    let supply = supply_with_presets()
        .latency("connect", Duration::from_secs(1))
        .build();
    let mut coordinator = coordinator(&supply, true);

    coordinator.connect(ConnectionTarget::default());
    run_for(&mut coordinator, Duration::from_millis(200)).await;
    coordinator.disconnect();
    run_for(&mut coordinator, Duration::from_secs(3)).await;

    assert!(!coordinator.is_connected());
    assert_eq!(
        coordinator.display().connection,
        ConnectionStatus::Disconnected
    );
    assert_eq!(supply.journal().count("close"), 1);
    assert_eq!(supply.journal().count("status"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_overlapping_refreshes_do_not_interleave() {
    let supply = supply_with_presets()
        .latency("get", Duration::from_millis(50))
        .build();
    let mut coordinator = connected(&supply, false).await;

    coordinator.manual_refresh().unwrap();
    coordinator.manual_refresh().unwrap();
    wait_until(&mut coordinator, |c| refreshes_logged(c) == 2).await;

    let status_channels: Vec<_> = supply
        .journal()
        .calls_of("status")
        .iter()
        .map(|c| c.channel.unwrap())
        .collect();
    assert_eq!(status_channels, vec![0, 1, 2, 3, 0, 1, 2, 3]);

    let get_channels: Vec<_> = supply
        .journal()
        .calls_of("get")
        .iter()
        .map(|c| c.channel.unwrap())
        .collect();
    let expected: Vec<usize> = (0..2)
        .flat_map(|_| (0..4).flat_map(|ch| std::iter::repeat(ch).take(4)))
        .collect();
    assert_eq!(get_channels, expected);
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_after_disconnect() {
    let supply = supply_with_presets().build();
    let mut coordinator = connected(&supply, false).await;
    let first_epoch = coordinator.session().unwrap().epoch();

    coordinator.toggle_connection(ConnectionTarget::default());
    assert!(!coordinator.is_connected());
    coordinator.toggle_connection(ConnectionTarget::default());
    wait_until(&mut coordinator, |c| c.is_connected()).await;

    assert!(coordinator.session().unwrap().epoch() > first_epoch);
    assert_eq!(coordinator.display().rows().len(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_closes_session() {
    let supply = supply_with_presets().build();
    let mut coordinator = connected(&supply, true).await;

    coordinator.shutdown().await;
    assert!(!coordinator.is_connected());
    assert_eq!(supply.journal().count("close"), 1);
}
