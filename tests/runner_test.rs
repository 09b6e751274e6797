//! Stage runner against a fake toolchain

mod common;

use auto_sweep::design::{ClockPeriod, DesignVariant, OperatingPoint, Precision};
use auto_sweep::pipeline::{
    StageRunner, StatusLedger, SweepCancel, ToolKind, WorkItem, WorkStatus,
};
use auto_sweep::Error;
use common::{sweep_config, FakeBehaviour, FakeToolchain};
use std::fs;

fn loom() -> DesignVariant {
    DesignVariant::parse("LOOM").unwrap()
}

#[test]
fn test_synthesis_fresh_then_cached() {
    let dir = tempfile::tempdir().unwrap();
    let config = sweep_config(dir.path(), &["LOOM"], &[Precision::Int8x8]);
    let tool = FakeToolchain::default();
    let ledger = StatusLedger::new();
    let runner = StageRunner::new(&config, &tool, &ledger).unwrap();
    let clock = ClockPeriod::from_ns(1.0);

    let mut first = WorkItem::synthesis(loom(), clock);
    assert_eq!(runner.run(&mut first).unwrap(), WorkStatus::DoneFresh);
    assert_eq!(tool.count(ToolKind::Synthesis), 1);
    assert!(config.netlist_path(&loom(), clock).exists());
    assert!(config.archive_dir(&loom(), clock).join("syn.log").exists());

    // second run finds the netlist and never calls the tool
    let mut again = WorkItem::synthesis(loom(), clock);
    assert_eq!(runner.run(&mut again).unwrap(), WorkStatus::DoneCached);
    assert_eq!(tool.total(), 1);

    let history: Vec<WorkStatus> = ledger
        .history(&again.label())
        .iter()
        .map(|e| e.status)
        .collect();
    assert_eq!(
        history[history.len() - 2..],
        [WorkStatus::Pending, WorkStatus::DoneCached]
    );
}

#[test]
fn test_missing_netlist_fails_item() {
    let dir = tempfile::tempdir().unwrap();
    let config = sweep_config(dir.path(), &["LOOM"], &[Precision::Int8x8]);
    let tool = FakeToolchain::new(FakeBehaviour {
        write_netlist: false,
        ..FakeBehaviour::default()
    });
    let ledger = StatusLedger::new();
    let runner = StageRunner::new(&config, &tool, &ledger).unwrap();

    let mut item = WorkItem::synthesis(loom(), ClockPeriod::from_ns(1.0));
    assert_eq!(runner.run(&mut item).unwrap(), WorkStatus::Failed);
    assert_eq!(item.status(), WorkStatus::Failed);
}

#[test]
fn test_power_simulation_full_path() {
    let dir = tempfile::tempdir().unwrap();
    let config = sweep_config(dir.path(), &["LOOM"], &[Precision::Int4x4]);
    let tool = FakeToolchain::new(FakeBehaviour {
        simulation_errors: 2,
        ..FakeBehaviour::default()
    });
    let ledger = StatusLedger::new();
    let runner = StageRunner::new(&config, &tool, &ledger).unwrap();
    let clock = ClockPeriod::from_ns(5.0);

    let mut synthesis = WorkItem::synthesis(loom(), clock);
    runner.run(&mut synthesis).unwrap();

    let point = OperatingPoint::new(clock, Precision::Int4x4);
    let mut power = WorkItem::power(loom(), point);
    // a non-zero error count is only a warning
    assert_eq!(runner.run(&mut power).unwrap(), WorkStatus::DoneFresh);

    assert_eq!(tool.count(ToolKind::WaveformSimulation), 1);
    assert_eq!(tool.count(ToolKind::PowerMeasurement), 1);
    // placeholder lines 10..=15 were gone before measurement read the trace
    assert_eq!(*tool.trace_lines_at_measurement.lock().unwrap(), vec![14]);

    let report = config.power_report_path(&loom(), clock, Precision::Int4x4);
    assert!(report.exists());

    let archive = config.archive_dir(&loom(), clock);
    for name in ["power_1010.tcl", "vsim_PB_1010.log", "genus_PB_1010.log"] {
        assert!(archive.join(name).exists(), "{name} not archived");
    }
    let trace = config
        .scratch_dir(&loom(), clock)
        .join("dump_1010_clk5.00_LOOM.vcd");
    assert!(!trace.exists(), "trace should be reclaimed");

    let statuses: Vec<WorkStatus> = ledger
        .history(&power.label())
        .iter()
        .map(|e| e.status)
        .collect();
    assert_eq!(
        statuses,
        vec![
            WorkStatus::Pending,
            WorkStatus::ConfigWritten,
            WorkStatus::ToolRunning,
            WorkStatus::Validated,
            WorkStatus::Archived,
            WorkStatus::DoneFresh,
        ]
    );
}

#[test]
fn test_missing_waveform_skips_measurement() {
    let dir = tempfile::tempdir().unwrap();
    let config = sweep_config(dir.path(), &["LOOM"], &[Precision::Int8x8]);
    let tool = FakeToolchain::new(FakeBehaviour {
        write_trace: false,
        ..FakeBehaviour::default()
    });
    let ledger = StatusLedger::new();
    let runner = StageRunner::new(&config, &tool, &ledger).unwrap();
    let clock = ClockPeriod::from_ns(1.0);

    let mut item = WorkItem::power(loom(), OperatingPoint::new(clock, Precision::Int8x8));
    assert_eq!(runner.run(&mut item).unwrap(), WorkStatus::Failed);
    assert_eq!(tool.count(ToolKind::PowerMeasurement), 0);
    assert!(!config
        .power_report_path(&loom(), clock, Precision::Int8x8)
        .exists());
}

#[test]
fn test_missing_power_report_fails_item() {
    let dir = tempfile::tempdir().unwrap();
    let config = sweep_config(dir.path(), &["LOOM"], &[Precision::Int8x8]);
    let tool = FakeToolchain::new(FakeBehaviour {
        write_power_report: false,
        ..FakeBehaviour::default()
    });
    let ledger = StatusLedger::new();
    let runner = StageRunner::new(&config, &tool, &ledger).unwrap();

    let mut item = WorkItem::power(
        loom(),
        OperatingPoint::new(ClockPeriod::from_ns(1.0), Precision::Int8x8),
    );
    assert_eq!(runner.run(&mut item).unwrap(), WorkStatus::Failed);
    assert_eq!(tool.count(ToolKind::PowerMeasurement), 1);
}

#[test]
fn test_existing_power_report_is_cached_unless_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = sweep_config(dir.path(), &["LOOM"], &[Precision::Int8x8]);
    let clock = ClockPeriod::from_ns(1.0);
    let report = config.power_report_path(&loom(), clock, Precision::Int8x8);
    fs::create_dir_all(report.parent().unwrap()).unwrap();
    fs::write(&report, common::POWER_REPORT).unwrap();
    let point = OperatingPoint::new(clock, Precision::Int8x8);

    let tool = FakeToolchain::default();
    let ledger = StatusLedger::new();
    {
        let runner = StageRunner::new(&config, &tool, &ledger).unwrap();
        let mut item = WorkItem::power(loom(), point);
        assert_eq!(runner.run(&mut item).unwrap(), WorkStatus::DoneCached);
        assert_eq!(tool.total(), 0);
    }

    config.overwrite_power = true;
    let runner = StageRunner::new(&config, &tool, &ledger).unwrap();
    let mut item = WorkItem::power(loom(), point);
    assert_eq!(runner.run(&mut item).unwrap(), WorkStatus::DoneFresh);
    assert_eq!(tool.count(ToolKind::WaveformSimulation), 1);
}

#[test]
fn test_raised_cancel_launches_no_tool() {
    let dir = tempfile::tempdir().unwrap();
    let config = sweep_config(dir.path(), &["LOOM"], &[Precision::Int8x8]);
    let tool = FakeToolchain::default();
    let ledger = StatusLedger::new();
    let cancel = SweepCancel::new();
    let runner = StageRunner::new(&config, &tool, &ledger)
        .unwrap()
        .with_cancel(cancel.clone());
    let clock = ClockPeriod::from_ns(1.0);

    let mut synthesis = WorkItem::synthesis(loom(), clock);
    assert_eq!(runner.run(&mut synthesis).unwrap(), WorkStatus::DoneFresh);
    let calls = tool.total();

    cancel.cancel();
    let mut power = WorkItem::power(loom(), OperatingPoint::new(clock, Precision::Int8x8));
    let error = runner.run(&mut power).unwrap_err();
    assert!(matches!(error, Error::Cancelled(_)));
    assert_eq!(tool.total(), calls);
    assert_eq!(power.status(), WorkStatus::Failed);
    assert_eq!(ledger.latest(&power.label()), Some(WorkStatus::Failed));

    // an existing artifact still resolves without any tool
    let mut cached = WorkItem::synthesis(loom(), clock);
    assert_eq!(runner.run(&mut cached).unwrap(), WorkStatus::DoneCached);
    assert_eq!(tool.total(), calls);
}
