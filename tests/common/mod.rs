//! Shared fixtures: a fake EDA toolchain that reads the generated setup
//! scripts and leaves plausible artifacts behind.

#![allow(dead_code)]

use auto_sweep::config::SweepConfig;
use auto_sweep::design::{ClockPeriod, DesignVariant, Precision};
use auto_sweep::pipeline::{ExternalTool, ToolInvocation, ToolKind};
use auto_sweep::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const AREA_REPORT: &str = "\
  Instance                 Module            Cells  Cell Area  Net Area  Total Area
top_L4_mac                                 3100  2200  1800  5210
  L4                       L4_mac_BG        800  400  300  3400
  L4/L4_mult               L4_mult_BG       500  200  150  2300
  L4/L4_mult/m0/mult_2b_0  mult_2b_BG        10    5    3    40
  L4/L4_mult/m1/mult_2b_1  mult_2b_BG        10    5    3    42
  L4/count_prec            count_prec  tsmc  wl  none  18
sequential                 220    610    11.7
";

pub const POWER_REPORT: &str = "\
top_L4_mac               3000  0.01 0.20 0.30 0.40 900000.0
  L4                     2500  0.01 0.20 0.30 0.40 800000.0
  L4_mult                2000  0.01 0.10 0.20 0.30 600000.0
  L3_mult_0  mult_L3       500  0.01 0.10 0.20 0.30 450000.0
  L2_mult_0  mult_L2       120  0.01 0.10 0.20 0.30 300000.0
  mult_2b_0  mult           12  0.00 0.00 0.00 0.00 1200.0
  mult_2b_1  mult           12  0.00 0.00 0.00 0.00 800.0
L4/acc_reg[0]            0.1 0.2 100000.0
L4/L4_mult..L3_shift_reg[1]   0.1 0.2 50000.0
a_reg_reg[0][1][2][3][4] 0.1 0.2 100000.0
";

/// Behaviour switches for [`FakeToolchain`].
#[derive(Debug, Clone, Copy)]
pub struct FakeBehaviour {
    pub write_netlist: bool,
    pub write_trace: bool,
    pub write_power_report: bool,
    pub simulation_errors: u32,
}

impl Default for FakeBehaviour {
    fn default() -> Self {
        Self {
            write_netlist: true,
            write_trace: true,
            write_power_report: true,
            simulation_errors: 0,
        }
    }
}

/// Records every invocation; produces artifacts where the scripts say.
#[derive(Debug, Default)]
pub struct FakeToolchain {
    pub behaviour: FakeBehaviour,
    pub calls: Mutex<Vec<ToolKind>>,
    /// Line count of each trace at the time power was measured
    pub trace_lines_at_measurement: Mutex<Vec<usize>>,
}

impl FakeToolchain {
    pub fn new(behaviour: FakeBehaviour) -> Self {
        Self {
            behaviour,
            ..Self::default()
        }
    }

    pub fn count(&self, kind: ToolKind) -> usize {
        self.calls.lock().unwrap().iter().filter(|k| **k == kind).count()
    }

    pub fn total(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

/// Value of `set NAME value` in a generated setup script.
pub fn script_var(script: &str, name: &str) -> Option<String> {
    script.lines().find_map(|line| {
        let mut parts = line.split_whitespace();
        (parts.next() == Some("set") && parts.next() == Some(name))
            .then(|| parts.collect::<Vec<_>>().join(" "))
    })
}

impl ExternalTool for FakeToolchain {
    fn invoke(&self, invocation: &ToolInvocation) -> Result<()> {
        self.calls.lock().unwrap().push(invocation.kind);
        let cwd = &invocation.working_dir;
        match invocation.kind {
            ToolKind::Synthesis => {
                let setup = fs::read_to_string(cwd.join("syn_setup.tcl"))?;
                let export = PathBuf::from(script_var(&setup, "EXPORT_PATH").unwrap());
                let report = PathBuf::from(script_var(&setup, "REPORT_FILE").unwrap());
                fs::write(&invocation.log_file, "synthesis done\n")?;
                if self.behaviour.write_netlist {
                    fs::write(export.join("post.v"), "module top_L4_mac; endmodule\n")?;
                    fs::write(export.join("post.sdf"), "(DELAYFILE)\n")?;
                    fs::write(report, AREA_REPORT)?;
                }
            }
            ToolKind::WaveformSimulation => {
                let setup = fs::read_to_string(cwd.join(&invocation.args[2]))?;
                let trace = script_var(&setup, "VCD_FILE").unwrap();
                if self.behaviour.write_trace {
                    let text: String = (1..=20).map(|i| format!("vcd line {i}\n")).collect();
                    fs::write(cwd.join(trace), text)?;
                }
                fs::write(
                    &invocation.log_file,
                    format!(
                        "# Loading work.pb\n# Errors: {}, Warnings: 3\n",
                        self.behaviour.simulation_errors
                    ),
                )?;
            }
            ToolKind::PowerMeasurement => {
                let script = fs::read_to_string(cwd.join(&invocation.args[3]))?;
                let trace = script
                    .lines()
                    .find_map(|l| l.strip_prefix("read_vcd -static "))
                    .unwrap()
                    .to_string();
                let report = script
                    .lines()
                    .find_map(|l| l.strip_prefix("report power -verbose >> "))
                    .unwrap()
                    .to_string();
                let lines = fs::read_to_string(cwd.join(trace))?.lines().count();
                self.trace_lines_at_measurement.lock().unwrap().push(lines);
                fs::write(&invocation.log_file, "measurement done\n")?;
                if self.behaviour.write_power_report {
                    fs::write(report, POWER_REPORT)?;
                }
            }
        }
        Ok(())
    }
}

/// Small sweep rooted in a temporary directory.
pub fn sweep_config(root: &Path, designs: &[&str], precisions: &[Precision]) -> SweepConfig {
    let mut config = SweepConfig::default();
    config.designs = designs
        .iter()
        .map(|id| DesignVariant::parse(id).unwrap())
        .collect();
    config.clocks = vec![ClockPeriod::from_ns(1.0), ClockPeriod::from_ns(5.0)];
    config.precisions = precisions.to_vec();
    config.pools.synthesis_workers = 2;
    config.pools.power_workers = 4;
    config.paths.scratch_dir = root.join("TMP");
    config.paths.result_dir = root.join("results");
    config
}
