//! Setup scripts consumed by the external tools
//!
//! Only the per-item variables are generated here; the flow itself lives in
//! the external templates named by [`PathConfig`](crate::config::PathConfig).

use crate::config::SweepConfig;
use crate::design::{ClockPeriod, DesignVariant, Precision};
use std::fmt::Write as _;
use std::path::Path;

/// Synthesis setup script file name (in the scratch directory).
pub const SYNTHESIS_SETUP: &str = "syn_setup.tcl";

/// Waveform simulation setup script name.
#[must_use]
pub fn waveform_setup_name(precision: Precision, design: &DesignVariant) -> String {
    format!("PB_setup_{}_{}.tcl", precision.code(), design)
}

/// Power measurement script name.
#[must_use]
pub fn measurement_script_name(precision: Precision, design: &DesignVariant) -> String {
    format!("power_{}_{}.tcl", precision.code(), design)
}

/// Waveform trace produced by the simulation tool.
#[must_use]
pub fn waveform_name(precision: Precision, clock: ClockPeriod, design: &DesignVariant) -> String {
    format!("dump_{}_clk{}_{}.vcd", precision.code(), clock, design)
}

fn set(script: &mut String, name: &str, value: impl std::fmt::Display) {
    let _ = writeln!(script, "set {name:<12} {value}");
}

fn structural_block(script: &mut String, config: &SweepConfig, design: &DesignVariant) {
    let structure = design.config();
    set(script, "HEADROOM", config.simulation.headroom);
    set(script, "L4_MODE", structure.l4.code());
    set(script, "L3_MODE", structure.l3.code());
    set(script, "L2_MODE", structure.l2.code());
    set(script, "BG", structure.bit_group.tag());
    set(script, "DVAFS", u8::from(structure.dvafs));
}

/// Synthesis setup: design identity, structure, per-mode clocks, library and
/// export locations.
#[must_use]
pub fn synthesis_setup(
    config: &SweepConfig,
    design: &DesignVariant,
    clock: ClockPeriod,
    export: &Path,
    report: &Path,
) -> String {
    let mut script = String::from("########### INFO ###########\n");
    set(&mut script, "AUTO", "yes");
    script.push('\n');
    set(&mut script, "DESIGN_NAME", design);
    set(&mut script, "SDC_MODE", design.config().sdc_mode());
    set(&mut script, "DESIGN", &config.simulation.top_module);
    script.push('\n');
    structural_block(&mut script, config, design);
    script.push('\n');
    set(&mut script, "CLK_8B", clock);
    set(&mut script, "CLK_4B", clock);
    set(&mut script, "CLK_2B", clock);
    script.push('\n');
    set(&mut script, "LIB_DB", config.paths.lib_db.display());
    script.push('\n');
    set(&mut script, "SDC_PATH", config.paths.sdc_dir.display());
    set(&mut script, "EXPORT_PATH", export.display());
    set(&mut script, "REPORT_FILE", report.display());
    set(&mut script, "RTL_PATH", config.paths.rtl_dir.display());
    script
}

/// Waveform simulation setup: netlist, timing annotation, stimulus and the
/// trace file name.
#[must_use]
pub fn waveform_setup(
    config: &SweepConfig,
    design: &DesignVariant,
    precision: Precision,
    clock: ClockPeriod,
    export: &Path,
) -> String {
    let mut script = String::from("########### INFO ###########\n");
    set(&mut script, "AUTO", "yes");
    script.push('\n');
    set(&mut script, "EXPORT_PATH", export.display());
    set(&mut script, "LIB_V", config.paths.lib_v.display());
    script.push('\n');
    set(&mut script, "V_FILE", export.join("post.v").display());
    set(&mut script, "SDF_FILE", export.join("post.sdf").display());
    set(&mut script, "PB_FILE", config.paths.testbench.display());
    set(&mut script, "HELPER", config.paths.helper.display());
    script.push('\n');
    set(&mut script, "TEST", 0);
    set(&mut script, "PRECISION", precision.code());
    set(&mut script, "CLK_PERIOD", clock);
    structural_block(&mut script, config, design);
    set(&mut script, "VCD_FILE", waveform_name(precision, clock, design));
    set(&mut script, "RST", config.simulation.reset_iterations);
    set(&mut script, "REP", config.simulation.repetitions);
    script.push('\n');
    set(&mut script, "LIB_DB", config.paths.lib_db.display());
    script.push('\n');
    set(&mut script, "SDC_PATH", config.paths.sdc_dir.display());
    script
}

/// Power measurement: elaborate the netlist, annotate switching activity
/// from the corrected trace, append summary and flat reports.
#[must_use]
pub fn measurement_script(
    config: &SweepConfig,
    design: &DesignVariant,
    precision: Precision,
    clock: ClockPeriod,
    export: &Path,
    report: &Path,
) -> String {
    let report = report.display();
    let trace = waveform_name(precision, clock, design);
    let code = precision.code();
    let mut script = String::new();
    let _ = writeln!(script, "set_attribute library {}", config.paths.lib_db.display());
    let _ = writeln!(script, "set_attribute lp_power_analysis_effort high");
    let _ = writeln!(script, "read_hdl -library work {}", export.join("post.v").display());
    let _ = writeln!(script, "elaborate {}", config.simulation.top_module);
    let _ = writeln!(script, "read_vcd -static {trace}");
    let _ = writeln!(
        script,
        "echo \"\\n############### POWER - {code} SUMMARY\\nSimulated at {clock} clock period.\\n\" > {report}"
    );
    let _ = writeln!(script, "report power -verbose >> {report}");
    let _ = writeln!(
        script,
        "echo \"\\n############### POWER - {code} DETAILS\\nSimulated at {clock} clock period.\\n\" >> {report}"
    );
    let _ = writeln!(script, "report power -flat -sort dynamic >> {report}");
    let _ = writeln!(script, "delete_obj /designs/*");
    script
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthesis_setup_carries_structure() {
        let config = SweepConfig::default();
        let design = DesignVariant::parse("BITBLADE").unwrap();
        let script = synthesis_setup(
            &config,
            &design,
            ClockPeriod::from_ns(1.0),
            Path::new("/res/BITBLADE"),
            Path::new("/res/BITBLADE/report_syn.rpt"),
        );
        assert!(script.contains("set DESIGN_NAME  BITBLADE\n"));
        assert!(script.contains("set BG           L3\n"));
        assert!(script.contains("set L3_MODE      11\n"));
        assert!(script.contains("set CLK_8B       1.00\n"));
        assert!(script.contains("set REPORT_FILE  /res/BITBLADE/report_syn.rpt\n"));
    }

    #[test]
    fn test_waveform_names_agree() {
        let config = SweepConfig::default();
        let design = DesignVariant::parse("LOOM").unwrap();
        let clock = ClockPeriod::from_ns(5.0);
        let script = waveform_setup(&config, &design, Precision::Int4x4, clock, Path::new("/e"));
        assert_eq!(waveform_name(Precision::Int4x4, clock, &design), "dump_1010_clk5.00_LOOM.vcd");
        assert!(script.contains("set VCD_FILE     dump_1010_clk5.00_LOOM.vcd\n"));
        assert!(script.contains("set REP          4096\n"));

        let power = measurement_script(
            &config,
            &design,
            Precision::Int4x4,
            clock,
            Path::new("/e"),
            Path::new("/e/report_power_1010.rpt"),
        );
        assert!(power.contains("read_vcd -static dump_1010_clk5.00_LOOM.vcd\n"));
        assert!(power.contains("report power -flat -sort dynamic >> /e/report_power_1010.rpt\n"));
    }
}
