//! Tests for error types

use auto_sweep::design::{DesignVariant, Precision};
use auto_sweep::Error;

#[test]
fn test_missing_artifact_error() {
    let error = Error::MissingArtifact("results/LOOM/clk:1.00-1.00-1.00/post.v".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Missing artifact"));
    assert!(error_str.contains("post.v"));
    assert!(error_str.contains("archived log"));
}

#[test]
fn test_tool_launch_error() {
    let error = Error::ToolLaunch {
        tool: "genus".to_string(),
        reason: "No such file or directory".to_string(),
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("Failed to launch `genus`"));
    assert!(error_str.contains("PATH"));
}

#[test]
fn test_invalid_transition_error() {
    let error = Error::InvalidTransition {
        item: "LOOM/clk:1.00-1.00-1.00".to_string(),
        from: "done_fresh".to_string(),
        to: "pending".to_string(),
    };
    assert_eq!(
        error.to_string(),
        "Invalid work item transition for LOOM/clk:1.00-1.00-1.00: done_fresh -> pending"
    );
}

#[test]
fn test_unknown_design_from_parse() {
    let error = DesignVariant::parse("BG_XX_L4_00_L3_00_L2_00_DVAFS_0").unwrap_err();
    assert!(matches!(error, Error::UnknownDesign(_)));
    assert!(error.to_string().contains("BG_XX"));
}

#[test]
fn test_unknown_precision_lists_codes() {
    let error = Precision::from_code("0101").unwrap_err();
    let error_str = format!("{error}");
    assert!(error_str.contains("0101"));
    assert!(error_str.contains("1111"));
}

#[test]
fn test_io_error_conversion() {
    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "report_syn.rpt");
    let error: Error = io_error.into();
    assert!(matches!(error, Error::Io(_)));
    assert!(format!("{error}").contains("IO error"));
}

#[test]
fn test_pattern_error_conversion() {
    let regex_error = regex::Regex::new("top(").unwrap_err();
    let error: Error = regex_error.into();
    assert!(format!("{error}").contains("Extraction pattern error"));
}

#[test]
fn test_error_debug_format() {
    let error = Error::Config("pool widths must be positive".to_string());
    let debug_str = format!("{error:?}");
    assert!(debug_str.contains("Config"));
}
