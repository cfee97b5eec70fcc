//! The built-in suite end to end, against the tar-backed toolchain.

mod helpers;

use helpers::{imgcheck_bin, lossy_unpack, tar_toolchain};
use imgcheck::cases::builtin_cases;
use imgcheck::runner::{Phase, RunOptions, Runner};
use std::process::Command;

#[test]
fn test_builtin_suite_passes() {
    let cases = builtin_cases().unwrap();
    let report = Runner::new(tar_toolchain(), RunOptions::default())
        .run(&cases)
        .unwrap();

    for case in &report.cases {
        assert!(case.passed, "{} failed: {:?}", case.name, case.error);
    }
    assert_eq!(report.cases.len(), cases.len());
}

#[test]
fn test_lossy_unpack_fails_only_affected_cases() {
    let mut tools = tar_toolchain();
    tools.unpack = lossy_unpack();
    let options = RunOptions {
        filter: vec!["EmptyRoot".into(), "DirentSize2048".into()],
        fail_fast: false,
    };

    let cases = builtin_cases().unwrap();
    let report = Runner::new(tools, options).run(&cases).unwrap();

    assert!(report.get("EmptyRoot").unwrap().passed);
    let failed = report.get("DirentSize2048").unwrap();
    assert!(!failed.passed);
    assert_eq!(failed.failed_phase, Some(Phase::Run));
    assert!(failed
        .error
        .as_deref()
        .unwrap()
        .contains("Mismatch between test case input and packed output"));
}

// =============================================================================
// Binary exit codes
// =============================================================================

fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(imgcheck_bin())
        .args(args)
        .output()
        .expect("Failed to run imgcheck")
}

#[test]
fn test_cli_run_passes() {
    let out = run_cli(&[
        "run",
        "--pack",
        "tar -C {input} -cf {output} .",
        "--unpack",
        "tar -C {output} -xf {input}",
        "--repack",
        "cp {input} {output}",
        "--case",
        "EmptyFile",
        "--case",
        "SpecialCharsInName",
        "--json",
    ]);
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert_eq!(out.status.code(), Some(0), "{}", stdout);
    assert!(stdout.contains("Running test case: EmptyFile"));
    assert!(stdout.contains(&format!("{:<32}: PASS", "SpecialCharsInName")));
    assert!(stdout.contains("\"passed\": true"));
}

#[test]
fn test_cli_run_reports_failure() {
    let out = run_cli(&[
        "run",
        "--pack",
        "tar -C {input} -cf {output} .",
        "--unpack",
        "true {input} {output}",
        "--case",
        "EmptyFile",
    ]);
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert_eq!(out.status.code(), Some(1), "{}", stdout);
    assert!(stdout.contains(&format!("{:<32}: FAIL", "EmptyFile")));
    assert!(stdout.contains("Only in"));
}

#[test]
fn test_cli_unknown_case_is_config_error() {
    let out = run_cli(&["run", "--case", "NoSuchCase"]);
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("Unknown test case 'NoSuchCase'"));
}
