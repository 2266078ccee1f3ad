//! End-to-end command tests through `execute_command`.

use std::sync::Arc;

use clap::Parser;
use tempfile::TempDir;

use acsize::cli::commands::execute_command;
use acsize::cli::{Cli, CliError};
use acsize::config::Settings;
use acsize::exitcode;
use acsize::infrastructure::di::ServiceContainer;
use acsize::infrastructure::traits::RealFileSystem;

fn run(args: &[&str]) -> Result<(), CliError> {
    let cli = Cli::try_parse_from(std::iter::once("acsize").chain(args.iter().copied())).unwrap();
    execute_command(&cli)
}

#[test]
fn given_exported_file_when_setting_leaf_then_file_holds_new_value() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let work = temp.path().to_str().unwrap();
    let file = temp.path().join("model.ini");
    let file_arg = file.to_str().unwrap();
    run(&["-C", work, "export", "--raw", "-o", file_arg]).unwrap();

    // Act
    run(&["-C", work, "set", "wing/area", "150.5", "-i", file_arg]).unwrap();

    // Assert
    let services = ServiceContainer::with_deps(Settings::default(), Arc::new(RealFileSystem));
    let (aircraft, report) = services.persistence.load_aircraft(&file).unwrap();
    assert!(report.is_complete());
    assert_eq!(aircraft.wing.area, 150.5);
}

#[test]
fn given_non_round_value_when_setting_then_file_keeps_every_digit() {
    let temp = TempDir::new().unwrap();
    let work = temp.path().to_str().unwrap();
    let file = temp.path().join("model.ini");
    let file_arg = file.to_str().unwrap();
    run(&["-C", work, "export", "--raw", "-o", file_arg]).unwrap();
    let before = std::fs::read_to_string(&file).unwrap();

    run(&["-C", work, "set", "wing/area", "150.123456", "-i", file_arg]).unwrap();

    let after = std::fs::read_to_string(&file).unwrap();
    assert!(after.contains("area = 150.123456\n"), "{}", after);
    let services = ServiceContainer::new(Settings::default());
    let (aircraft, _) = services.persistence.load_aircraft(&file).unwrap();
    assert_eq!(aircraft.wing.area, 150.123456);
    // other leaves are untouched
    let changed: Vec<_> = before.lines().zip(after.lines()).filter(|(a, b)| a != b).collect();
    assert_eq!(changed.len(), 1, "{:?}", changed);
}

#[test]
fn given_unknown_path_when_getting_then_data_error_exit_code() {
    let temp = TempDir::new().unwrap();

    let err = run(&["-C", temp.path().to_str().unwrap(), "get", "wing/chord"]).unwrap_err();

    assert_eq!(err.exit_code(), exitcode::DATAERR);
}

#[test]
fn given_missing_input_when_showing_then_io_error_exit_code() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("absent.ini");

    let err = run(&["-C", temp.path().to_str().unwrap(), "show", "-i", missing.to_str().unwrap()]).unwrap_err();

    assert_eq!(err.exit_code(), exitcode::IOERR);
}

#[test]
fn given_default_aircraft_when_running_chain_then_writes_outputs() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("sized.ini");

    run(&["-C", temp.path().to_str().unwrap(), "run", "-o", out.to_str().unwrap()]).unwrap();

    let services = ServiceContainer::new(Settings::default());
    let (aircraft, _) = services.persistence.load_aircraft(&out).unwrap();
    assert!(aircraft.propulsion.mto_thrust_ref > 0.0);
    assert!(aircraft.high_speed.best_lod_mach > aircraft.design_driver.cruise_mach);
}
