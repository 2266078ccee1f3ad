//! Integration tests for layered Settings loading.
//!
//! Layers (lowest to highest): compiled defaults, global file, local file.
//! Environment overrides are not exercised here since tests share one
//! process environment.

use std::fs;

use tempfile::TempDir;

use acsize::application::sectioned::Formatting;
use acsize::application::ApplicationError;
use acsize::config::{local_config_path, Settings, CONFIG_FILE_NAME};
use acsize::domain::TraversalOrder;

#[test]
fn given_local_config_when_load_then_overrides_defaults() {
    // Arrange
    let work = TempDir::new().unwrap();
    fs::write(
        work.path().join(CONFIG_FILE_NAME),
        r#"
aircraft_name = "Regional"

[export]
order = "alphabetical"
format = "raw"
"#,
    )
    .unwrap();

    // Act
    let settings = Settings::load_from(None, Some(&local_config_path(work.path()))).expect("load settings");

    // Assert
    assert_eq!(settings.aircraft_name, "Regional");
    assert_eq!(settings.export.order, TraversalOrder::Alphabetical);
    assert_eq!(settings.export.format, Formatting::Raw);
    // untouched keys keep their defaults
    assert_eq!(settings.export.indent, 4);
    assert_eq!(settings.mdo.jacobian_step, 1e-7);
}

#[test]
fn given_global_and_local_config_when_load_then_local_wins() {
    let global_dir = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let global = global_dir.path().join(CONFIG_FILE_NAME);
    let local = work.path().join(CONFIG_FILE_NAME);
    fs::write(&global, "[numeric]\nmax_bracket_steps = 500\n\n[mdo]\njacobian_workers = 3\n").unwrap();
    fs::write(&local, "[numeric]\nmax_bracket_steps = 200\n").unwrap();

    let settings = Settings::load_from(Some(&global), Some(&local)).expect("load settings");

    assert_eq!(settings.numeric.max_bracket_steps, 200);
    assert_eq!(settings.mdo.jacobian_workers, 3);
    assert_eq!(settings.numeric.line_search().max_steps, 200);
}

#[test]
fn given_missing_files_when_load_then_defaults() {
    let work = TempDir::new().unwrap();
    let absent = work.path().join("nope").join(CONFIG_FILE_NAME);

    let settings = Settings::load_from(Some(&absent), Some(&absent)).expect("load settings");

    assert_eq!(settings.export, Settings::default().export);
    assert_eq!(settings.numeric, Settings::default().numeric);
}

#[test]
fn given_malformed_toml_when_load_then_config_error() {
    let work = TempDir::new().unwrap();
    let local = work.path().join(CONFIG_FILE_NAME);
    fs::write(&local, "[export\norder = \n").unwrap();

    let err = Settings::load_from(None, Some(&local)).unwrap_err();

    assert!(matches!(err, ApplicationError::Config { .. }), "got {:?}", err);
}

#[test]
fn given_non_positive_jacobian_step_when_load_then_config_error() {
    let work = TempDir::new().unwrap();
    let local = work.path().join(CONFIG_FILE_NAME);
    fs::write(&local, "[mdo]\njacobian_step = 0.0\n").unwrap();

    let err = Settings::load_from(None, Some(&local)).unwrap_err();

    assert!(err.to_string().contains("jacobian_step"), "{}", err);
}

#[test]
fn given_output_dir_with_tilde_when_load_then_expanded() {
    let work = TempDir::new().unwrap();
    let local = work.path().join(CONFIG_FILE_NAME);
    fs::write(&local, "output_dir = \"~/acsize/out\"\n").unwrap();

    let settings = Settings::load_from(None, Some(&local)).expect("load settings");

    assert!(!settings.output_dir.to_string_lossy().starts_with('~'));
    assert!(settings.output_dir.ends_with("acsize/out"));
}
