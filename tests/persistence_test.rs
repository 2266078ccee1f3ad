//! Integration tests for exporting and loading aircraft files.

use std::fs;

use rstest::rstest;
use tempfile::TempDir;

use acsize::application::sectioned::{Formatting, SectionStyle};
use acsize::application::ApplicationError;
use acsize::config::Settings;
use acsize::domain::{Aircraft, Branch, DomainError, TraversalOrder, Value};
use acsize::infrastructure::di::ServiceContainer;

fn container(temp: &TempDir) -> ServiceContainer {
    let settings = Settings {
        output_dir: temp.path().to_path_buf(),
        ..Settings::default()
    };
    ServiceContainer::new(settings)
}

fn raw(order: TraversalOrder) -> SectionStyle {
    SectionStyle {
        order,
        formatting: Formatting::Raw,
        ..SectionStyle::default()
    }
}

fn modified() -> Aircraft {
    let mut aircraft = Aircraft::new("A320 neo");
    aircraft.wing.area = 127.3456789;
    aircraft.design_driver.cruise_mach = 0.785;
    aircraft.turbofan_engine.rating_factor = [0.81, 0.69, 0.625, 0.561, 0.11];
    aircraft.economics.fuel_price = 0.61;
    aircraft
}

#[rstest]
#[case(TraversalOrder::Declaration)]
#[case(TraversalOrder::Alphabetical)]
fn given_raw_export_when_loading_then_aircraft_is_identical(#[case] order: TraversalOrder) {
    let temp = TempDir::new().unwrap();
    let services = container(&temp);
    let source = modified();

    let path = services
        .persistence
        .export_aircraft(&source, Some(temp.path().join("model.ini").as_path()), &raw(order))
        .unwrap();
    let (loaded, report) = services.persistence.load_aircraft(&path).unwrap();

    assert!(report.is_complete(), "missing: {:?}", report.missing);
    assert_eq!(loaded, source);
}

#[test]
fn given_rendered_export_when_loading_then_values_agree_to_rendered_precision() {
    let temp = TempDir::new().unwrap();
    let services = container(&temp);
    let source = modified();

    let path = services
        .persistence
        .export_aircraft(&source, None, &SectionStyle::default())
        .unwrap();
    let (loaded, _) = services.persistence.load_aircraft(&path).unwrap();

    let expected = source.flatten(TraversalOrder::Declaration);
    let actual = loaded.flatten(TraversalOrder::Declaration);
    for (p, v) in expected.iter() {
        let got = actual.get(p).unwrap();
        match (v, got) {
            (Value::Float(a), Value::Float(b)) => {
                assert!((a - b).abs() <= 1e-4 * a.abs().max(1.0), "{}: {} vs {}", p, a, b)
            }
            (Value::Tuple(a), Value::Tuple(b)) => assert_eq!(a.len(), b.len(), "{}", p),
            _ => assert_eq!(v, got, "{}", p),
        }
    }
    assert_eq!(loaded.name, "A320 neo");
}

#[test]
fn given_no_output_path_when_exporting_then_writes_into_output_dir() {
    let temp = TempDir::new().unwrap();
    let services = container(&temp);

    let path = services
        .persistence
        .export_aircraft(&Aircraft::new("A320 neo"), None, &SectionStyle::default())
        .unwrap();

    assert_eq!(path, temp.path().join("A320_neo.ini"));
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("[Aircraft]\n    name = A320 neo\n"), "{}", text);
    assert!(text.contains("\n    [[wing]]\n        area = 122.00\n"), "{}", text);
}

#[test]
fn given_nested_output_dir_when_exporting_then_creates_parents() {
    let temp = TempDir::new().unwrap();
    let services = container(&temp);
    let target = temp.path().join("runs/2026/model.ini");

    services
        .persistence
        .export_aircraft(&Aircraft::default(), Some(target.as_path()), &SectionStyle::default())
        .unwrap();

    assert!(target.is_file());
}

#[test]
fn given_file_with_unknown_entries_when_loading_then_known_entries_applied() {
    let temp = TempDir::new().unwrap();
    let services = container(&temp);
    let path = temp.path().join("partial.ini");
    fs::write(
        &path,
        "[Aircraft]\n    name = test\n    [[wing]]\n        area = 150\n        chord = 3.5\n    [[landing_gear]]\n        n_wheels = 4\n",
    )
    .unwrap();

    let (aircraft, report) = services.persistence.load_aircraft(&path).unwrap();

    assert_eq!(aircraft.name, "test");
    assert_eq!(aircraft.wing.area, 150.0);
    assert_eq!(aircraft.wing.span, Aircraft::default().wing.span);
    assert_eq!(report.missing.len(), 2);
}

#[test]
fn given_malformed_file_when_loading_then_parse_error_names_file() {
    let temp = TempDir::new().unwrap();
    let services = container(&temp);
    let path = temp.path().join("broken.ini");
    fs::write(&path, "[Aircraft]\n    [[wing]\n        area = 1\n").unwrap();

    let err = services.persistence.load_aircraft(&path).unwrap_err();

    match err {
        ApplicationError::Domain(DomainError::Parse { line, message }) => {
            assert_eq!(line, 2);
            assert!(message.contains("broken.ini"), "{}", message);
        }
        other => panic!("expected parse error, got {:?}", other),
    }
}

#[test]
fn given_kind_mismatch_in_file_when_loading_then_schema_mismatch() {
    let temp = TempDir::new().unwrap();
    let services = container(&temp);
    let path = temp.path().join("mismatch.ini");
    fs::write(&path, "[Aircraft]\n    [[wing]]\n        area = large\n").unwrap();

    let err = services.persistence.load_aircraft(&path).unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::SchemaMismatch { .. })
    ));
}
