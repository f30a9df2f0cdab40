use super::*;

use std::{collections::HashMap, io::Write};

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

#[test]
fn defaults_match_reference_pacing() {
    let settings = ControllerSettings::default();
    assert_eq!(settings.step_delay_ms, 1500);
    assert_eq!(settings.result_delay_ms, 1000);
    assert_eq!(settings.step_timeout(), None);
    assert_eq!(
        settings.mock_engine_options().step_delay,
        Duration::from_millis(1500)
    );
}

#[test]
fn file_values_override_defaults() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "step_delay_ms = 200\nstep_timeout_ms = 5000").expect("write");

    let settings = load_settings_from(file.path()).expect("load");
    assert_eq!(settings.step_delay_ms, 200);
    assert_eq!(settings.result_delay_ms, 1000);
    assert_eq!(settings.step_timeout(), Some(Duration::from_secs(5)));
}

#[test]
fn unknown_keys_are_a_parse_error() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "bind_addr = \"127.0.0.1:8443\"").expect("write");

    let err = load_settings_from(file.path()).expect_err("unknown key");
    assert!(matches!(err, SettingsError::Parse { .. }));
}

#[test]
fn missing_file_is_a_read_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let err = load_settings_from(&dir.path().join("absent.toml")).expect_err("missing");
    assert!(matches!(err, SettingsError::Read { .. }));
}

#[test]
fn env_overrides_apply_after_file() {
    let settings = apply_env_overrides(
        ControllerSettings::default(),
        env(&[
            ("APP__STEP_DELAY_MS", "10"),
            ("APP__RESULT_DELAY_MS", " 20 "),
            ("APP__STEP_TIMEOUT_MS", "300"),
            ("APP__EVENT_BUFFER", "0"),
        ]),
    );

    assert_eq!(settings.step_delay_ms, 10);
    assert_eq!(settings.result_delay_ms, 20);
    assert_eq!(settings.step_timeout_ms, Some(300));
    assert_eq!(settings.event_buffer, 1);
}

#[test]
fn malformed_env_values_are_ignored() {
    let settings = apply_env_overrides(
        ControllerSettings::default(),
        env(&[("APP__STEP_DELAY_MS", "fast")]),
    );
    assert_eq!(settings.step_delay_ms, 1500);
}

#[test]
fn zero_timeout_disables_the_limit() {
    let settings = apply_env_overrides(
        ControllerSettings {
            step_timeout_ms: Some(100),
            ..ControllerSettings::default()
        },
        env(&[("APP__STEP_TIMEOUT_MS", "0")]),
    );
    assert_eq!(settings.step_timeout_ms, None);
}

#[test]
fn zero_timeout_in_file_disables_the_limit() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "step_timeout_ms = 0").expect("write");

    let settings = load_settings_from(file.path()).expect("load");
    assert_eq!(settings.step_timeout_ms, None);
    assert_eq!(settings.step_timeout(), None);
}

#[test]
fn zero_timeout_in_struct_is_not_a_limit() {
    let settings = ControllerSettings {
        step_timeout_ms: Some(0),
        ..ControllerSettings::default()
    };
    assert_eq!(settings.step_timeout(), None);
}
