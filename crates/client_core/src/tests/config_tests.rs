use super::*;

use std::{
    collections::HashMap,
    env,
    time::{SystemTime, UNIX_EPOCH},
};

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn defaults_cover_every_setting() {
    let settings = ClientSettings::default();
    assert_eq!(settings.min_input_interval(), Duration::from_millis(70));
    assert_eq!(settings.palette.red, Rgb(0xff, 0x4d, 0x4f));
    assert_eq!(settings.palette.blue, Rgb(0x4d, 0xa6, 0xff));
}

#[test]
fn file_values_override_defaults() {
    let mut settings = ClientSettings::default();
    apply_file(
        &mut settings,
        r##"
server_url = "https://capture.example"
min_input_interval_ms = 120

[palette]
target = "#00ff00"
"##,
    )
    .expect("valid toml");

    assert_eq!(settings.server_url, "https://capture.example");
    assert_eq!(settings.min_input_interval_ms, 120);
    assert_eq!(settings.palette.target, Rgb(0, 0xff, 0));
    // Unset palette keys keep their defaults.
    assert_eq!(settings.palette.red, Palette::default().red);
}

#[test]
fn file_with_bad_colour_is_rejected() {
    let mut settings = ClientSettings::default();
    let err = apply_file(&mut settings, "[palette]\nred = \"red\"\n").expect_err("bad colour");
    assert!(err.to_string().contains("invalid colour"), "{err}");
}

#[test]
fn unknown_keys_are_rejected() {
    let mut settings = ClientSettings::default();
    assert!(apply_file(&mut settings, "servr_url = \"x\"\n").is_err());
}

#[test]
fn app_env_wins_over_legacy_env() {
    let mut settings = ClientSettings::default();
    apply_env(
        &mut settings,
        lookup_from(&[
            ("CAPTURE_SERVER_URL", "http://legacy:1"),
            ("APP__SERVER_URL", "http://app:2"),
            ("APP__CELL_PX", " 12 "),
        ]),
    )
    .expect("env applies");
    assert_eq!(settings.server_url, "http://app:2");
    assert_eq!(settings.cell_px, 12);
}

#[test]
fn non_numeric_interval_env_is_an_error() {
    let mut settings = ClientSettings::default();
    let err = apply_env(
        &mut settings,
        lookup_from(&[("APP__MIN_INPUT_INTERVAL_MS", "fast")]),
    )
    .expect_err("not a number");
    assert!(matches!(
        err,
        ClientError::Setting {
            key: "APP__MIN_INPUT_INTERVAL_MS",
            ..
        }
    ));
}

#[test]
fn tiny_cells_fail_validation() {
    let settings = ClientSettings {
        cell_px: 2,
        ..ClientSettings::default()
    };
    assert!(validate(&settings).is_err());
}

#[test]
fn oversized_cells_from_env_fail_validation() {
    let mut settings = ClientSettings::default();
    apply_env(&mut settings, lookup_from(&[("APP__CELL_PX", "100000000")]))
        .expect("env applies");
    assert!(matches!(
        validate(&settings),
        Err(ClientError::Setting { key: "cell_px", .. })
    ));

    settings.cell_px = MAX_CELL_PX;
    assert!(validate(&settings).is_ok());
}

#[test]
fn explicit_settings_file_is_loaded() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let path = env::temp_dir().join(format!("capture_client_settings_{suffix}.toml"));
    fs::write(&path, "cell_px = 10\n").expect("write settings");

    let settings = load_settings(Some(&path)).expect("load");
    assert_eq!(settings.cell_px, 10);

    fs::remove_file(&path).expect("cleanup");
}

#[test]
fn missing_explicit_settings_file_is_an_error() {
    let path = env::temp_dir().join("capture_client_settings_does_not_exist.toml");
    let err = load_settings(Some(&path)).expect_err("missing file");
    assert!(err.to_string().contains("failed to read settings file"));
}
