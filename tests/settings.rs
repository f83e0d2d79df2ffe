use rheedplot::config::PlotSettings;
use rheedplot::error::PersistenceError;
use rheedplot::settings::{
    load_or_default, load_settings, save_settings, settings_from_json, settings_path, SettingValue,
    SettingsGroup, SettingsGroups,
};

fn sample() -> SettingsGroups {
    let mut camera = SettingsGroup::new();
    camera.insert("color".into(), SettingValue::Bool(true));
    camera.insert("exposure_ms".into(), SettingValue::Float(12.5));
    camera.insert("frames".into(), SettingValue::Int(-3));
    camera.insert("big".into(), SettingValue::Int(i64::MAX));
    camera.insert("backend".into(), SettingValue::Str("spinnaker".into()));
    camera.insert("numeric_text".into(), SettingValue::Str("42".into()));
    let mut groups = SettingsGroups::new();
    groups.insert("camera".into(), camera);
    groups.insert("empty".into(), SettingsGroup::new());
    groups
}

#[test]
fn save_then_load_round_trips_every_type() {
    let dir = tempfile::tempdir().unwrap();
    let groups = sample();
    let path = save_settings(&groups, dir.path(), "rheed").unwrap();
    assert_eq!(path, settings_path(dir.path(), "rheed"));
    assert!(path.ends_with("rheed_settings.json"));

    let loaded = load_settings(dir.path(), "rheed").unwrap();
    assert_eq!(loaded, groups);
}

#[test]
fn save_creates_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("a").join("b");
    save_settings(&sample(), &nested, "x").unwrap();
    assert!(settings_path(&nested, "x").exists());
}

#[test]
fn legacy_string_values_are_parsed_by_tag() {
    let json = r#"{
        "gui": {
            "dark": {"value": "True", "type": "bool"},
            "style": {"value": "Fusion", "type": "str"},
            "fps": {"value": "30", "type": "int"},
            "scale": {"value": "0.75", "type": "float"},
            "alias": {"value": "hello", "type": "string"},
            "legacy_tuple": {"value": "'text'", "type": "tuple"},
            "legacy_num": {"value": "8", "type": "numpy.int64"}
        }
    }"#;
    let groups = settings_from_json(json).unwrap();
    let gui = &groups["gui"];
    assert_eq!(gui["dark"], SettingValue::Bool(true));
    assert_eq!(gui["style"], SettingValue::Str("Fusion".into()));
    assert_eq!(gui["fps"], SettingValue::Int(30));
    assert_eq!(gui["scale"], SettingValue::Float(0.75));
    assert_eq!(gui["alias"], SettingValue::Str("hello".into()));
    assert_eq!(gui["legacy_tuple"], SettingValue::Str("text".into()));
    assert_eq!(gui["legacy_num"], SettingValue::Int(8));
}

#[test]
fn bad_legacy_value_is_malformed() {
    let json = r#"{"gui": {"fps": {"value": "fast", "type": "int"}}}"#;
    let err = settings_from_json(json).unwrap_err();
    assert!(matches!(err, PersistenceError::Malformed { .. }));
    assert!(err.to_string().contains("gui.fps"));
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let defaults = PlotSettings::default().to_groups();
    let (groups, err) = load_or_default(dir.path(), "absent", defaults.clone());
    assert_eq!(groups, defaults);
    assert!(matches!(err, Some(PersistenceError::Io { .. })));
}

#[test]
fn corrupt_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(settings_path(dir.path(), "bad"), "{ not json").unwrap();
    let (groups, err) = load_or_default(dir.path(), "bad", SettingsGroups::new());
    assert!(groups.is_empty());
    assert!(matches!(err, Some(PersistenceError::Json(_))));
}

#[test]
fn plot_settings_persist_through_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut plot = PlotSettings::default();
    plot.show_legend = false;
    plot.time_window = 45.0;
    let mut groups = sample();
    plot.store(&mut groups);
    save_settings(&groups, dir.path(), "viewer").unwrap();

    let (loaded, err) = load_or_default(dir.path(), "viewer", SettingsGroups::new());
    assert!(err.is_none());
    assert_eq!(PlotSettings::from_groups(&loaded), plot);
    assert!(loaded.contains_key("camera"));
}
