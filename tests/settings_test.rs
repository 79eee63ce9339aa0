use confmig::document::Category;
use confmig::loader::{
    collect_config_files, load_document_bytes, load_settings_from_yaml, write_document,
};
use confmig::rules::SchemaVersion;
use confmig::settings::Settings;
use std::fs;

#[test]
fn test_load_settings_from_yaml() {
    let yaml_content = r#"
target_version: "1.20"
disabled_rules:
  - aggregators.minmax
  - string_to_number
backup_suffix: ".bak"
jobs: 8
"#;

    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("confmig.yaml");
    fs::write(&file_path, yaml_content).expect("Failed to write temp file");

    let settings = load_settings_from_yaml(&file_path).expect("Failed to load settings");

    assert_eq!(settings.target_version(), Ok(SchemaVersion::new(1, 20, 0)));
    assert_eq!(settings.jobs, 8);
    assert_eq!(settings.backup_suffix.as_deref(), Some(".bak"));
    // not given, default applies
    assert_eq!(settings.extensions, vec!["conf", "toml"]);

    temp_dir.close().expect("Failed to close temp dir");
}

#[test]
fn test_unknown_settings_are_rejected() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("confmig.yaml");
    fs::write(&file_path, "target: 1.2\n").unwrap();

    let err = load_settings_from_yaml(&file_path).unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to deserialize settings"));
}

#[test]
fn test_default_settings() {
    let settings = Settings::default();

    assert_eq!(settings.target_version(), Ok(SchemaVersion::LATEST));
    assert_eq!(settings.jobs, 4);
    assert_eq!(settings.build_registry().len(), 7);
}

#[test]
fn test_disabled_rules_by_name_and_plugin() {
    let settings = Settings {
        disabled_rules: vec!["aggregators.minmax".to_string(), "string_to_number".to_string()],
        ..Settings::default()
    };
    let registry = settings.build_registry();

    assert!(registry.lookup(Category::Aggregator, "minmax").is_empty());
    assert!(registry.lookup(Category::Output, "wavefront").is_empty());
    assert_eq!(registry.lookup(Category::Input, "io").len(), 1);
    assert_eq!(registry.len(), 5);
}

#[test]
fn test_collect_config_files_recurses_and_filters() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let root = temp_dir.path();
    fs::create_dir(root.join("telegraf.d")).unwrap();
    fs::write(root.join("telegraf.conf"), "").unwrap();
    fs::write(root.join("telegraf.d").join("inputs.conf"), "").unwrap();
    fs::write(root.join("telegraf.d").join("extra.toml"), "").unwrap();
    fs::write(root.join("notes.txt"), "").unwrap();

    let files = collect_config_files(root, &Settings::default().extensions).unwrap();
    let relative: Vec<_> = files
        .iter()
        .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
        .collect();

    assert_eq!(
        relative,
        vec!["telegraf.conf", "telegraf.d/extra.toml", "telegraf.d/inputs.conf"]
    );
}

#[test]
fn test_write_document_keeps_backup() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("telegraf.conf");
    fs::write(&path, "[[inputs.io]]\n").unwrap();

    write_document(&path, b"[[inputs.diskio]]\n", Some(".bak")).unwrap();

    assert_eq!(load_document_bytes(&path).unwrap(), b"[[inputs.diskio]]\n");
    assert_eq!(
        fs::read(temp_dir.path().join("telegraf.conf.bak")).unwrap(),
        b"[[inputs.io]]\n"
    );
}

#[test]
fn test_missing_file_error_names_the_path() {
    let err = load_document_bytes(std::path::Path::new("/does/not/exist.conf")).unwrap_err();
    assert!(err.to_string().contains("/does/not/exist.conf"));
}
