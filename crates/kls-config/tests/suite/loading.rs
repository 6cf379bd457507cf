use std::path::PathBuf;

use kls_config::{ConfigError, KlsConfig, LoggingConfig};
use pretty_assertions::assert_eq;

#[test]
fn empty_text_gives_defaults() {
    let (config, diagnostics) = KlsConfig::load_from_str_with_diagnostics("").unwrap();
    assert_eq!(config, KlsConfig::default());
    assert!(diagnostics.is_empty());
    assert!(!config.scripts.enabled);
    assert!(!config.scripts.build_scripts_enabled);
    assert!(config.exclusions.patterns.is_empty());
    assert_eq!(config.logging.level, "info");
    assert!(config.logging.stderr);
    assert_eq!(config.logging.buffer_lines, 2_000);
}

#[test]
fn every_section_is_read() {
    let text = r#"
[logging]
level = "debug"
json = true
stderr = false
file = "/tmp/kls.log"

[scripts]
enabled = true
build_scripts_enabled = true

[exclusions]
patterns = ["generated", "*.tmp"]
"#;
    let (config, diagnostics) = KlsConfig::load_from_str_with_diagnostics(text).unwrap();
    assert!(diagnostics.is_empty());
    assert_eq!(
        config.logging,
        LoggingConfig {
            level: "debug".into(),
            json: true,
            stderr: false,
            file: Some(PathBuf::from("/tmp/kls.log")),
            ..LoggingConfig::default()
        }
    );
    assert!(config.scripts.enabled);
    assert!(config.scripts.build_scripts_enabled);
    assert_eq!(config.exclusions.patterns, vec!["generated", "*.tmp"]);
}

#[test]
fn unknown_keys_are_reported_not_rejected() {
    let text = r#"
typo = 1

[scripts]
enabeld = true

[exclusions]
patterns = ["out"]
"#;
    let (config, diagnostics) = KlsConfig::load_from_str_with_diagnostics(text).unwrap();
    assert_eq!(diagnostics.unknown_keys, vec!["scripts.enabeld", "typo"]);
    assert!(!config.scripts.enabled);
    assert_eq!(config.exclusions.patterns, vec!["out"]);
}

#[test]
fn type_errors_are_fatal() {
    let err = KlsConfig::load_from_str_with_diagnostics("[scripts]\nenabled = \"yes\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)), "{err:?}");
}

#[test]
fn missing_files_report_their_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kls.toml");
    let err = KlsConfig::load_from_path(&path).unwrap_err();
    match err {
        ConfigError::Io { path: reported, .. } => assert_eq!(reported, path.display().to_string()),
        other => panic!("unexpected error {other:?}"),
    }
}
