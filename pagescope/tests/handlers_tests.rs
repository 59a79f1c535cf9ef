use pagescope::handlers::*;
use pagescope_core::ReportFormat;
use pagescope_core::config::ConfigError;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_parse_report_format() {
    assert_eq!(parse_report_format("text"), Ok(ReportFormat::Text));
    assert_eq!(parse_report_format("JSON"), Ok(ReportFormat::Json));
    assert_eq!(parse_report_format("md"), Ok(ReportFormat::Markdown));
}

#[test]
fn test_parse_report_format_invalid() {
    let result = parse_report_format("csv");
    assert!(result.is_err());
    assert!(result.unwrap_err().contains("Unknown report format 'csv'"));
}

#[test]
fn test_load_config_defaults() {
    let config = load_config(None).unwrap();
    assert_eq!(config.probe.concurrency, 50);
    assert_eq!(config.probe.accepted_statuses, vec![200, 999]);
}

#[test]
fn test_load_config_from_file() -> Result<(), Box<dyn std::error::Error>> {
    let mut temp_file = NamedTempFile::new()?;
    writeln!(
        temp_file,
        r#"{{ "probe": {{ "concurrency": 8, "accepted_statuses": [200, 429, 999] }} }}"#
    )?;

    let path = temp_file.path().to_string_lossy().to_string();
    let config = load_config(Some(path.as_str()))?;

    assert_eq!(config.probe.concurrency, 8);
    assert_eq!(config.probe.accepted_statuses, vec![200, 429, 999]);
    assert!(config.legacy_h6_lookup);

    Ok(())
}

#[test]
fn test_load_config_missing_file() {
    let result = load_config(Some("~/definitely/not/here/pagescope.json"));
    assert!(matches!(result, Err(ConfigError::Io { .. })));
}

#[test]
fn test_apply_probe_overrides() {
    let config = load_config(None).unwrap();
    let overrides = ProbeOverrides {
        concurrency: Some(5),
        timeout_secs: Some(3),
        deadline_secs: Some(20),
    };

    let config = apply_probe_overrides(config, overrides).unwrap();

    assert_eq!(config.probe.concurrency, 5);
    assert_eq!(config.probe.timeout_secs, Some(3));
    assert_eq!(config.probe.deadline_secs, Some(20));
}

#[test]
fn test_apply_no_overrides_keeps_config() {
    let config = load_config(None).unwrap();
    let unchanged = apply_probe_overrides(config.clone(), ProbeOverrides::default()).unwrap();
    assert_eq!(unchanged, config);
}

#[test]
fn test_zero_concurrency_override_is_rejected() {
    let config = load_config(None).unwrap();
    let overrides = ProbeOverrides {
        concurrency: Some(0),
        ..ProbeOverrides::default()
    };

    let result = apply_probe_overrides(config, overrides);
    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
fn test_zero_timeout_override_is_rejected() {
    let config = load_config(None).unwrap();
    let overrides = ProbeOverrides {
        timeout_secs: Some(0),
        ..ProbeOverrides::default()
    };

    let result = apply_probe_overrides(config, overrides);
    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}
