// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Ferry configuration system.

use ferry_config::diagnostic::ConfigError;
use ferry_config::{load_and_validate_str, load_config, load_config_from_str};
use ferry_core::{CheckpointPolicy, LifecycleMode, PayloadEncoding};
use figment::Jail;

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_ferry_config() {
    let toml = r#"
[agent]
name = "handset-7"
log_level = "debug"

[source]
database_path = "/data/mmssms.db"
batch_cap = 200

[storage]
database_path = "/data/ferry.db"
wal_mode = false

[delivery]
endpoint_url = "https://collector.example.com/venlit"
encoding = "json"
connect_timeout_secs = 3
request_timeout_secs = 10
workers = 4
checkpoint_policy = "contiguous_success"

[schedule]
initial_delay_secs = 60
interval_secs = 3600
run_on_start = false

[lifecycle]
mode = "one_shot"
notice_title = "Sync"
notice_text = "Sending"
restart_backoff_secs = 1
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.agent.name, "handset-7");
    assert_eq!(config.agent.log_level, "debug");
    assert_eq!(config.source.database_path, "/data/mmssms.db");
    assert_eq!(config.source.batch_cap, 200);
    assert_eq!(config.storage.database_path, "/data/ferry.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(
        config.delivery.endpoint_url,
        "https://collector.example.com/venlit"
    );
    assert_eq!(config.delivery.encoding, PayloadEncoding::Json);
    assert_eq!(config.delivery.connect_timeout_secs, 3);
    assert_eq!(config.delivery.request_timeout_secs, 10);
    assert_eq!(config.delivery.workers, 4);
    assert_eq!(
        config.delivery.checkpoint_policy,
        CheckpointPolicy::ContiguousSuccess
    );
    assert_eq!(config.schedule.initial_delay_secs, 60);
    assert_eq!(config.schedule.interval_secs, 3600);
    assert!(!config.schedule.run_on_start);
    assert_eq!(config.lifecycle.mode, LifecycleMode::OneShot);
    assert_eq!(config.lifecycle.notice_title, "Sync");
    assert_eq!(config.lifecycle.restart_backoff_secs, 1);
}

/// An empty file yields the documented defaults.
#[test]
fn empty_toml_uses_defaults() {
    let config = load_and_validate_str("").expect("defaults should validate");
    assert_eq!(config.source.batch_cap, 500);
    assert_eq!(config.schedule.initial_delay_secs, 32_400);
    assert_eq!(config.schedule.interval_secs, 86_400);
    assert_eq!(config.delivery.workers, 2);
}

#[test]
fn unknown_field_produces_suggestion() {
    let toml = r#"
[source]
bacth_cap = 10
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject unknown field");
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } => {
            assert_eq!(key, "bacth_cap");
            assert_eq!(suggestion.as_deref(), Some("batch_cap"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

#[test]
fn unknown_section_is_rejected() {
    let toml = r#"
[telegram]
bot_token = "abc"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject unknown section");
    assert!(matches!(errors[0], ConfigError::UnknownKey { .. }));
}

#[test]
fn unknown_policy_variant_is_reported() {
    let toml = r#"
[delivery]
checkpoint_policy = "exactly_once"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject variant");
    let rendered = errors[0].to_string();
    assert!(
        rendered.contains("exactly_once"),
        "error should mention the bad variant, got: {rendered}"
    );
}

#[test]
fn wrong_type_is_reported() {
    let toml = r#"
[delivery]
workers = "two"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject type");
    assert!(matches!(errors[0], ConfigError::InvalidValue { .. }));
}

#[test]
fn validation_runs_after_successful_parse() {
    let toml = r#"
[source]
batch_cap = 0
"#;

    let errors = load_and_validate_str(toml).expect_err("batch_cap 0 is invalid");
    assert!(matches!(
        &errors[0],
        ConfigError::Validation { key, .. } if key == "source.batch_cap"
    ));
}

#[test]
fn env_overrides_local_file() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "ferry.toml",
            r#"
[source]
batch_cap = 100

[delivery]
endpoint_url = "http://file.example/collect"
"#,
        )?;
        jail.set_env("FERRY_SOURCE_BATCH_CAP", "42");
        jail.set_env("FERRY_DELIVERY_CHECKPOINT_POLICY", "contiguous_success");

        let config = load_config()?;
        assert_eq!(config.source.batch_cap, 42);
        assert_eq!(config.delivery.endpoint_url, "http://file.example/collect");
        assert_eq!(
            config.delivery.checkpoint_policy,
            CheckpointPolicy::ContiguousSuccess
        );
        Ok(())
    });
}

#[test]
fn env_keys_with_underscores_map_to_section_fields() {
    Jail::expect_with(|jail| {
        jail.set_env("FERRY_SCHEDULE_RUN_ON_START", "false");
        jail.set_env("FERRY_STORAGE_DATABASE_PATH", "/tmp/ferry-state.db");

        let config = load_config()?;
        assert!(!config.schedule.run_on_start);
        assert_eq!(config.storage.database_path, "/tmp/ferry-state.db");
        Ok(())
    });
}

#[test]
fn diagnostics_render_without_panicking() {
    let errors = load_and_validate_str("[delivery]\nwokers = 3\n").unwrap_err();
    let handler = miette::GraphicalReportHandler::new();
    let mut out = String::new();
    handler
        .render_report(&mut out, &errors[0])
        .expect("render should succeed");
    assert!(out.contains("workers"), "help should suggest workers: {out}");
}
