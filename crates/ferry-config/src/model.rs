// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Ferry export pipeline.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use ferry_core::{CheckpointPolicy, LifecycleMode, PayloadEncoding};
use serde::{Deserialize, Serialize};

/// Top-level Ferry configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FerryConfig {
    /// Process identity and logging.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Local message store to export from.
    #[serde(default)]
    pub source: SourceConfig,

    /// Ferry's own state database (checkpoint, wake plan, run history).
    #[serde(default)]
    pub storage: StorageConfig,

    /// Remote collector settings.
    #[serde(default)]
    pub delivery: DeliveryConfig,

    /// Wake schedule.
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Runner lifecycle.
    #[serde(default)]
    pub lifecycle: LifecycleConfig,
}

/// Process identity configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Name used in logs.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "ferry".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Local message store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    /// Path to the SQLite message store. Opened read-only.
    #[serde(default = "default_source_path")]
    pub database_path: String,

    /// Maximum records read per activation.
    #[serde(default = "default_batch_cap")]
    pub batch_cap: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            database_path: default_source_path(),
            batch_cap: default_batch_cap(),
        }
    }
}

fn default_source_path() -> String {
    data_file("messages.db")
}

fn default_batch_cap() -> usize {
    500
}

/// Upper bound accepted for `source.batch_cap`.
pub const MAX_BATCH_CAP: usize = 5000;

/// State database configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    data_file("ferry.db")
}

fn default_wal_mode() -> bool {
    true
}

fn data_file(name: &str) -> String {
    dirs::data_dir()
        .map(|p| p.join("ferry").join(name))
        .unwrap_or_else(|| std::path::PathBuf::from(name))
        .to_string_lossy()
        .into_owned()
}

/// Remote collector configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DeliveryConfig {
    /// Collector URL that receives one POST per record.
    #[serde(default = "default_endpoint_url")]
    pub endpoint_url: String,

    /// Body encoding (`form` or `json`).
    #[serde(default)]
    pub encoding: PayloadEncoding,

    /// TCP/TLS connect timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Whole-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Number of concurrent deliveries per batch.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// How the checkpoint moves past failed records.
    #[serde(default)]
    pub checkpoint_policy: CheckpointPolicy,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            endpoint_url: default_endpoint_url(),
            encoding: PayloadEncoding::default(),
            connect_timeout_secs: default_timeout_secs(),
            request_timeout_secs: default_timeout_secs(),
            workers: default_workers(),
            checkpoint_policy: CheckpointPolicy::default(),
        }
    }
}

impl DeliveryConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_endpoint_url() -> String {
    "http://127.0.0.1:8080/collect".to_string()
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_workers() -> usize {
    2
}

/// Wake schedule configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduleConfig {
    /// Delay from a cold start to the bootstrap alarm.
    #[serde(default = "default_initial_delay_secs")]
    pub initial_delay_secs: u64,

    /// Period of the repeating cadence alarm.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Run one activation immediately when the service starts.
    #[serde(default = "default_run_on_start")]
    pub run_on_start: bool,

    /// Entry point name shared by both alarm registrations.
    #[serde(default = "default_entrypoint")]
    pub entrypoint: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            initial_delay_secs: default_initial_delay_secs(),
            interval_secs: default_interval_secs(),
            run_on_start: default_run_on_start(),
            entrypoint: default_entrypoint(),
        }
    }
}

impl ScheduleConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_secs(self.initial_delay_secs)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

fn default_initial_delay_secs() -> u64 {
    9 * 60 * 60
}

fn default_interval_secs() -> u64 {
    24 * 60 * 60
}

fn default_run_on_start() -> bool {
    true
}

fn default_entrypoint() -> String {
    "ferry.export".to_string()
}

/// Runner lifecycle configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LifecycleConfig {
    /// `resident` keeps the runner alive between wakes, `one_shot` exits after one scan.
    #[serde(default)]
    pub mode: LifecycleMode,

    /// Host channel the keep-alive notice is posted on.
    #[serde(default = "default_notice_channel")]
    pub notice_channel: String,

    #[serde(default = "default_notice_title")]
    pub notice_title: String,

    #[serde(default = "default_notice_text")]
    pub notice_text: String,

    /// Delay before the supervisor restarts a crashed runner.
    #[serde(default = "default_restart_backoff_secs")]
    pub restart_backoff_secs: u64,

    /// How long shutdown waits for an in-flight scan.
    #[serde(default = "default_drain_timeout_secs")]
    pub drain_timeout_secs: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            mode: LifecycleMode::default(),
            notice_channel: default_notice_channel(),
            notice_title: default_notice_title(),
            notice_text: default_notice_text(),
            restart_backoff_secs: default_restart_backoff_secs(),
            drain_timeout_secs: default_drain_timeout_secs(),
        }
    }
}

impl LifecycleConfig {
    pub fn restart_backoff(&self) -> Duration {
        Duration::from_secs(self.restart_backoff_secs)
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout_secs)
    }
}

fn default_notice_channel() -> String {
    "ferry_export".to_string()
}

fn default_notice_title() -> String {
    "Ferry".to_string()
}

fn default_notice_text() -> String {
    "Exporting messages".to_string()
}

fn default_restart_backoff_secs() -> u64 {
    5
}

fn default_drain_timeout_secs() -> u64 {
    30
}
