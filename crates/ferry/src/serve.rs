// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `ferry serve` and `ferry run-once` command implementations.
//!
//! Both open the state database and the message store, build the export
//! pipeline and then either hand it to the resident service or run a single
//! scan.

use std::sync::Arc;

use ferry_agent::{
    CheckpointStore, ExportPipeline, ExportService, Inbox, LifecycleRunner, SystemdLiveness,
    Trigger, shutdown,
};
use ferry_config::FerryConfig;
use ferry_core::{Component, FerryError, HealthStatus, LifecycleMode, RunSummary};
use ferry_delivery::{Dispatcher, HttpDeliveryClient};
use ferry_scheduler::{TokioAlarmService, WakeScheduler};
use ferry_storage::{SqliteMessageSource, SqliteStateStore};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Wake signals buffered while a scan is running.
const WAKE_CHANNEL_CAPACITY: usize = 4;

pub(crate) async fn open_state(config: &FerryConfig) -> Result<Arc<SqliteStateStore>, FerryError> {
    let state = SqliteStateStore::new(config.storage.clone());
    state.initialize().await?;
    Ok(Arc::new(state))
}

async fn log_health(component: &dyn Component) {
    match component.health_check().await {
        Ok(HealthStatus::Healthy) => info!(component = component.name(), "healthy"),
        Ok(HealthStatus::Degraded(reason)) => {
            warn!(component = component.name(), reason = %reason, "degraded")
        }
        Ok(HealthStatus::Unhealthy(reason)) => {
            warn!(component = component.name(), reason = %reason, "unhealthy")
        }
        Err(e) => warn!(component = component.name(), error = %e, "health check failed"),
    }
}

async fn build_pipeline(
    config: &FerryConfig,
    state: Arc<SqliteStateStore>,
) -> Result<ExportPipeline, FerryError> {
    let source = Arc::new(SqliteMessageSource::new(&config.source));
    let client = Arc::new(HttpDeliveryClient::new(&config.delivery)?);

    log_health(state.as_ref()).await;
    log_health(source.as_ref()).await;
    log_health(client.as_ref()).await;

    info!(
        source = config.source.database_path.as_str(),
        endpoint = client.endpoint(),
        workers = config.delivery.workers,
        policy = %config.delivery.checkpoint_policy,
        "export pipeline configured"
    );

    Ok(ExportPipeline::new(
        source,
        Dispatcher::from_config(client, &config.delivery),
        CheckpointStore::new(state.clone()),
        config.source.batch_cap,
    )
    .with_journal(state))
}

/// Runs the `ferry serve` command.
///
/// In `resident` mode this recovers the wake schedule and serves wakes until
/// SIGINT/SIGTERM. In `one_shot` mode it performs a single activation and exits.
pub async fn run_serve(config: FerryConfig) -> Result<(), FerryError> {
    init_tracing(&config.agent.log_level);
    info!(agent_name = config.agent.name.as_str(), "starting ferry");

    let state = open_state(&config).await?;
    let pipeline = Arc::new(build_pipeline(&config, state.clone()).await?);

    let (request_tx, requests) = mpsc::channel(WAKE_CHANNEL_CAPACITY);
    let runner = Arc::new(LifecycleRunner::new(
        pipeline,
        Arc::new(SystemdLiveness::new()),
        &config.lifecycle,
        request_tx,
    ));

    if runner.mode() == LifecycleMode::OneShot {
        let disposition = runner.on_activate(Trigger::Startup).await;
        info!(disposition = %disposition, "one-shot activation started");
        runner.drain(config.lifecycle.drain_timeout()).await;
        return state.close().await;
    }

    let (alarms, wakes) = TokioAlarmService::channel(WAKE_CHANNEL_CAPACITY);
    let alarms = Arc::new(alarms);
    let scheduler = Arc::new(WakeScheduler::new(
        alarms.clone(),
        state.clone(),
        &config.schedule,
    ));

    let cancel = shutdown::install_signal_handler();
    let service = ExportService::new(runner, scheduler, &config.schedule, &config.lifecycle);
    let outcome = service.run(Inbox { wakes, requests }, cancel).await;

    alarms.cancel_all();
    if let Err(e) = state.close().await {
        error!(error = %e, "failed to close state database");
    }
    info!("ferry stopped");
    outcome
}

/// Runs the `ferry run-once` command.
pub async fn run_once(config: FerryConfig) -> Result<(), FerryError> {
    init_tracing(&config.agent.log_level);

    let state = open_state(&config).await?;
    let pipeline = build_pipeline(&config, state.clone()).await?;
    let result = pipeline.run_once().await;
    state.close().await?;

    let summary = result?;
    println!("{}", describe(&summary));
    Ok(())
}

fn describe(summary: &RunSummary) -> String {
    let checkpoint = summary
        .checkpoint_after
        .map(|id| id.to_string())
        .unwrap_or_else(|| "none".to_string());
    format!(
        "{}: read {}, delivered {}, failed {}, checkpoint {}",
        summary.status, summary.records_read, summary.delivered, summary.failed, checkpoint
    )
}

/// Initialize the tracing subscriber with an env filter.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("ferry={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
