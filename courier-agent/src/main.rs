//! Courier Agent
//!
//! Long-polls the orchestrator for the instances it serves, runs the steps
//! of every dispatched execution and ships step reports back.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

use courier_agent::config::Config;
use courier_agent::logging::init_logging;
use courier_agent::repository::{ExecutionRepository, HttpExecutionRepository};
use courier_agent::scheduler::ExecutionPoller;
use courier_agent::service::ProcessRunner;
use courier_client::OrchestratorClient;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate()?;

    // Held for the whole run; dropping it flushes the log file
    let _logging = init_logging(&config.log_dir).context("Failed to initialize logging")?;

    info!("Starting Courier Agent '{}'", config.agent_name);
    info!(
        "Loaded configuration: orchestrator_url={}, instances={}",
        config.orchestrator_url,
        config
            .instances
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );

    let http = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .build()
        .context("Failed to build HTTP client")?;
    let client = Arc::new(OrchestratorClient::with_client(
        config.orchestrator_url.clone(),
        http,
    ));
    let repository: Arc<dyn ExecutionRepository> = Arc::new(HttpExecutionRepository::new(client));

    info!("Orchestrator client initialized");

    let cancel = CancellationToken::new();
    let poller = ExecutionPoller::start(config, repository, Arc::new(ProcessRunner), cancel.clone());

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown requested");
                cancel.cancel();
            }
            Err(e) => tracing::error!("Failed to listen for shutdown signal: {}", e),
        }
    });

    poller.run().await;

    info!("Courier Agent stopped");
    Ok(())
}
