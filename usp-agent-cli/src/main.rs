/********************************************************************************
 * Copyright (c) 2024 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

use clap::Parser;
use clap_num::number_range;
#[cfg(unix)]
use daemonize::Daemonize;
use log::*;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::signal;

use usp_agent::{
    transport::WebSocketConnector, ConfigurationError, ConnectionManager, JsonFileSnapshot,
    UspAgent, UspAgentConfiguration, UspDispatcher,
};

// Snapshot file used when neither configuration file nor command line name one
const DEFAULT_SNAPSHOT_PATH: &str = "usp-agent-datamodel.json";

fn between_1_and_1024(s: &str) -> Result<usize, String> {
    number_range(s, 1, 1024)
}

#[derive(Debug)]
pub enum StartupError {
    ConfigurationError(String),
    AgentError(String),
    RuntimeError(String),
}

impl From<ConfigurationError> for StartupError {
    fn from(e: ConfigurationError) -> Self {
        Self::ConfigurationError(e.to_string())
    }
}

impl std::fmt::Display for StartupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConfigurationError(e) => f.write_fmt(format_args!("Configuration error: {}", e)),
            Self::AgentError(e) => f.write_fmt(format_args!("Agent error: {}", e)),
            Self::RuntimeError(e) => f.write_fmt(format_args!("Runtime error: {}", e)),
        }
    }
}

impl std::error::Error for StartupError {}

// All our args
#[derive(Parser, Debug)]
#[command(version, about = "Rust implementation of a USP (TR-369) agent endpoint.", long_about = None)]
pub(crate) struct Args {
    /// JSON configuration file; command line settings take precedence over its content
    #[arg(short, long, env = "USP_AGENT_CONFIG")]
    config: Option<PathBuf>,

    /// WebSocket URL of the USP controller (ws:// or wss://)
    #[arg(short, long)]
    server_url: Option<String>,

    /// Endpoint id of this agent
    #[arg(short, long)]
    endpoint_id: Option<String>,

    /// Endpoint id of the USP controller
    #[arg(long)]
    controller_id: Option<String>,

    /// File the data model is loaded from and persisted to
    #[arg(long)]
    snapshot: Option<String>,

    /// Capacity of the outbound message queue - minimum 1, maximum 1024, defaults to 1024
    #[arg(short, long, value_parser=between_1_and_1024)]
    queue_capacity: Option<usize>,

    /// Run as a daemon (in the background)
    #[arg(short, long, default_value_t = false)]
    daemon: bool,

    /// Increase verbosity of output
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Setup logging, get configuration
    std::env::set_var("RUST_LOG", "info");
    if args.verbose {
        std::env::set_var("RUST_LOG", "trace");
    }
    usp_agent::init_once();

    let config = match config_from_args(&args) {
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
        Ok(config) => config,
    };

    // Fork before any runtime threads exist
    if args.daemon {
        if let Err(e) = daemonize() {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Err(e) => {
            error!("Error setting up tokio runtime: {e}");
            return ExitCode::FAILURE;
        }
        Ok(runtime) => runtime,
    };

    match runtime.block_on(run(config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(unix)]
fn daemonize() -> Result<(), StartupError> {
    Daemonize::new()
        .start()
        .map(|_| debug!("Success, daemonized"))
        .map_err(|e| StartupError::RuntimeError(e.to_string()))
}

#[cfg(not(unix))]
fn daemonize() -> Result<(), StartupError> {
    warn!("Running as daemon is not supported on this platform, staying in foreground");
    Ok(())
}

// Run agent and connection until the connection manager gives up or we are told to stop
async fn run(config: Arc<UspAgentConfiguration>) -> Result<(), StartupError> {
    let snapshot_store = Arc::new(JsonFileSnapshot::new(&config.snapshot_path));
    let (agent, mut stopper, outbound) = UspAgent::run(config.clone(), snapshot_store)
        .await
        .map_err(|e| StartupError::AgentError(e.to_string()))?;

    let connection_manager = ConnectionManager::new(
        config.clone(),
        Arc::new(WebSocketConnector::new(&config)),
        Arc::new(UspDispatcher::new(agent)),
        stopper.shutdown(),
    );

    let shutdown = stopper.shutdown();
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Stopping USP agent");
                shutdown.trigger();
            }
            Err(e) => error!("Failed to listen for shutdown signal: {e}"),
        }
    });

    info!(
        "USP agent {} running, controller at {}",
        config.endpoint_id, config.server_url
    );
    let result = connection_manager.run(outbound).await;

    stopper.stop().await;
    result.map_err(|e| StartupError::AgentError(e.to_string()))
}

fn config_from_args(args: &Args) -> Result<Arc<UspAgentConfiguration>, StartupError> {
    let mut config = match &args.config {
        Some(path) => UspAgentConfiguration::from_file(path)?,
        None => {
            let (Some(server_url), Some(endpoint_id)) = (&args.server_url, &args.endpoint_id)
            else {
                return Err(StartupError::ConfigurationError(
                    "either --config or both --server-url and --endpoint-id are required"
                        .to_string(),
                ));
            };
            UspAgentConfiguration::new(
                server_url.clone(),
                endpoint_id.clone(),
                DEFAULT_SNAPSHOT_PATH.to_string(),
            )
        }
    };

    if let Some(server_url) = &args.server_url {
        config.server_url = server_url.clone();
    }
    if let Some(endpoint_id) = &args.endpoint_id {
        config.endpoint_id = endpoint_id.clone();
    }
    if let Some(controller_id) = &args.controller_id {
        config.controller_id = controller_id.clone();
    }
    if let Some(snapshot) = &args.snapshot {
        config.snapshot_path = snapshot.clone();
    }
    if let Some(queue_capacity) = args.queue_capacity {
        config.outbound_queue_capacity = queue_capacity;
    }

    Ok(config.validate()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn parse(cmdline: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("usp-agent").chain(cmdline.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_config_from_command_line() {
        let args = parse(&[
            "--server-url",
            "ws://controller:8080/usp",
            "--endpoint-id",
            "os::0001",
            "--controller-id",
            "proto::ctrl",
            "--queue-capacity",
            "16",
        ]);
        let config = config_from_args(&args).unwrap();
        assert_eq!(config.server_url, "ws://controller:8080/usp");
        assert_eq!(config.endpoint_id, "os::0001");
        assert_eq!(config.controller_id, "proto::ctrl");
        assert_eq!(config.outbound_queue_capacity, 16);
        assert_eq!(config.snapshot_path, DEFAULT_SNAPSHOT_PATH);
    }

    #[test]
    fn test_config_file_with_overrides() {
        let path = std::env::temp_dir().join(format!("usp-agent-cli-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{"server_url": "ws://file:1/usp", "endpoint_id": "os::file", "snapshot_path": "/tmp/dm.json"}"#,
        )
        .unwrap();

        let path_arg = path.display().to_string();
        let args = parse(&["--config", &path_arg, "--endpoint-id", "os::cli"]);
        let config = config_from_args(&args).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.server_url, "ws://file:1/usp");
        assert_eq!(config.endpoint_id, "os::cli");
        assert_eq!(config.snapshot_path, "/tmp/dm.json");
    }

    #[test_case(&["--endpoint-id", "os::0001"]; "missing server url")]
    #[test_case(&["--server-url", "http://controller/usp", "--endpoint-id", "os::0001"]; "wrong scheme")]
    fn test_config_errors(cmdline: &[&str]) {
        let args = parse(cmdline);
        assert!(matches!(
            config_from_args(&args),
            Err(StartupError::ConfigurationError(_))
        ));
    }

    #[test_case("0"; "below range")]
    #[test_case("1025"; "above range")]
    fn test_queue_capacity_range(capacity: &str) {
        let result = Args::try_parse_from([
            "usp-agent",
            "--server-url",
            "ws://controller/usp",
            "--endpoint-id",
            "os::0001",
            "--queue-capacity",
            capacity,
        ]);
        assert!(result.is_err());
    }
}
