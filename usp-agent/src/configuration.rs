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

use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Default data model command channel and outbound queue size
pub(crate) const DEFAULT_COMMAND_BUFFER_SIZE: usize = 1024;

pub const DEFAULT_CONTROLLER_ID: &str = "usp-controller-ws";
pub const DEFAULT_PROTOCOL_VERSION: &str = "1.0";
pub const DEFAULT_HEARTBEAT_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 1024 * 1024;
pub const DEFAULT_RECONNECT_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;
pub const DEFAULT_WRITE_COUNT_THRESHOLD: u32 = 10;
pub const DEFAULT_FLUSH_INTERVAL_SECS: u64 = 30;

#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Configuration error: {0}")]
    Invalid(String),
    #[error("Error reading configuration file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Error parsing configuration file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ConfigurationError {
    pub fn new<T>(message: T) -> ConfigurationError
    where
        T: Into<String>,
    {
        ConfigurationError::Invalid(message.into())
    }
}

fn default_controller_id() -> String {
    DEFAULT_CONTROLLER_ID.to_string()
}
fn default_protocol_version() -> String {
    DEFAULT_PROTOCOL_VERSION.to_string()
}
fn default_heartbeat_interval_secs() -> u64 {
    DEFAULT_HEARTBEAT_INTERVAL_SECS
}
fn default_max_message_size() -> usize {
    DEFAULT_MAX_MESSAGE_SIZE
}
fn default_buffer_size() -> usize {
    DEFAULT_COMMAND_BUFFER_SIZE
}
fn default_reconnect_interval_secs() -> u64 {
    DEFAULT_RECONNECT_INTERVAL_SECS
}
fn default_max_reconnect_attempts() -> u32 {
    DEFAULT_MAX_RECONNECT_ATTEMPTS
}
fn default_write_count_threshold() -> u32 {
    DEFAULT_WRITE_COUNT_THRESHOLD
}
fn default_flush_interval_secs() -> u64 {
    DEFAULT_FLUSH_INTERVAL_SECS
}

/// Settings for a USP agent instance, as read from a JSON configuration file.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct UspAgentConfiguration {
    /// WebSocket URL of the controller's MTP endpoint (`ws://` or `wss://`)
    pub server_url: String,
    /// Our own USP endpoint id, also passed to the server as `eid` query parameter
    pub endpoint_id: String,
    #[serde(default = "default_controller_id")]
    pub controller_id: String,
    #[serde(default = "default_protocol_version")]
    pub protocol_version: String,
    #[serde(default = "default_heartbeat_interval_secs")]
    pub heartbeat_interval_secs: u64,
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
    #[serde(default = "default_buffer_size")]
    pub outbound_queue_capacity: usize,
    #[serde(default = "default_buffer_size")]
    pub command_buffer: usize,
    #[serde(default = "default_reconnect_interval_secs")]
    pub reconnect_interval_secs: u64,
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,
    /// JSON file the parameter tree is loaded from and flushed to
    pub snapshot_path: String,
    #[serde(default = "default_write_count_threshold")]
    pub write_count_threshold: u32,
    #[serde(default = "default_flush_interval_secs")]
    pub flush_interval_secs: u64,
}

impl UspAgentConfiguration {
    /// Configuration with every optional setting at its default.
    pub fn new<T>(server_url: T, endpoint_id: T, snapshot_path: T) -> UspAgentConfiguration
    where
        T: Into<String>,
    {
        UspAgentConfiguration {
            server_url: server_url.into(),
            endpoint_id: endpoint_id.into(),
            controller_id: default_controller_id(),
            protocol_version: default_protocol_version(),
            heartbeat_interval_secs: DEFAULT_HEARTBEAT_INTERVAL_SECS,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            outbound_queue_capacity: DEFAULT_COMMAND_BUFFER_SIZE,
            command_buffer: DEFAULT_COMMAND_BUFFER_SIZE,
            reconnect_interval_secs: DEFAULT_RECONNECT_INTERVAL_SECS,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            snapshot_path: snapshot_path.into(),
            write_count_threshold: DEFAULT_WRITE_COUNT_THRESHOLD,
            flush_interval_secs: DEFAULT_FLUSH_INTERVAL_SECS,
        }
    }

    /// Read an (unvalidated) configuration from a JSON file.
    pub fn from_file<P>(path: P) -> Result<UspAgentConfiguration, ConfigurationError>
    where
        P: AsRef<Path>,
    {
        let path_name = path.as_ref().display().to_string();
        let content = std::fs::read_to_string(&path).map_err(|source| ConfigurationError::Io {
            path: path_name.clone(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigurationError::Parse {
            path: path_name,
            source,
        })
    }

    /// Validate all settings and turn this into the "immutable" (Arc) form used by the agent.
    /// Buffer sizes are clamped to 1..=DEFAULT_COMMAND_BUFFER_SIZE rather than rejected.
    ///
    /// # Errors
    ///
    /// Returns a ConfigurationError naming the first offending setting.
    pub fn validate(mut self) -> Result<Arc<UspAgentConfiguration>, ConfigurationError> {
        self.server_url = self.server_url.trim().to_string();
        if self.server_url.is_empty() {
            return Err(ConfigurationError::new("server_url must not be empty"));
        }
        if !(self.server_url.starts_with("ws://") || self.server_url.starts_with("wss://")) {
            return Err(ConfigurationError::new(format!(
                "server_url must use a ws:// or wss:// scheme, got {}",
                self.server_url
            )));
        }
        for (name, value) in [
            ("endpoint_id", &self.endpoint_id),
            ("controller_id", &self.controller_id),
            ("protocol_version", &self.protocol_version),
            ("snapshot_path", &self.snapshot_path),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigurationError::new(format!("{name} must not be empty")));
            }
        }
        for (name, value) in [
            ("heartbeat_interval_secs", self.heartbeat_interval_secs),
            ("max_message_size", self.max_message_size as u64),
            ("reconnect_interval_secs", self.reconnect_interval_secs),
            ("max_reconnect_attempts", self.max_reconnect_attempts as u64),
            ("write_count_threshold", self.write_count_threshold as u64),
            ("flush_interval_secs", self.flush_interval_secs),
        ] {
            if value == 0 {
                return Err(ConfigurationError::new(format!(
                    "{name} must be greater than 0"
                )));
            }
        }

        self.outbound_queue_capacity = self
            .outbound_queue_capacity
            .clamp(1, DEFAULT_COMMAND_BUFFER_SIZE);
        self.command_buffer = self.command_buffer.clamp(1, DEFAULT_COMMAND_BUFFER_SIZE);

        Ok(Arc::new(self))
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_secs(self.reconnect_interval_secs)
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn good() -> UspAgentConfiguration {
        UspAgentConfiguration::new(
            "ws://127.0.0.1:8080/usp",
            "os::012345-ABCDEF",
            "/tmp/usp-agent-tree.json",
        )
    }

    #[test]
    fn test_parse_with_defaults() {
        let config: UspAgentConfiguration = serde_json::from_str(
            r#"{
                "server_url": "ws://127.0.0.1:8080/usp",
                "endpoint_id": "os::012345-ABCDEF",
                "snapshot_path": "/tmp/usp-agent-tree.json"
            }"#,
        )
        .unwrap();
        assert_eq!(config, good());
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let result = serde_json::from_str::<UspAgentConfiguration>(
            r#"{"server_url": "ws://a", "endpoint_id": "e", "snapshot_path": "s", "colour": "red"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_clamps_buffers() {
        let mut config = good();
        config.outbound_queue_capacity = 0;
        config.command_buffer = 100000;

        let config = config.validate().unwrap();
        assert_eq!(config.outbound_queue_capacity, 1);
        assert_eq!(config.command_buffer, DEFAULT_COMMAND_BUFFER_SIZE);
    }

    #[test_case(|c: &mut UspAgentConfiguration| c.server_url = "  ".to_string(); "empty server url")]
    #[test_case(|c: &mut UspAgentConfiguration| c.server_url = "http://x".to_string(); "wrong scheme")]
    #[test_case(|c: &mut UspAgentConfiguration| c.endpoint_id = String::new(); "empty endpoint id")]
    #[test_case(|c: &mut UspAgentConfiguration| c.snapshot_path = String::new(); "empty snapshot path")]
    #[test_case(|c: &mut UspAgentConfiguration| c.heartbeat_interval_secs = 0; "zero heartbeat")]
    #[test_case(|c: &mut UspAgentConfiguration| c.max_reconnect_attempts = 0; "zero reconnect attempts")]
    #[test_case(|c: &mut UspAgentConfiguration| c.write_count_threshold = 0; "zero write threshold")]
    fn test_validate_rejects(change: fn(&mut UspAgentConfiguration)) {
        let mut config = good();
        change(&mut config);
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::Invalid(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            UspAgentConfiguration::from_file("/nonexistent/usp-agent.json"),
            Err(ConfigurationError::Io { .. })
        ));
    }
}
