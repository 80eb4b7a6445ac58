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

//! Message transfer protocol (MTP) seam: a duplex channel of binary frames, each carrying one encoded USP record.

use async_trait::async_trait;
use std::time::Duration;

mod websocket;
pub use websocket::{endpoint_url, WebSocketConnector, USP_SUBPROTOCOL};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Connecting to controller failed: {0}")]
    Connect(String),
    #[error("Reading from connection failed: {0}")]
    Read(String),
    #[error("Writing to connection failed: {0}")]
    Write(String),
    #[error("Heartbeat failed: {0}")]
    Heartbeat(String),
    #[error("Write did not complete within {0:?}")]
    Timeout(Duration),
    #[error("Connection closed by peer")]
    Closed,
    #[error("Giving up after {0} failed connection attempts")]
    RetriesExhausted(u32),
}

/// Establishes new connections to the controller
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MtpConnector: Send + Sync {
    async fn connect(&self) -> Result<(Box<dyn MtpSink>, Box<dyn MtpStream>), TransportError>;
}

/// Sending half of a connection
#[async_trait]
pub trait MtpSink: Send {
    async fn send_frame(&mut self, frame: Vec<u8>) -> Result<(), TransportError>;
    /// Liveness probe
    async fn ping(&mut self) -> Result<(), TransportError>;
    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Receiving half of a connection
#[async_trait]
pub trait MtpStream: Send {
    /// Next inbound frame, `None` once the peer closed the connection
    async fn next_frame(&mut self) -> Result<Option<Vec<u8>>, TransportError>;
}
