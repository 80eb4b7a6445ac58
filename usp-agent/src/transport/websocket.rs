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

use async_trait::async_trait;
use futures::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use log::*;
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async_with_config,
    tungstenite::{
        client::IntoClientRequest, http::HeaderValue, protocol::WebSocketConfig, Message,
    },
    MaybeTlsStream, WebSocketStream,
};

use crate::transport::{MtpConnector, MtpSink, MtpStream, TransportError};
use crate::UspAgentConfiguration;

/// WebSocket subprotocol token of the USP WebSocket MTP
pub const USP_SUBPROTOCOL: &str = "v1.usp";

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Controller URL with our endpoint id attached as `eid` query parameter
pub fn endpoint_url(server_url: &str, endpoint_id: &str) -> String {
    let separator = if server_url.contains('?') { '&' } else { '?' };
    format!("{server_url}{separator}eid={endpoint_id}")
}

/// Connects to the controller's WebSocket MTP endpoint
#[derive(Clone, Debug)]
pub struct WebSocketConnector {
    url: String,
    max_message_size: usize,
}

impl WebSocketConnector {
    pub fn new(config: &UspAgentConfiguration) -> Self {
        WebSocketConnector {
            url: endpoint_url(&config.server_url, &config.endpoint_id),
            max_message_size: config.max_message_size,
        }
    }
}

#[async_trait]
impl MtpConnector for WebSocketConnector {
    async fn connect(&self) -> Result<(Box<dyn MtpSink>, Box<dyn MtpStream>), TransportError> {
        let mut request = self
            .url
            .as_str()
            .into_client_request()
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        request.headers_mut().insert(
            "Sec-WebSocket-Protocol",
            HeaderValue::from_static(USP_SUBPROTOCOL),
        );

        let ws_config = WebSocketConfig::default()
            .max_message_size(Some(self.max_message_size))
            .max_frame_size(Some(self.max_message_size));

        debug!("Connecting to {}", self.url);
        let (socket, response) = connect_async_with_config(request, Some(ws_config), false)
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        let negotiated = response
            .headers()
            .get("Sec-WebSocket-Protocol")
            .and_then(|v| v.to_str().ok());
        if negotiated != Some(USP_SUBPROTOCOL) {
            return Err(TransportError::Connect(format!(
                "Server did not accept subprotocol {USP_SUBPROTOCOL}"
            )));
        }

        let (write, read) = socket.split();
        Ok((
            Box::new(WebSocketSink { write }),
            Box::new(WebSocketFrames { read }),
        ))
    }
}

struct WebSocketSink {
    write: SplitSink<Socket, Message>,
}

#[async_trait]
impl MtpSink for WebSocketSink {
    async fn send_frame(&mut self, frame: Vec<u8>) -> Result<(), TransportError> {
        self.write
            .send(Message::binary(frame))
            .await
            .map_err(|e| TransportError::Write(e.to_string()))
    }

    async fn ping(&mut self) -> Result<(), TransportError> {
        self.write
            .send(Message::Ping(Default::default()))
            .await
            .map_err(|e| TransportError::Heartbeat(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.write
            .close()
            .await
            .map_err(|e| TransportError::Write(e.to_string()))
    }
}

struct WebSocketFrames {
    read: SplitStream<Socket>,
}

#[async_trait]
impl MtpStream for WebSocketFrames {
    async fn next_frame(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        while let Some(message) = self.read.next().await {
            match message.map_err(|e| TransportError::Read(e.to_string()))? {
                Message::Binary(data) => return Ok(Some(data.to_vec())),
                Message::Text(text) => return Ok(Some(text.as_str().as_bytes().to_vec())),
                Message::Close(frame) => {
                    debug!("Controller closed the connection: {frame:?}");
                    return Ok(None);
                }
                // control frames are answered by tungstenite itself
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("ws://127.0.0.1:8080/usp", "os::0001" => "ws://127.0.0.1:8080/usp?eid=os::0001"; "plain url")]
    #[test_case("wss://ctrl/usp?tenant=a", "os::0001" => "wss://ctrl/usp?tenant=a&eid=os::0001"; "url with query")]
    fn test_endpoint_url(server_url: &str, endpoint_id: &str) -> String {
        endpoint_url(server_url, endpoint_id)
    }

    #[test]
    fn test_connector_from_configuration() {
        let mut config =
            UspAgentConfiguration::new("ws://localhost:9000/usp", "proto::agent", "/tmp/t.json");
        config.max_message_size = 4096;
        let connector = WebSocketConnector::new(&config);
        assert_eq!(connector.url, "ws://localhost:9000/usp?eid=proto::agent");
        assert_eq!(connector.max_message_size, 4096);
    }

    #[tokio::test]
    async fn test_connect_refused() {
        // nothing listens on port 9 (discard) in a test environment
        let config =
            UspAgentConfiguration::new("ws://127.0.0.1:9/usp", "proto::agent", "/tmp/t.json");
        let result = WebSocketConnector::new(&config).connect().await;
        assert!(matches!(result, Err(TransportError::Connect(_))));
    }
}
