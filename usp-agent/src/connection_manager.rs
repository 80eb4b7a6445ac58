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

use log::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{
    mpsc::{self, Receiver, Sender},
    watch, Mutex,
};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, timeout, Instant, MissedTickBehavior};

use crate::transport::{MtpConnector, MtpSink, MtpStream, TransportError};
use crate::usp::Msg;
use crate::{helpers, usp, Shutdown, UspAgentConfiguration, UspListener};

/// Upper bound for handing one frame (or heartbeat probe) to the transport
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

/// Published on every state transition
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConnectionStatus {
    pub state: ConnectionState,
    /// Consecutive failed connection attempts, reset by every successful connect
    pub failed_attempts: u32,
}

// Why a connected session ended
enum SessionEnd {
    Shutdown,
    Lost(TransportError),
}

/// Owns the connection to the controller: connects, runs reader, writer and heartbeat while connected,
/// and reconnects on a fixed interval until the attempt budget is used up.
///
/// All outbound frames come from one queue which only the writer drains, so frames hit the wire in the
/// order they were queued and never interleave. Decoded inbound messages are handled one at a time by a
/// dispatch task which outlives the sessions, so a dropped connection never cancels a half-done request.
pub struct ConnectionManager {
    config: Arc<UspAgentConfiguration>,
    connector: Arc<dyn MtpConnector>,
    inbound: Arc<dyn UspListener>,
    shutdown: Shutdown,
    status: watch::Sender<ConnectionStatus>,
}

impl ConnectionManager {
    /// # Arguments
    ///
    /// * `config` - Heartbeat, reconnect and frame size settings
    /// * `connector` - Transport used to (re)establish connections
    /// * `inbound` - Receives every successfully decoded inbound message
    /// * `shutdown` - Ends all loops when triggered; triggered by this manager once it gives up
    pub fn new(
        config: Arc<UspAgentConfiguration>,
        connector: Arc<dyn MtpConnector>,
        inbound: Arc<dyn UspListener>,
        shutdown: Shutdown,
    ) -> Self {
        let (status, _) = watch::channel(ConnectionStatus {
            state: ConnectionState::Disconnected,
            failed_attempts: 0,
        });
        ConnectionManager {
            config,
            connector,
            inbound,
            shutdown,
            status,
        }
    }

    pub fn status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.subscribe()
    }

    fn publish(&self, state: ConnectionState, failed_attempts: u32) {
        debug!("Connection state {state:?} (failed attempts: {failed_attempts})");
        self.status.send_replace(ConnectionStatus {
            state,
            failed_attempts,
        });
    }

    /// Keep the controller connection up until shutdown, draining `outbound` whenever connected.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::RetriesExhausted` after `max_reconnect_attempts` consecutive failed
    /// connection attempts; the shared shutdown signal has been triggered by then.
    pub async fn run(&self, mut outbound: Receiver<Vec<u8>>) -> Result<(), TransportError> {
        helpers::init_once();

        let (inbound, dispatch_joiner) = self.spawn_inbound_dispatch();
        let result = self.connect_loop(&inbound, &mut outbound).await;

        // let requests already handed over run to completion; their responses fail fast once
        // the outbound queue is gone
        drop(inbound);
        drop(outbound);
        if let Err(e) = dispatch_joiner.await {
            error!("Inbound dispatch task failed: {e}");
        }
        result
    }

    // Hand inbound messages to the listener in arrival order, independent of any session
    fn spawn_inbound_dispatch(&self) -> (Sender<Msg>, JoinHandle<()>) {
        let (sender, mut receiver) = mpsc::channel::<Msg>(self.config.command_buffer);
        let listener = self.inbound.clone();
        let joiner = helpers::spawn_and_log_error(async move {
            while let Some(msg) = receiver.recv().await {
                listener.on_receive(msg).await;
            }
            debug!("Inbound dispatch stopped");
            Ok(())
        });
        (sender, joiner)
    }

    async fn connect_loop(
        &self,
        inbound: &Sender<Msg>,
        outbound: &mut Receiver<Vec<u8>>,
    ) -> Result<(), TransportError> {
        let max_attempts = self.config.max_reconnect_attempts;
        let mut failed_attempts = 0;
        let mut state = ConnectionState::Connecting;

        loop {
            self.publish(state, failed_attempts);
            let connected = tokio::select! {
                result = self.connector.connect() => result,
                _ = self.shutdown.triggered() => break,
            };

            match connected {
                Ok((sink, stream)) => {
                    failed_attempts = 0;
                    self.publish(ConnectionState::Connected, failed_attempts);
                    info!("Connected to controller at {}", self.config.server_url);

                    let end = self.run_session(sink, stream, inbound, outbound).await;
                    self.publish(ConnectionState::Disconnected, failed_attempts);
                    match end {
                        SessionEnd::Shutdown => break,
                        SessionEnd::Lost(e) => warn!("Connection to controller lost: {e}"),
                    }
                }
                Err(e) => {
                    failed_attempts += 1;
                    self.publish(ConnectionState::Disconnected, failed_attempts);
                    warn!("Connection attempt {failed_attempts}/{max_attempts} failed: {e}");
                    if failed_attempts >= max_attempts {
                        error!("Giving up on controller {}", self.config.server_url);
                        self.shutdown.trigger();
                        return Err(TransportError::RetriesExhausted(failed_attempts));
                    }
                }
            }

            state = ConnectionState::Reconnecting;
            self.publish(state, failed_attempts);
            tokio::select! {
                _ = sleep(self.config.reconnect_interval()) => {},
                _ = self.shutdown.triggered() => break,
            }
        }

        self.publish(ConnectionState::Disconnected, failed_attempts);
        info!("Connection manager stopped");
        Ok(())
    }

    async fn run_session(
        &self,
        sink: Box<dyn MtpSink>,
        mut stream: Box<dyn MtpStream>,
        inbound: &Sender<Msg>,
        outbound: &mut Receiver<Vec<u8>>,
    ) -> SessionEnd {
        // shared by writer and heartbeat, which thereby never write concurrently
        let sink = Mutex::new(sink);

        let reader = async {
            loop {
                match stream.next_frame().await {
                    Ok(Some(frame)) => self.handle_frame(&frame, inbound).await,
                    Ok(None) => return TransportError::Closed,
                    Err(e) => return e,
                }
            }
        };

        let writer = async {
            while let Some(frame) = outbound.recv().await {
                let mut sink = sink.lock().await;
                match timeout(WRITE_TIMEOUT, sink.send_frame(frame)).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => return Some(e),
                    Err(_) => return Some(TransportError::Timeout(WRITE_TIMEOUT)),
                }
            }
            None
        };

        let heartbeat = async {
            let period = self.config.heartbeat_interval();
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let mut sink = sink.lock().await;
                match timeout(WRITE_TIMEOUT, sink.ping()).await {
                    Ok(Ok(())) => trace!("Heartbeat sent"),
                    Ok(Err(e)) => return e,
                    Err(_) => return TransportError::Timeout(WRITE_TIMEOUT),
                }
            }
        };

        let end = tokio::select! {
            e = reader => SessionEnd::Lost(e),
            e = writer => match e {
                Some(e) => SessionEnd::Lost(e),
                None => {
                    info!("Outbound queue closed, agent is gone");
                    SessionEnd::Shutdown
                }
            },
            e = heartbeat => SessionEnd::Lost(e),
            _ = self.shutdown.triggered() => SessionEnd::Shutdown,
        };

        match timeout(WRITE_TIMEOUT, sink.lock().await.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!("Error closing connection: {e}"),
            Err(_) => debug!("Closing connection timed out"),
        }
        end
    }

    // Decode one frame and queue the message for dispatch; bad frames are dropped
    async fn handle_frame(&self, frame: &[u8], inbound: &Sender<Msg>) {
        if frame.len() > self.config.max_message_size {
            warn!(
                "Dropping frame of {} bytes, exceeds maximum of {}",
                frame.len(),
                self.config.max_message_size
            );
            return;
        }
        match usp::decode_frame(frame) {
            Ok((record, msg)) => {
                debug!(
                    "[USP] received {:?} message: msgId={}, from={}",
                    usp::msg_type(&msg),
                    usp::msg_id(&msg),
                    record.from_id
                );
                if inbound.send(msg).await.is_err() {
                    error!("Inbound dispatch is gone, dropping message");
                }
            }
            Err(e) => warn!("Dropping undecodable frame of {} bytes: {e}", frame.len()),
        }
    }
}
