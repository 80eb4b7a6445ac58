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


pub(crate) mod test_lib {
    pub(crate) mod mocks {
        use async_trait::async_trait;
        use mockall::{mock, predicate::eq};
        use std::collections::VecDeque;
        use std::sync::{
            atomic::{AtomicUsize, Ordering},
            Arc, Mutex,
        };
        use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

        use crate::datamodel::Node;
        use crate::persistence::{PersistenceError, SnapshotStore};
        use crate::transport::{MtpConnector, MtpSink, MtpStream, TransportError};
        use crate::usp::{
            Add, AddResp, Delete, DeleteResp, Get, GetResp, Msg, NotifyResp, Operate,
            OperateResp, Set, SetResp,
        };
        use crate::{
            MessageSender, MessageSenderHolder, MockMessageSender, UspError, UspListener,
            UspService, UspServiceAbstract,
        };

        mock! {
            pub UspAgentMock {}
            #[async_trait]
            impl UspService for UspAgentMock {
                async fn get(&self, request: Get) -> Result<GetResp, UspError>;
                async fn set(&self, request: Set) -> Result<SetResp, UspError>;
                async fn add(&self, request: Add) -> Result<AddResp, UspError>;
                async fn delete(&self, request: Delete) -> Result<DeleteResp, UspError>;
                async fn operate(&self, request: Operate) -> Result<OperateResp, UspError>;
                async fn operation_completed(&self, request: Operate) -> Result<(), UspError>;
                async fn notify_response(&self, msg_id: String, response: NotifyResp) -> Result<(), UspError>;
            }
            impl MessageSenderHolder for UspAgentMock {
                fn get_message_sender(&self) -> Arc<dyn MessageSender>;
            }
            impl UspServiceAbstract for UspAgentMock {}
        }

        // Service mock whose message sender expects exactly the given messages, each once
        pub(crate) fn usp_agent_mock_for_listener_tests(
            expected_messages: Vec<Msg>,
        ) -> MockUspAgentMock {
            let mut sender_mock = MockMessageSender::new();
            for expected in expected_messages {
                sender_mock
                    .expect_send()
                    .with(eq(expected))
                    .times(1)
                    .returning(|_| Ok(()));
            }
            let sender: Arc<dyn MessageSender> = Arc::new(sender_mock);

            let mut usp_agent_mock = MockUspAgentMock::new();
            usp_agent_mock
                .expect_get_message_sender()
                .returning(move || sender.clone());
            usp_agent_mock
        }

        /// Message sender handing everything it gets to a channel
        pub(crate) struct ChannelSender {
            sent: UnboundedSender<Msg>,
        }

        impl ChannelSender {
            pub(crate) fn new() -> (Self, UnboundedReceiver<Msg>) {
                let (sent, receiver) = mpsc::unbounded_channel();
                (ChannelSender { sent }, receiver)
            }
        }

        #[async_trait]
        impl MessageSender for ChannelSender {
            async fn send(&self, msg: Msg) -> Result<(), UspError> {
                self.sent.send(msg).map_err(|_| UspError::OutboundClosed)
            }
        }

        /// Listener handing everything it gets to a channel
        pub(crate) struct ChannelListener {
            received: UnboundedSender<Msg>,
        }

        impl ChannelListener {
            pub(crate) fn new() -> (Self, UnboundedReceiver<Msg>) {
                let (received, receiver) = mpsc::unbounded_channel();
                (ChannelListener { received }, receiver)
            }
        }

        #[async_trait]
        impl UspListener for ChannelListener {
            async fn on_receive(&self, msg: Msg) {
                let _r = self.received.send(msg);
            }
        }

        /// Snapshot store starting from a given tree and recording every save
        #[derive(Default)]
        pub(crate) struct RecordingSnapshotStore {
            initial: Node,
            saved: Mutex<Vec<Node>>,
        }

        impl RecordingSnapshotStore {
            pub(crate) fn with_tree(initial: Node) -> Self {
                RecordingSnapshotStore {
                    initial,
                    saved: Mutex::new(vec![]),
                }
            }

            pub(crate) fn saved(&self) -> Vec<Node> {
                self.saved.lock().map(|s| s.clone()).unwrap_or_default()
            }
        }

        impl SnapshotStore for RecordingSnapshotStore {
            fn load(&self) -> Result<Node, PersistenceError> {
                Ok(self.initial.clone())
            }

            fn save(&self, tree: &Node) -> Result<(), PersistenceError> {
                if let Ok(mut saved) = self.saved.lock() {
                    saved.push(tree.clone());
                }
                Ok(())
            }
        }

        /// How a scripted fake connection behaves once established
        #[derive(Clone, Copy, Debug, Default)]
        pub(crate) struct SinkBehavior {
            pub(crate) failing_ping: bool,
            pub(crate) stalled_writes: bool,
        }

        /// Test-side ends of one established fake connection
        pub(crate) struct FakeConnection {
            /// push inbound frames; dropping it closes the connection from the peer side
            pub(crate) inbound: UnboundedSender<Vec<u8>>,
            /// frames the connection manager wrote
            pub(crate) written: UnboundedReceiver<Vec<u8>>,
        }

        struct FakeSink {
            written: UnboundedSender<Vec<u8>>,
            behavior: SinkBehavior,
        }

        #[async_trait]
        impl MtpSink for FakeSink {
            async fn send_frame(&mut self, frame: Vec<u8>) -> Result<(), TransportError> {
                if self.behavior.stalled_writes {
                    std::future::pending::<()>().await;
                }
                self.written
                    .send(frame)
                    .map_err(|e| TransportError::Write(e.to_string()))
            }

            async fn ping(&mut self) -> Result<(), TransportError> {
                if self.behavior.failing_ping {
                    return Err(TransportError::Heartbeat("no pong".to_string()));
                }
                Ok(())
            }

            async fn close(&mut self) -> Result<(), TransportError> {
                Ok(())
            }
        }

        struct FakeStream {
            inbound: UnboundedReceiver<Vec<u8>>,
        }

        #[async_trait]
        impl MtpStream for FakeStream {
            async fn next_frame(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
                Ok(self.inbound.recv().await)
            }
        }

        type Connection = (Box<dyn MtpSink>, Box<dyn MtpStream>);

        /// Connector playing back a script of connection attempt outcomes; once the script is
        /// exhausted every further attempt fails.
        #[derive(Default)]
        pub(crate) struct ScriptedConnector {
            script: Mutex<VecDeque<Result<Connection, TransportError>>>,
            attempts: AtomicUsize,
        }

        impl ScriptedConnector {
            pub(crate) fn fail(&self) {
                self.push(Err(TransportError::Connect("connection refused".to_string())));
            }

            pub(crate) fn succeed(&self, behavior: SinkBehavior) -> FakeConnection {
                let (inbound, inbound_receiver) = mpsc::unbounded_channel();
                let (written_sender, written) = mpsc::unbounded_channel();
                self.push(Ok((
                    Box::new(FakeSink {
                        written: written_sender,
                        behavior,
                    }),
                    Box::new(FakeStream {
                        inbound: inbound_receiver,
                    }),
                )));
                FakeConnection { inbound, written }
            }

            pub(crate) fn attempts(&self) -> usize {
                self.attempts.load(Ordering::SeqCst)
            }

            fn push(&self, outcome: Result<Connection, TransportError>) {
                if let Ok(mut script) = self.script.lock() {
                    script.push_back(outcome);
                }
            }
        }

        #[async_trait]
        impl MtpConnector for ScriptedConnector {
            async fn connect(&self) -> Result<Connection, TransportError> {
                self.attempts.fetch_add(1, Ordering::SeqCst);
                let next = self.script.lock().ok().and_then(|mut s| s.pop_front());
                next.unwrap_or_else(|| Err(TransportError::Connect("script exhausted".to_string())))
            }
        }
    }

    pub(crate) mod helpers {
        use std::collections::BTreeMap;
        use std::sync::Arc;

        use crate::datamodel::Node;
        use crate::usp::{self, notify::Notification, request::ReqType, Msg};
        use crate::UspAgentConfiguration;

        pub(crate) const AGENT_ENDPOINT_ID: &str = "proto::agent-under-test";
        pub(crate) const SERVER_URL: &str = "ws://127.0.0.1:8080/usp";

        pub(crate) fn test_config() -> Arc<UspAgentConfiguration> {
            let mut config =
                UspAgentConfiguration::new(SERVER_URL, AGENT_ENDPOINT_ID, "/tmp/unused.json");
            config.max_reconnect_attempts = 3;
            config.validate().unwrap()
        }

        pub(crate) fn object<const N: usize>(children: [(&str, Node); N]) -> Node {
            Node::Object(
                children
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v))
                    .collect::<BTreeMap<_, _>>(),
            )
        }

        /// `Device.WiFi.Radio.{1,2}.` plus an empty subscription table
        pub(crate) fn device_tree() -> Node {
            object([(
                "Device",
                object([
                    (
                        "WiFi",
                        object([(
                            "Radio",
                            object([
                                (
                                    "1",
                                    object([
                                        ("Alias", Node::leaf("radio-2g")),
                                        ("Enabled", Node::leaf("false")),
                                        ("Channel", Node::leaf("6")),
                                    ]),
                                ),
                                (
                                    "2",
                                    object([
                                        ("Alias", Node::leaf("radio-5g")),
                                        ("Enabled", Node::leaf("true")),
                                        ("Channel", Node::leaf("36")),
                                    ]),
                                ),
                            ]),
                        )]),
                    ),
                    ("LocalAgent", object([("Subscription", object([]))])),
                ]),
            )])
        }

        /// Subscription id and notification of an outbound Notify message
        pub(crate) fn notification_of(msg: &Msg) -> Option<(String, Notification)> {
            match usp::request_body(msg)? {
                ReqType::Notify(notify) => Some((
                    notify.subscription_id.clone(),
                    notify.notification.clone()?,
                )),
                _ => None,
            }
        }
    }
}
