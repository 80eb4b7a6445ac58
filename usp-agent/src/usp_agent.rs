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
use log::*;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::{
    sync::{
        mpsc::{self, Receiver, Sender},
        oneshot,
    },
    task::JoinHandle,
};

use crate::datamodel::{ParameterTree, ResolvedParams};
use crate::datamodel_manager::{self, DataModelEvent, PersistenceSettings};
use crate::notification_manager::{self, NotificationEvent};
use crate::persistence::{PersistenceError, SnapshotStore};
use crate::subscription::{ChangeEvent, PathValidationError, SubscriptionEntry};
use crate::usp::{
    self, add_resp, delete_resp, get_resp, notify, operate_resp, set_resp, Add, AddResp, Delete,
    DeleteResp, Get, GetResp, Msg, NotifyResp, Operate, OperateResp, Set, SetResp,
};
use crate::{helpers, Shutdown, UspAgentConfiguration};

/// Object path below which each instance is one subscription of the controller
pub const SUBSCRIPTION_ROOT: &str = "Device.LocalAgent.Subscription.";
// Deleting any of these wipes every subscription at once
const SUBSCRIPTION_PARENT_PATHS: [&str; 3] =
    ["Device.", "Device.LocalAgent.", SUBSCRIPTION_ROOT];

/// The only command `Operate` knows how to execute
pub const DEVICE_REBOOT_COMMAND: &str = "Device.Reboot()";
/// Request object handed out for an accepted reboot
pub const REBOOT_REQUEST_PATH: &str = "Device.LocalAgent.Request.1";

#[derive(Clone, Debug, thiserror::Error)]
pub enum UspError {
    #[error("Error communicating with data model management: {0}")]
    DataModel(String),
    #[error("Outbound message queue is closed")]
    OutboundClosed,
    #[error("Malformed message: {0}")]
    InvalidMessage(String),
    #[error(transparent)]
    Persistence(Arc<PersistenceError>),
}

impl UspError {
    /// USP error code to report to the controller
    pub fn err_code(&self) -> u32 {
        match self {
            UspError::InvalidMessage(_) => usp::ERR_MESSAGE_FAILED,
            _ => usp::ERR_INTERNAL_ERROR,
        }
    }
}

impl From<PersistenceError> for UspError {
    fn from(e: PersistenceError) -> Self {
        UspError::Persistence(Arc::new(e))
    }
}

/// Single exit point for every message leaving the agent, be it a response or a notification.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, msg: Msg) -> Result<(), UspError>;
}

/// Wraps each message into a session-less record and queues the encoded frame for the connection manager.
pub struct RecordSender {
    config: Arc<UspAgentConfiguration>,
    queue: Sender<Vec<u8>>,
}

impl RecordSender {
    pub fn new(config: Arc<UspAgentConfiguration>, queue: Sender<Vec<u8>>) -> Self {
        RecordSender { config, queue }
    }
}

#[async_trait]
impl MessageSender for RecordSender {
    async fn send(&self, msg: Msg) -> Result<(), UspError> {
        let frame = usp::encode_no_session_record(
            &self.config.protocol_version,
            &self.config.endpoint_id,
            &self.config.controller_id,
            &msg,
        );
        trace!(
            "Queueing {:?} message {} ({} bytes)",
            usp::msg_type(&msg),
            usp::msg_id(&msg),
            frame.len()
        );
        self.queue
            .send(frame)
            .await
            .map_err(|_| UspError::OutboundClosed)
    }
}

/// The USP operations an agent offers to its controller, each taking the typed request body and
/// producing the typed response body.
#[async_trait]
pub trait UspService: Send + Sync {
    async fn get(&self, request: Get) -> Result<GetResp, UspError>;
    async fn set(&self, request: Set) -> Result<SetResp, UspError>;
    async fn add(&self, request: Add) -> Result<AddResp, UspError>;
    async fn delete(&self, request: Delete) -> Result<DeleteResp, UspError>;
    async fn operate(&self, request: Operate) -> Result<OperateResp, UspError>;
    /// Follow-up of an answered Operate request, e.g. the Boot! event after a reboot.
    async fn operation_completed(&self, request: Operate) -> Result<(), UspError>;
    async fn notify_response(&self, msg_id: String, response: NotifyResp) -> Result<(), UspError>;
}

/// This trait (and the comprised MessageSenderHolder trait) is simply there to have a generic type that
/// listeners deal with, so that UspAgent can be properly mocked.
pub trait UspServiceAbstract: UspService + MessageSenderHolder {}

/// Hook-point for mocking `UspAgent` objects together with a custom/mock `MessageSender`.
pub trait MessageSenderHolder {
    fn get_message_sender(&self) -> Arc<dyn MessageSender>;
}

impl MessageSenderHolder for UspAgent {
    fn get_message_sender(&self) -> Arc<dyn MessageSender> {
        self.message_sender.clone()
    }
}

/// This object holds all mutable content associated with a running `UspAgent`, and is populated and returned when
/// calling `UspAgent::run()`. Stopping it flushes the data model snapshot and waits for both actors to finish.
pub struct UspAgentStopper {
    shutdown: Shutdown,
    datamodel_joiner: Option<JoinHandle<()>>,
    notification_joiner: Option<JoinHandle<()>>,
}

impl UspAgentStopper {
    pub async fn stop(&mut self) {
        self.shutdown.trigger();

        for (name, joiner) in [
            ("data model", self.datamodel_joiner.take()),
            ("notification", self.notification_joiner.take()),
        ] {
            match joiner {
                Some(joiner) => {
                    if let Err(e) = joiner.await {
                        error!("Error shutting down {name} manager: {e}");
                    }
                }
                None => debug!("{name} manager already stopped"),
            }
        }
    }

    /// The cancellation signal shared by the agent's tasks
    pub fn shutdown(&self) -> Shutdown {
        self.shutdown.clone()
    }
}

/// Core landing point of the USP business logic, front-ended by the `listeners`.
///
/// Data model access and subscription matching happen in the data model manager actor; outbound notifications
/// are sent by the notification manager actor. This object only translates between USP bodies and actor events,
/// and triggers the side effects of Add and Delete on the subscription registry.
#[derive(Clone)]
pub struct UspAgent {
    message_sender: Arc<dyn MessageSender>,

    datamodel_sender: Sender<DataModelEvent>,
    notification_sender: Sender<NotificationEvent>,
}

impl UspServiceAbstract for UspAgent {}

impl UspAgent {
    /// Start a new UspAgent: load the data model snapshot and spin up the data model and notification actors.
    ///
    /// # Arguments
    ///
    /// * `config` - The validated configuration for this agent
    /// * `snapshot_store` - Where the data model is loaded from and persisted to
    ///
    /// # Returns
    ///
    /// * the immutable parts of the agent inside an Arc
    /// * a `UspAgentStopper` object which can be used to explicitly shut down the agent
    /// * the receiving end of the outbound frame queue, to be drained by the connection manager
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be loaded.
    #[allow(clippy::type_complexity)]
    pub async fn run(
        config: Arc<UspAgentConfiguration>,
        snapshot_store: Arc<dyn SnapshotStore>,
    ) -> Result<
        (
            Arc<dyn UspServiceAbstract>,
            UspAgentStopper,
            Receiver<Vec<u8>>,
        ),
        UspError,
    > {
        helpers::init_once();

        // the file store retries with blocking pauses, keep that off the runtime's workers
        let store = snapshot_store.clone();
        let tree = tokio::task::spawn_blocking(move || store.load())
            .await
            .map_err(|e| UspError::DataModel(format!("Snapshot load task failed: {e}")))?
            .map(ParameterTree::from)?;
        let shutdown = Shutdown::new();

        let (outbound_sender, outbound_receiver) =
            mpsc::channel::<Vec<u8>>(config.outbound_queue_capacity);
        let message_sender: Arc<dyn MessageSender> =
            Arc::new(RecordSender::new(config.clone(), outbound_sender));

        // Set up notification manager actor
        let message_sender_cloned = message_sender.clone();
        let shutdown_cloned = shutdown.clone();
        let (notification_sender, notification_receiver) =
            mpsc::channel::<NotificationEvent>(config.command_buffer);
        let notification_joiner = helpers::spawn_and_log_error(async move {
            notification_manager::notification_engine(
                message_sender_cloned,
                notification_receiver,
                shutdown_cloned,
            )
            .await;
            Ok(())
        });

        // Set up data model manager actor
        let persistence = PersistenceSettings {
            store: snapshot_store,
            write_count_threshold: config.write_count_threshold,
            flush_interval: config.flush_interval(),
        };
        let notification_sender_cloned = notification_sender.clone();
        let shutdown_cloned = shutdown.clone();
        let (datamodel_sender, datamodel_receiver) =
            mpsc::channel::<DataModelEvent>(config.command_buffer);
        let datamodel_joiner = helpers::spawn_and_log_error(async move {
            datamodel_manager::handle_message(
                tree,
                persistence,
                notification_sender_cloned,
                datamodel_receiver,
                shutdown_cloned,
            )
            .await;
            Ok(())
        });

        Ok((
            Arc::new(UspAgent {
                message_sender,
                datamodel_sender,
                notification_sender,
            }),
            UspAgentStopper {
                shutdown,
                datamodel_joiner: Some(datamodel_joiner),
                notification_joiner: Some(notification_joiner),
            },
            outbound_receiver,
        ))
    }

    // Send one event to the data model manager and wait for its answer
    async fn datamodel_request<T>(
        &self,
        make_event: impl FnOnce(oneshot::Sender<T>) -> DataModelEvent,
    ) -> Result<T, UspError> {
        let (respond_to, receive_from) = oneshot::channel::<T>();
        self.datamodel_sender
            .send(make_event(respond_to))
            .await
            .map_err(|e| UspError::DataModel(e.to_string()))?;
        receive_from
            .await
            .map_err(|e| UspError::DataModel(e.to_string()))
    }

    // Raise a change event; matching and fan-out happen in the data model manager
    async fn notify_change(&self, event: ChangeEvent) {
        if let Err(e) = self
            .datamodel_sender
            .send(DataModelEvent::Notify { event })
            .await
        {
            // Not returning an error here, notifications are not a core concern of the triggering request
            error!("Error raising data model change event: {e}");
        }
    }

    async fn set_value(
        &self,
        object_path: &str,
        key: &str,
        value: &str,
    ) -> Result<bool, UspError> {
        self.datamodel_request(|respond_to| DataModelEvent::SetValue {
            object_path: object_path.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            respond_to,
        })
        .await
    }

    // Returns whether the settings made up a valid subscription that is now registered
    async fn register_subscription(
        &self,
        settings: &HashMap<String, String>,
    ) -> Result<bool, UspError> {
        let entry = match SubscriptionEntry::from_settings(settings) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("[USP] ADD subscription registration error: {e}");
                return Ok(false);
            }
        };
        let registered: Result<(), PathValidationError> = self
            .datamodel_request(|respond_to| DataModelEvent::AddSubscription { entry, respond_to })
            .await?;
        if let Err(e) = &registered {
            warn!("[USP] ADD subscription registration error: {e}");
        }
        Ok(registered.is_ok())
    }

    // Side effects of deleting subscription objects; must run while the object is still in the tree
    async fn before_delete(&self, path: &str) -> Result<(), UspError> {
        if SUBSCRIPTION_PARENT_PATHS.contains(&path) {
            self.datamodel_request(|respond_to| DataModelEvent::ResetSubscriptions { respond_to })
                .await?;
        } else if is_subscription_instance_path(path) {
            let reference_list = self
                .datamodel_request(|respond_to| DataModelEvent::GetValue {
                    path: format!("{path}ReferenceList"),
                    respond_to,
                })
                .await?;
            match reference_list {
                Some(pattern) => {
                    self.datamodel_request(|respond_to| DataModelEvent::RemoveSubscription {
                        pattern,
                        respond_to,
                    })
                    .await?;
                }
                None => warn!("Subscription {path} has no ReferenceList, nothing to unregister"),
            }
        }
        Ok(())
    }
}

// `Device.LocalAgent.Subscription.<n>.` with n a positive integer without leading zeros
pub(crate) fn is_subscription_instance_path(path: &str) -> bool {
    path.strip_prefix(SUBSCRIPTION_ROOT)
        .and_then(|rest| rest.strip_suffix('.'))
        .is_some_and(|instance| {
            !instance.is_empty()
                && !instance.starts_with('0')
                && instance.bytes().all(|b| b.is_ascii_digit())
        })
}

fn boot_event() -> notify::Notification {
    let params = [
        ("CommandKey", ""),
        ("Cause", "RemoteReboot"),
        ("Reason", ""),
        ("FirmwareUpdated", "false"),
        ("ParameterMap", ""),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    notify::Notification::Event(notify::Event {
        obj_path: "Device.".to_string(),
        event_name: "Boot!".to_string(),
        params,
    })
}

#[async_trait]
impl UspService for UspAgent {
    async fn get(&self, request: Get) -> Result<GetResp, UspError> {
        let Get { param_paths, .. } = request;
        debug!("Got Get request for {param_paths:?}");

        let results = self
            .datamodel_request(|respond_to| DataModelEvent::Get {
                paths: param_paths,
                respond_to,
            })
            .await?;

        let req_path_results = results
            .into_iter()
            .map(|(requested_path, resolved)| get_resp::RequestedPathResult {
                requested_path,
                err_code: 0,
                err_msg: String::new(),
                resolved_path_results: resolved
                    .into_iter()
                    .map(|ResolvedParams { resolved_path, params }| get_resp::ResolvedPathResult {
                        resolved_path,
                        result_params: params,
                    })
                    .collect(),
            })
            .collect();

        Ok(GetResp { req_path_results })
    }

    async fn set(&self, request: Set) -> Result<SetResp, UspError> {
        use set_resp::updated_object_result::{operation_status, OperationStatus};

        let mut updated_obj_results = Vec::with_capacity(request.update_objs.len());
        for update in request.update_objs {
            let existing = self
                .datamodel_request(|respond_to| DataModelEvent::IsExistPath {
                    path: update.obj_path.clone(),
                    respond_to,
                })
                .await?;
            let Some(affected_path) = existing else {
                debug!("Set target {} not found, skipping", update.obj_path);
                continue;
            };

            let mut updated_params = HashMap::new();
            for setting in update.param_settings {
                let changed = self
                    .set_value(&affected_path, &setting.param, &setting.value)
                    .await?;
                if changed {
                    self.notify_change(ChangeEvent::ValueChange {
                        param_path: format!("{affected_path}{}", setting.param),
                        param_value: setting.value.clone(),
                    })
                    .await;
                }
                updated_params.insert(setting.param, setting.value);
            }

            updated_obj_results.push(set_resp::UpdatedObjectResult {
                requested_path: update.obj_path,
                oper_status: Some(OperationStatus {
                    oper_status: Some(operation_status::OperStatus::OperSuccess(
                        operation_status::OperationSuccess {
                            updated_inst_results: vec![set_resp::UpdatedInstanceResult {
                                affected_path,
                                param_errs: vec![],
                                updated_params,
                            }],
                        },
                    )),
                }),
            });
        }

        Ok(SetResp {
            updated_obj_results,
        })
    }

    async fn add(&self, request: Add) -> Result<AddResp, UspError> {
        use add_resp::created_object_result::{operation_status, OperationStatus};

        let mut created_obj_results = Vec::with_capacity(request.create_objs.len());
        for create in request.create_objs {
            let instantiated_path = self
                .datamodel_request(|respond_to| DataModelEvent::NewInstance {
                    object_path: create.obj_path.clone(),
                    respond_to,
                })
                .await?;

            let mut unique_keys = HashMap::new();
            for setting in create.param_settings {
                self.set_value(&instantiated_path, &setting.param, &setting.value)
                    .await?;
                unique_keys.insert(setting.param, setting.value);
            }

            // A subscription object that could not be registered stays in the tree, but is not announced
            let announce = if create.obj_path == SUBSCRIPTION_ROOT {
                self.register_subscription(&unique_keys).await?
            } else {
                true
            };
            if announce {
                self.notify_change(ChangeEvent::ObjectCreation {
                    obj_path: instantiated_path.clone(),
                    unique_keys: unique_keys.clone(),
                })
                .await;
            }

            created_obj_results.push(add_resp::CreatedObjectResult {
                requested_path: create.obj_path,
                oper_status: Some(OperationStatus {
                    oper_status: Some(operation_status::OperStatus::OperSuccess(
                        operation_status::OperationSuccess {
                            instantiated_path,
                            param_errs: vec![],
                            unique_keys,
                        },
                    )),
                }),
            });
        }

        Ok(AddResp {
            created_obj_results,
        })
    }

    async fn delete(&self, request: Delete) -> Result<DeleteResp, UspError> {
        use delete_resp::deleted_object_result::{operation_status, OperationStatus};

        let mut deleted_obj_results = Vec::with_capacity(request.obj_paths.len());
        for path in request.obj_paths {
            self.before_delete(&path).await?;

            let deleted = self
                .datamodel_request(|respond_to| DataModelEvent::Delete {
                    path: path.clone(),
                    respond_to,
                })
                .await?;
            let affected_path = deleted.unwrap_or_else(|| path.clone());

            self.notify_change(ChangeEvent::ObjectDeletion {
                obj_path: affected_path.clone(),
            })
            .await;

            deleted_obj_results.push(delete_resp::DeletedObjectResult {
                requested_path: path,
                oper_status: Some(OperationStatus {
                    oper_status: Some(operation_status::OperStatus::OperSuccess(
                        operation_status::OperationSuccess {
                            affected_paths: vec![affected_path],
                            unaffected_path_errs: vec![],
                        },
                    )),
                }),
            });
        }

        Ok(DeleteResp {
            deleted_obj_results,
        })
    }

    async fn operate(&self, request: Operate) -> Result<OperateResp, UspError> {
        use operate_resp::operation_result::{CommandFailure, OperationResp};

        let operation_resp = match request.command.as_str() {
            DEVICE_REBOOT_COMMAND => {
                info!("Accepted reboot request (command key '{}')", request.command_key);
                OperationResp::ReqObjPath(REBOOT_REQUEST_PATH.to_string())
            }
            other => {
                warn!("Unsupported command {other}");
                OperationResp::CmdFailure(CommandFailure {
                    err_code: usp::ERR_COMMAND_FAILURE,
                    err_msg: format!("Unsupported command: {other}"),
                })
            }
        };

        Ok(OperateResp {
            operation_results: vec![operate_resp::OperationResult {
                executed_command: request.command,
                operation_resp: Some(operation_resp),
            }],
        })
    }

    async fn operation_completed(&self, request: Operate) -> Result<(), UspError> {
        if request.command != DEVICE_REBOOT_COMMAND {
            return Ok(());
        }
        self.notification_sender
            .send(NotificationEvent::Notify {
                subscription_id: String::new(),
                notification: boot_event(),
            })
            .await
            .map_err(|e| UspError::DataModel(e.to_string()))
    }

    async fn notify_response(&self, msg_id: String, response: NotifyResp) -> Result<(), UspError> {
        self.notification_sender
            .send(NotificationEvent::NotifyResponse {
                msg_id,
                subscription_id: response.subscription_id,
            })
            .await
            .map_err(|e| UspError::DataModel(e.to_string()))
    }
}
