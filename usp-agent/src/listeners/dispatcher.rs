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

use crate::listeners::{
    AddListener, DeleteListener, GetListener, NotifyRespListener, OperateListener, SetListener,
};
use crate::usp::{self, header::MsgType, response::RespType, Msg};
use crate::{UspError, UspServiceAbstract};

/// Consumer of decoded inbound USP messages
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UspListener: Send + Sync {
    async fn on_receive(&self, msg: Msg);
}

/// Routes each inbound message to the listener registered for its message type.
pub struct UspDispatcher {
    listeners: HashMap<MsgType, Arc<dyn UspListener>>,
}

impl UspDispatcher {
    /// Set up all listeners of the USP agent
    pub fn new(usp_agent: Arc<dyn UspServiceAbstract>) -> Self {
        let mut listeners: HashMap<MsgType, Arc<dyn UspListener>> = HashMap::new();
        listeners.insert(MsgType::Get, Arc::new(GetListener::new(usp_agent.clone())));
        listeners.insert(MsgType::Set, Arc::new(SetListener::new(usp_agent.clone())));
        listeners.insert(MsgType::Add, Arc::new(AddListener::new(usp_agent.clone())));
        listeners.insert(
            MsgType::Delete,
            Arc::new(DeleteListener::new(usp_agent.clone())),
        );
        listeners.insert(
            MsgType::Operate,
            Arc::new(OperateListener::new(usp_agent.clone())),
        );
        listeners.insert(
            MsgType::NotifyResp,
            Arc::new(NotifyRespListener::new(usp_agent)),
        );
        UspDispatcher { listeners }
    }
}

#[async_trait]
impl UspListener for UspDispatcher {
    async fn on_receive(&self, msg: Msg) {
        let msg_type = usp::msg_type(&msg);
        match self.listeners.get(&msg_type) {
            Some(listener) => listener.on_receive(msg).await,
            None => info!(
                "[USP] ignoring {msg_type:?} message: msgId={}",
                usp::msg_id(&msg)
            ),
        }
    }
}

// Answer the request `msg_id` with either the response body or a USP Error message
pub(crate) async fn respond(
    usp_agent: &dyn UspServiceAbstract,
    operation: &str,
    msg_id: &str,
    result: Result<RespType, UspError>,
) {
    let message = match result {
        Ok(body) => usp::response(msg_id, body),
        Err(e) => {
            error!("[USP] {operation} error: msgId={msg_id}, err={e}");
            usp::error_message(msg_id, e.err_code(), e.to_string())
        }
    };
    if let Err(e) = usp_agent.get_message_sender().send(message).await {
        error!("[USP] {operation} response not sent: msgId={msg_id}, err={e}");
    }
}

// Reply to a message whose body does not fit its header
pub(crate) async fn reject(usp_agent: &dyn UspServiceAbstract, operation: &str, msg: &Msg) {
    respond(
        usp_agent,
        operation,
        usp::msg_id(msg),
        Err(UspError::InvalidMessage(format!(
            "{operation} message without {operation} body"
        ))),
    )
    .await;
}
