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
use std::sync::Arc;

use crate::listeners::dispatcher::{reject, respond};
use crate::usp::{self, request::ReqType, response::RespType, Msg};
use crate::{UspListener, UspServiceAbstract};

#[derive(Clone)]
pub struct OperateListener {
    usp_agent: Arc<dyn UspServiceAbstract>,
}

impl OperateListener {
    pub fn new(usp_agent: Arc<dyn UspServiceAbstract>) -> Self {
        OperateListener { usp_agent }
    }
}

#[async_trait]
impl UspListener for OperateListener {
    // The operation result goes out first, anything the command triggers afterwards
    async fn on_receive(&self, msg: Msg) {
        let Some(ReqType::Operate(request)) = usp::request_body(&msg).cloned() else {
            return reject(self.usp_agent.as_ref(), "OPERATE", &msg).await;
        };
        let msg_id = usp::msg_id(&msg);
        info!(
            "[USP] OPERATE request: msgId={msg_id}, command={}",
            request.command
        );

        let result = self
            .usp_agent
            .operate(request.clone())
            .await
            .map(RespType::OperateResp);
        let accepted = result.is_ok();
        respond(self.usp_agent.as_ref(), "OPERATE", msg_id, result).await;

        if accepted {
            if let Err(e) = self.usp_agent.operation_completed(request).await {
                error!("[USP] OPERATE follow-up failed: msgId={msg_id}, err={e}");
            }
        }
    }
}
