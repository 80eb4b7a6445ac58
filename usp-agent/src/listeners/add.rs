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
pub struct AddListener {
    usp_agent: Arc<dyn UspServiceAbstract>,
}

impl AddListener {
    pub fn new(usp_agent: Arc<dyn UspServiceAbstract>) -> Self {
        AddListener { usp_agent }
    }
}

#[async_trait]
impl UspListener for AddListener {
    async fn on_receive(&self, msg: Msg) {
        let Some(ReqType::Add(request)) = usp::request_body(&msg).cloned() else {
            return reject(self.usp_agent.as_ref(), "ADD", &msg).await;
        };
        let msg_id = usp::msg_id(&msg);
        info!(
            "[USP] ADD request: msgId={msg_id}, objects={}",
            request.create_objs.len()
        );

        let result = self.usp_agent.add(request).await.map(RespType::AddResp);
        respond(self.usp_agent.as_ref(), "ADD", msg_id, result).await;
    }
}
