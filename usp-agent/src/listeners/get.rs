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
pub struct GetListener {
    usp_agent: Arc<dyn UspServiceAbstract>,
}

impl GetListener {
    pub fn new(usp_agent: Arc<dyn UspServiceAbstract>) -> Self {
        GetListener { usp_agent }
    }
}

#[async_trait]
impl UspListener for GetListener {
    // Best-effort read of all requested paths, unresolvable ones come back without results
    async fn on_receive(&self, msg: Msg) {
        let Some(ReqType::Get(request)) = usp::request_body(&msg).cloned() else {
            return reject(self.usp_agent.as_ref(), "GET", &msg).await;
        };
        let msg_id = usp::msg_id(&msg);
        info!("[USP] GET request: msgId={msg_id}, paths={:?}", request.param_paths);

        let result = self.usp_agent.get(request).await.map(RespType::GetResp);
        respond(self.usp_agent.as_ref(), "GET", msg_id, result).await;
    }
}
