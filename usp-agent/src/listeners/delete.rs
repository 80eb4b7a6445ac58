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
pub struct DeleteListener {
    usp_agent: Arc<dyn UspServiceAbstract>,
}

impl DeleteListener {
    pub fn new(usp_agent: Arc<dyn UspServiceAbstract>) -> Self {
        DeleteListener { usp_agent }
    }
}

#[async_trait]
impl UspListener for DeleteListener {
    async fn on_receive(&self, msg: Msg) {
        let Some(ReqType::Delete(request)) = usp::request_body(&msg).cloned() else {
            return reject(self.usp_agent.as_ref(), "DELETE", &msg).await;
        };
        let msg_id = usp::msg_id(&msg);
        info!(
            "[USP] DELETE request: msgId={msg_id}, paths={:?}",
            request.obj_paths
        );

        let result = self.usp_agent.delete(request).await.map(RespType::DeleteResp);
        respond(self.usp_agent.as_ref(), "DELETE", msg_id, result).await;
    }
}
