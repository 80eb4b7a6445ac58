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

use crate::usp::{self, response::RespType, Msg};
use crate::{UspListener, UspServiceAbstract};

/// Consumes the controller's acknowledgements of our Notify messages; nothing is sent back.
#[derive(Clone)]
pub struct NotifyRespListener {
    usp_agent: Arc<dyn UspServiceAbstract>,
}

impl NotifyRespListener {
    pub fn new(usp_agent: Arc<dyn UspServiceAbstract>) -> Self {
        NotifyRespListener { usp_agent }
    }
}

#[async_trait]
impl UspListener for NotifyRespListener {
    async fn on_receive(&self, msg: Msg) {
        let msg_id = usp::msg_id(&msg).to_string();
        let Some(RespType::NotifyResp(response)) = usp::response_body(&msg).cloned() else {
            warn!("[USP] NOTIFY_RESP without NotifyResp body: msgId={msg_id}");
            return;
        };
        info!(
            "[USP] NOTIFY_RESP: msgId={msg_id}, subscriptionId={}",
            response.subscription_id
        );

        if let Err(e) = self.usp_agent.notify_response(msg_id.clone(), response).await {
            error!("[USP] NOTIFY_RESP error: msgId={msg_id}, err={e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;

    use super::*;
    use crate::usp::NotifyResp;
    use crate::{helpers, test_lib};

    #[tokio::test]
    async fn test_notify_resp_listener_forwards_acknowledgement() {
        helpers::init_once();
        let response = NotifyResp {
            subscription_id: "s1".to_string(),
        };
        let listener_msg = usp::response("n-1", RespType::NotifyResp(response.clone()));

        // no response message expected
        let mut usp_agent_mock = test_lib::mocks::usp_agent_mock_for_listener_tests(vec![]);
        usp_agent_mock
            .expect_notify_response()
            .with(eq("n-1".to_string()), eq(response))
            .times(1)
            .return_const(Ok(()));

        let listener = NotifyRespListener::new(Arc::new(usp_agent_mock));
        listener.on_receive(listener_msg).await;
    }

    #[tokio::test]
    async fn test_notify_resp_listener_ignores_other_bodies() {
        helpers::init_once();
        let listener_msg = usp::response("n-2", RespType::GetResp(Default::default()));

        let mut usp_agent_mock = test_lib::mocks::usp_agent_mock_for_listener_tests(vec![]);
        usp_agent_mock.expect_notify_response().never();

        let listener = NotifyRespListener::new(Arc::new(usp_agent_mock));
        listener.on_receive(listener_msg).await;
    }
}
