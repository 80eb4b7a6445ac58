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

use indexmap::IndexMap;
use log::*;
use std::sync::Arc;
use tokio::sync::mpsc::Receiver;
#[cfg(test)]
use tokio::sync::oneshot;

use crate::usp::{self, notify::Notification};
use crate::{helpers, MessageSender, Shutdown};

// This is the business logic for sending USP Notify messages and keeping track of which of them are still awaiting a
// NotifyResp from the controller. It is implemented as a single event-consuming function `notification_engine()`, which
// is spawned into a task and processes the `NotificationEvent`s it receives via tokio mpsc channel.

// Upper bound on tracked, unanswered notifications; the oldest entry is forgotten first
const MAX_PENDING_NOTIFICATIONS: usize = 1024;

// This is the 'outside API' of the notification manager
#[derive(Debug)]
pub(crate) enum NotificationEvent {
    Notify {
        subscription_id: String,
        notification: Notification,
    },
    NotifyResponse {
        msg_id: String,
        subscription_id: String,
    },
    // Purely for use during testing: get copy of current pending-notification ledger (msg id -> subscription id)
    #[cfg(test)]
    GetPendingNotifications {
        respond_to: oneshot::Sender<IndexMap<String, String>>,
    },
}

fn notification_name(notification: &Notification) -> &'static str {
    match notification {
        Notification::Event(_) => "EVENT",
        Notification::ValueChange(_) => "VALUE_CHANGE",
        Notification::ObjCreation(_) => "OBJ_CREATION",
        Notification::ObjDeletion(_) => "OBJ_DELETION",
        Notification::OperComplete(_) => "OPER_COMPLETE",
    }
}

pub(crate) async fn notification_engine(
    message_sender: Arc<dyn MessageSender>,
    mut events: Receiver<NotificationEvent>,
    shutdown: Shutdown,
) {
    helpers::init_once();

    // msg id of each sent Notify which still waits for its NotifyResp -> subscription id
    let mut pending: IndexMap<String, String> = IndexMap::new();

    loop {
        let event = tokio::select! {
            event = events.recv() => match event {
                None => {
                    error!("Problem with notification command channel, received None-event");
                    break
                },
                Some(event) => event,
            },
            _ = shutdown.triggered() => break,
        };
        match event {
            NotificationEvent::Notify {
                subscription_id,
                notification,
            } => {
                let name = notification_name(&notification);
                let msg = usp::notify_message(&subscription_id, notification);
                let msg_id = usp::msg_id(&msg).to_string();

                if let Err(e) = message_sender.send(msg).await {
                    warn!("[USP] {name} notify error: subscriptionId={subscription_id}, err={e}");
                    continue;
                }
                info!("[USP] send {name} notify: msgId={msg_id}, subscriptionId={subscription_id}");

                if pending.len() >= MAX_PENDING_NOTIFICATIONS {
                    if let Some((dropped, _)) = pending.shift_remove_index(0) {
                        debug!("Forgetting unanswered notification {dropped}");
                    }
                }
                pending.insert(msg_id, subscription_id);
            }
            NotificationEvent::NotifyResponse {
                msg_id,
                subscription_id,
            } => match pending.shift_remove(&msg_id) {
                Some(expected) if expected == subscription_id => {
                    debug!("Notification {msg_id} acknowledged for subscription {subscription_id}");
                }
                Some(expected) => {
                    warn!("[USP] NOTIFY_RESP for {msg_id} names subscription {subscription_id}, expected {expected}");
                }
                None => {
                    warn!("[USP] unsolicited NOTIFY_RESP: msgId={msg_id}, subscriptionId={subscription_id}");
                }
            },
            #[cfg(test)]
            NotificationEvent::GetPendingNotifications { respond_to } => {
                let _r = respond_to.send(pending.clone());
            }
        }
    }
}
