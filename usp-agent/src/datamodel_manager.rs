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
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::sync::oneshot;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

#[cfg(test)]
use crate::datamodel::Node;
use crate::datamodel::{ParameterTree, ResolvedParams};
use crate::notification_manager::NotificationEvent;
use crate::persistence::{SnapshotStore, WriteTracker};
use crate::subscription::{
    ChangeEvent, PathValidationError, SubscriptionEntry, SubscriptionRegistry,
};
use crate::{helpers, Shutdown};

// This is the core business logic for holding the device data model and the subscriptions registered against it. It is
// implemented as a single event-consuming function `handle_message()`, which is spawned into a task and processes the
// `DataModelEvent`s it receives via tokio mpsc channel. Read-then-write operations (Set with change detection, instance
// allocation) as well as subscription matching are thereby serialized, without any locks on tree or registry.

// This is the 'outside API' of the data model manager, it includes some events that are only to be used in (and only enabled for) testing.
#[derive(Debug)]
pub(crate) enum DataModelEvent {
    Get {
        paths: Vec<String>,
        respond_to: oneshot::Sender<Vec<(String, Option<ResolvedParams>)>>,
    },
    GetValue {
        path: String,
        respond_to: oneshot::Sender<Option<String>>,
    },
    IsExistPath {
        path: String,
        respond_to: oneshot::Sender<Option<String>>,
    },
    // Responds with whether the stored value differs from what was there before
    SetValue {
        object_path: String,
        key: String,
        value: String,
        respond_to: oneshot::Sender<bool>,
    },
    NewInstance {
        object_path: String,
        respond_to: oneshot::Sender<String>,
    },
    Delete {
        path: String,
        respond_to: oneshot::Sender<Option<String>>,
    },
    AddSubscription {
        entry: SubscriptionEntry,
        respond_to: oneshot::Sender<Result<(), PathValidationError>>,
    },
    RemoveSubscription {
        pattern: String,
        respond_to: oneshot::Sender<usize>,
    },
    ResetSubscriptions {
        respond_to: oneshot::Sender<()>,
    },
    // Match a change against the registry and hand one notification per match to the notification manager
    Notify {
        event: ChangeEvent,
    },
    // Purely for use during testing: get copy of current parameter tree
    #[cfg(test)]
    GetTree {
        respond_to: oneshot::Sender<Node>,
    },
    // Purely for use during testing: force-set new parameter tree
    #[cfg(test)]
    SetTree {
        tree_replacement: Node,
        respond_to: oneshot::Sender<()>,
    },
    // Purely for use during testing: get copy of current subscription registry
    #[cfg(test)]
    GetSubscriptions {
        respond_to: oneshot::Sender<SubscriptionRegistry>,
    },
}

impl DataModelEvent {
    // Whether this event may have altered the parameter tree
    fn is_tree_write(&self) -> bool {
        matches!(
            self,
            DataModelEvent::SetValue { .. }
                | DataModelEvent::NewInstance { .. }
                | DataModelEvent::Delete { .. }
        )
    }
}

// Snapshot persistence settings of the data model manager
pub(crate) struct PersistenceSettings {
    pub(crate) store: Arc<dyn SnapshotStore>,
    pub(crate) write_count_threshold: u32,
    pub(crate) flush_interval: Duration,
}

// Core business logic of data model management. Interfacing with this purely works via channels.
pub(crate) async fn handle_message(
    mut tree: ParameterTree,
    persistence: PersistenceSettings,
    notification_sender: Sender<NotificationEvent>,
    mut command_receiver: Receiver<DataModelEvent>,
    shutdown: Shutdown,
) {
    helpers::init_once();

    let mut registry = SubscriptionRegistry::new();
    let mut writes = WriteTracker::new(persistence.write_count_threshold);

    let mut flush_ticker = interval_at(
        Instant::now() + persistence.flush_interval,
        persistence.flush_interval,
    );
    flush_ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let event = tokio::select! {
            event = command_receiver.recv() => match event {
                None => {
                    error!("Problem with data model command channel, received None-event");
                    break
                },
                Some(event) => event,
            },
            _ = flush_ticker.tick() => {
                writes.flush(persistence.store.as_ref(), &tree.snapshot());
                continue
            },
            _ = shutdown.triggered() => break,
        };

        let tree_write = event.is_tree_write();
        match event {
            DataModelEvent::Get { paths, respond_to } => {
                if respond_to.send(tree.get(&paths)).is_err() {
                    error!("Problem with internal communication");
                }
            }
            DataModelEvent::GetValue { path, respond_to } => {
                if respond_to.send(tree.get_value(&path)).is_err() {
                    error!("Problem with internal communication");
                }
            }
            DataModelEvent::IsExistPath { path, respond_to } => {
                if respond_to.send(tree.existing_path(&path)).is_err() {
                    error!("Problem with internal communication");
                }
            }
            DataModelEvent::SetValue {
                object_path,
                key,
                value,
                respond_to,
            } => {
                let previous = tree.get_value(&format!("{object_path}{key}"));
                let applied = tree.set_value(&object_path, &key, &value);
                let changed = applied && previous.as_deref() != Some(value.as_str());
                if !applied {
                    debug!("Set of {key} below {object_path} did not resolve, ignored");
                }
                if respond_to.send(changed).is_err() {
                    error!("Problem with internal communication");
                }
            }
            DataModelEvent::NewInstance {
                object_path,
                respond_to,
            } => {
                let instance_path = tree.new_instance(&object_path);
                debug!("Allocated new instance {instance_path}");
                if respond_to.send(instance_path).is_err() {
                    error!("Problem with internal communication");
                }
            }
            DataModelEvent::Delete { path, respond_to } => {
                let deleted = tree.delete(&path);
                if deleted.is_none() {
                    debug!("Delete of {path} did not resolve, ignored");
                }
                if respond_to.send(deleted).is_err() {
                    error!("Problem with internal communication");
                }
            }
            DataModelEvent::AddSubscription { entry, respond_to } => {
                let description = format!("{} ({})", entry.subscription_id, entry.pattern);
                let result = registry.add(entry);
                match &result {
                    Ok(()) => info!("Registered subscription {description}"),
                    Err(e) => warn!("Rejected subscription {description}: {e}"),
                }
                if respond_to.send(result).is_err() {
                    error!("Problem with internal communication");
                }
            }
            DataModelEvent::RemoveSubscription {
                pattern,
                respond_to,
            } => {
                let removed = registry.remove(&pattern);
                info!("Removed {removed} subscription(s) on {pattern}");
                if respond_to.send(removed).is_err() {
                    error!("Problem with internal communication");
                }
            }
            DataModelEvent::ResetSubscriptions { respond_to } => {
                registry.reset();
                info!("Subscription registry reset");
                if respond_to.send(()).is_err() {
                    error!("Problem with internal communication");
                }
            }
            DataModelEvent::Notify { event } => {
                dispatch(&registry, event, &notification_sender);
            }
            #[cfg(test)]
            DataModelEvent::GetTree { respond_to } => {
                let _r = respond_to.send(tree.snapshot());
            }
            #[cfg(test)]
            DataModelEvent::SetTree {
                tree_replacement,
                respond_to,
            } => {
                tree = ParameterTree::from(tree_replacement);
                let _r = respond_to.send(());
            }
            #[cfg(test)]
            DataModelEvent::GetSubscriptions { respond_to } => {
                let _r = respond_to.send(registry.clone());
            }
        }

        if tree_write && writes.record_write() {
            writes.flush(persistence.store.as_ref(), &tree.snapshot());
        }
    }

    // Don't lose anything written since the last flush
    writes.flush(persistence.store.as_ref(), &tree.snapshot());
}

// Fan out one notification per matching subscription, best match first. Each hand-over runs in its own task so that a
// congested notification path never stalls the data model.
fn dispatch(
    registry: &SubscriptionRegistry,
    event: ChangeEvent,
    notification_sender: &Sender<NotificationEvent>,
) {
    let matches = registry.matching(event.path(), event.kind());
    if matches.is_empty() {
        trace!("No subscription for change of {}", event.path());
        return;
    }

    for (match_type, entry) in matches {
        debug!(
            "Change of {} matches subscription {} ({:?} on {})",
            event.path(),
            entry.subscription_id,
            match_type,
            entry.pattern
        );
        let notification_sender = notification_sender.clone();
        let notification = event.clone().into();
        helpers::spawn_and_log_error(async move {
            notification_sender
                .send(NotificationEvent::Notify {
                    subscription_id: entry.subscription_id,
                    notification,
                })
                .await?;
            Ok(())
        });
    }
}
