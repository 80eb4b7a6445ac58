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

//! Subscription bookkeeping: validation of subscribed paths, matching of changed paths against them,
//! and the registry the data model actor consults whenever a change event is raised.

use std::collections::HashMap;
use std::str::FromStr;

use crate::usp::notify::{self, Notification};

pub mod path_matcher;
pub mod path_validator;
mod registry;

pub use path_matcher::{match_path, MatchType};
pub use path_validator::{validate_path, PathValidationError, PathValidationReason};
pub use registry::SubscriptionRegistry;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    ValueChange,
    ObjectCreation,
    ObjectDeletion,
    OperationComplete,
}

impl FromStr for NotificationKind {
    type Err = SubscriptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ValueChange" => Ok(NotificationKind::ValueChange),
            "ObjectCreation" => Ok(NotificationKind::ObjectCreation),
            "ObjectDeletion" => Ok(NotificationKind::ObjectDeletion),
            "OperationComplete" => Ok(NotificationKind::OperationComplete),
            other => Err(SubscriptionError::UnknownNotificationType(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SubscriptionError {
    #[error("Missing required subscription parameter '{0}'")]
    MissingParameter(&'static str),
    #[error("Unknown subscription notification type '{0}'")]
    UnknownNotificationType(String),
    #[error(transparent)]
    InvalidPath(#[from] PathValidationError),
}

/// One registered subscription. Entries are immutable once registered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubscriptionEntry {
    pub pattern: String,
    pub subscription_id: String,
    pub kind: NotificationKind,
}

impl SubscriptionEntry {
    /// Build an entry from the parameter settings of a `Device.LocalAgent.Subscription.` Add request
    pub fn from_settings(settings: &HashMap<String, String>) -> Result<Self, SubscriptionError> {
        let required = |name: &'static str| {
            settings
                .get(name)
                .filter(|v| !v.is_empty())
                .cloned()
                .ok_or(SubscriptionError::MissingParameter(name))
        };
        let subscription_id = required("ID")?;
        let pattern = required("ReferenceList")?;
        let kind = required("NotifType")?.parse::<NotificationKind>()?;

        Ok(SubscriptionEntry {
            pattern,
            subscription_id,
            kind,
        })
    }
}

/// Data model change raised by Set, Add or Delete processing, keyed by the affected path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChangeEvent {
    /// `param_path` is the resolved object path followed by the parameter name
    ValueChange {
        param_path: String,
        param_value: String,
    },
    /// `obj_path` is the instantiated path, e.g. `Device.WiFi.Radio.3.`, never the requested table path
    ObjectCreation {
        obj_path: String,
        unique_keys: HashMap<String, String>,
    },
    /// `obj_path` is the concrete path of the removed object, with search filters resolved. Falls back
    /// to the requested path when nothing resolved.
    ObjectDeletion {
        obj_path: String,
    },
}

impl ChangeEvent {
    pub fn path(&self) -> &str {
        match self {
            ChangeEvent::ValueChange { param_path, .. } => param_path,
            ChangeEvent::ObjectCreation { obj_path, .. } => obj_path,
            ChangeEvent::ObjectDeletion { obj_path } => obj_path,
        }
    }

    pub fn kind(&self) -> NotificationKind {
        match self {
            ChangeEvent::ValueChange { .. } => NotificationKind::ValueChange,
            ChangeEvent::ObjectCreation { .. } => NotificationKind::ObjectCreation,
            ChangeEvent::ObjectDeletion { .. } => NotificationKind::ObjectDeletion,
        }
    }
}

impl From<ChangeEvent> for Notification {
    fn from(event: ChangeEvent) -> Self {
        match event {
            ChangeEvent::ValueChange {
                param_path,
                param_value,
            } => Notification::ValueChange(notify::ValueChange {
                param_path,
                param_value,
            }),
            ChangeEvent::ObjectCreation {
                obj_path,
                unique_keys,
            } => Notification::ObjCreation(notify::ObjectCreation {
                obj_path,
                unique_keys,
            }),
            ChangeEvent::ObjectDeletion { obj_path } => {
                Notification::ObjDeletion(notify::ObjectDeletion { obj_path })
            }
        }
    }
}
