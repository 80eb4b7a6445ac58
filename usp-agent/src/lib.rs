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

/*!
usp-agent is an implementation of a [USP (TR-369)](https://usp.technology/specification/) agent for the rust programming language.

The agent holds a TR-181 style parameter tree, lets a USP controller read and modify it, create and delete object
instances, invoke commands and subscribe to change notifications, all over one long-lived WebSocket connection.

## Library contents

* `datamodel` module, with the parameter tree and its path expression resolver
* `subscription` module, with path validation, path matching and the subscription registry
* `usp` module, with the USP record and message schema plus codec helpers
* `UspAgent` service as a frontend for the data model and notification manager actors
* `listeners` module, with one `UspListener` implementation per handled USP message type and the `UspDispatcher` routing between them
* `ConnectionManager`, which keeps the connection to the controller alive and owns the ordered outbound path

## Note

For a batteries-included approach to running the agent, the `usp-agent-cli` crate provides a command line frontend.

## References

* [USP Specification](https://usp.technology/specification/)
* [TR-181 Device Data Model](https://usp-data-models.broadband-forum.org/)

*/

mod common {
    pub(crate) mod helpers;
}
pub use common::helpers::{init_once, Shutdown};
pub(crate) use common::*;

mod datamodel_manager;
mod notification_manager;

mod configuration;
pub use configuration::{ConfigurationError, UspAgentConfiguration};

pub mod connection_manager;
pub use connection_manager::{ConnectionManager, ConnectionState, ConnectionStatus};

pub mod datamodel;
pub mod persistence;
pub use persistence::{JsonFileSnapshot, PersistenceError, SnapshotStore};
pub mod subscription;
pub mod transport;
pub mod usp;

pub use usp_agent::*;
mod usp_agent;

pub mod listeners {
    pub mod add;
    pub mod delete;
    pub mod dispatcher;
    pub mod get;
    pub mod notify_resp;
    pub mod operate;
    pub mod set;

    pub use add::AddListener;
    pub use delete::DeleteListener;
    pub use dispatcher::{UspDispatcher, UspListener};
    pub use get::GetListener;
    pub use notify_resp::NotifyRespListener;
    pub use operate::OperateListener;
    pub use set::SetListener;
}
pub use listeners::{UspDispatcher, UspListener};

#[cfg(test)]
mod tests;
#[cfg(test)]
pub(crate) use tests::*;
