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

//! Hierarchical, path-addressable parameter store (TR-181 style data model).

pub mod node;
pub(crate) mod path;
pub mod tree;

pub use node::Node;
pub use path::has_filter;
pub use tree::{ParameterTree, ResolvedParams};
