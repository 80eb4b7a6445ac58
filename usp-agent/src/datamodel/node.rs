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

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One node of the parameter tree: either an object with named children, or a leaf holding a textual value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Node {
    Object(BTreeMap<String, Node>),
    Leaf(String),
}

impl Default for Node {
    fn default() -> Self {
        Node::Object(BTreeMap::new())
    }
}

impl Node {
    pub fn leaf<T>(value: T) -> Node
    where
        T: Into<String>,
    {
        Node::Leaf(value.into())
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, Node>> {
        match self {
            Node::Object(children) => Some(children),
            Node::Leaf(_) => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&str> {
        match self {
            Node::Leaf(value) => Some(value),
            Node::Object(_) => None,
        }
    }
}

// Snapshot files are plain JSON; scalars are coerced into their textual representation.
// Numbers lose their fractional part (truncation, not rounding), null and arrays become empty strings.
impl From<Value> for Node {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => {
                Node::Object(map.into_iter().map(|(k, v)| (k, Node::from(v))).collect())
            }
            Value::String(s) => Node::Leaf(s),
            Value::Bool(b) => Node::Leaf(b.to_string()),
            Value::Number(n) => {
                let text = if let Some(i) = n.as_i64() {
                    i.to_string()
                } else if let Some(u) = n.as_u64() {
                    u.to_string()
                } else {
                    (n.as_f64().unwrap_or_default().trunc() as i64).to_string()
                };
                Node::Leaf(text)
            }
            Value::Null | Value::Array(_) => Node::Leaf(String::new()),
        }
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(Node::from)
    }
}
