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

use std::collections::{BTreeMap, HashMap};

use crate::datamodel::node::Node;
use crate::datamodel::path::{parse_path, split_path, FilterClause, Segment, SEPARATOR};

type Children = BTreeMap<String, Node>;

// Instance key a filter scan reports when nothing matched. A child actually named "0" is never selected.
const NO_MATCH_KEY: &str = "0";

/// Parameters found for one resolved path: the concrete path of the containing object, and
/// the flattened leaf values below it (keys relative to `resolved_path`).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolvedParams {
    pub resolved_path: String,
    pub params: HashMap<String, String>,
}

/// Target of a successful path resolution
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Found<'a> {
    Leaf(&'a str),
    Object(&'a Children),
}

/// The hierarchical parameter store. Not synchronized, the data model actor is its single owner.
#[derive(Clone, Debug, Default)]
pub struct ParameterTree {
    root: Children,
    // highest instance number ever handed out, per concrete multi-instance object path
    instance_marks: HashMap<String, u64>,
}

impl From<Node> for ParameterTree {
    fn from(node: Node) -> Self {
        let root = match node {
            Node::Object(children) => children,
            Node::Leaf(_) => Children::new(),
        };
        ParameterTree {
            root,
            instance_marks: HashMap::new(),
        }
    }
}

impl ParameterTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current tree contents, as handed to snapshot persistence
    pub fn snapshot(&self) -> Node {
        Node::Object(self.root.clone())
    }

    /// Resolve a path expression, returning the found node and the concrete path.
    pub(crate) fn resolve(&self, path: &str) -> Option<(Found<'_>, String)> {
        let segments = parse_path(path);
        find(&self.root, &segments, String::new())
    }

    /// Best-effort Get over several paths; unresolvable paths come back with `None`.
    pub fn get(&self, paths: &[String]) -> Vec<(String, Option<ResolvedParams>)> {
        paths
            .iter()
            .map(|path| (path.clone(), self.get_path(path)))
            .collect()
    }

    pub fn get_path(&self, path: &str) -> Option<ResolvedParams> {
        let segments = parse_path(path);
        if segments.len() < 2 {
            return None;
        }
        let (found, resolved) = find(&self.root, &segments, String::new())?;
        let (last_raw, last) = segments.last()?;

        match (last, found) {
            (Segment::Terminator, Found::Object(children)) => {
                let mut params = HashMap::new();
                flatten(children, "", &mut params);
                Some(ResolvedParams {
                    resolved_path: resolved,
                    params,
                })
            }
            (_, Found::Leaf(value)) => Some(ResolvedParams {
                resolved_path: resolved[..resolved.len() - last_raw.len()].to_string(),
                params: HashMap::from([(last_raw.to_string(), value.to_string())]),
            }),
            _ => None,
        }
    }

    /// Value of a single leaf, if `path` resolves to one
    pub fn get_value(&self, path: &str) -> Option<String> {
        match self.resolve(path) {
            Some((Found::Leaf(value), _)) => Some(value.to_string()),
            _ => None,
        }
    }

    /// Set leaf `key` below `object_path` (plain concatenation), creating missing plain
    /// segments on the way. Returns whether the write took place.
    pub fn set_value(&mut self, object_path: &str, key: &str, value: &str) -> bool {
        let full_path = format!("{object_path}{key}");
        let segments: Vec<Segment> = split_path(&full_path)
            .into_iter()
            .map(Segment::parse)
            .collect();

        // Refuse up front rather than leaving half-created objects behind
        let Some((last, parents)) = segments.split_last() else {
            return false;
        };
        if !matches!(last, Segment::Name(_))
            || parents
                .iter()
                .any(|s| matches!(s, Segment::Terminator | Segment::Malformed))
        {
            return false;
        }
        set_in(&mut self.root, &segments, value)
    }

    /// Literal paths are trusted as-is; paths with search filters must resolve.
    pub fn existing_path(&self, path: &str) -> Option<String> {
        if !super::path::has_filter(path) {
            return Some(path.to_string());
        }
        self.resolve(path).map(|(_, resolved)| resolved)
    }

    /// Allocate and create the next instance below a multi-instance object, returning
    /// `object_path` + instance number + separator. Numbers are never reused during the
    /// lifetime of this tree, even after the highest instance got deleted.
    pub fn new_instance(&mut self, object_path: &str) -> String {
        let (concrete, highest) = match self.resolve(object_path) {
            Some((Found::Object(children), resolved)) => {
                let highest = children
                    .keys()
                    .filter_map(|k| k.parse::<u64>().ok())
                    .max()
                    .unwrap_or(0);
                (Some(resolved), highest)
            }
            Some((Found::Leaf(_), _)) => (None, 0),
            None if object_path.ends_with(SEPARATOR) && !super::path::has_filter(object_path) => {
                (Some(object_path.to_string()), 0)
            }
            None => (None, 0),
        };

        let Some(concrete) = concrete else {
            return format!("{object_path}1{SEPARATOR}");
        };
        let number = highest.max(self.instance_marks.get(&concrete).copied().unwrap_or(0)) + 1;

        if let Some(children) = object_at_mut(&mut self.root, &concrete) {
            children.insert(number.to_string(), Node::default());
            self.instance_marks.insert(concrete, number);
        }
        format!("{object_path}{number}{SEPARATOR}")
    }

    /// Remove whatever `path` resolves to, returning the concrete path of the removed node.
    pub fn delete(&mut self, path: &str) -> Option<String> {
        let (_, resolved) = self.resolve(path)?;
        let parts = split_path(&resolved);
        delete_in(&mut self.root, &parts);
        Some(resolved)
    }

    #[cfg(test)]
    pub(crate) fn root(&self) -> &Children {
        &self.root
    }
}

fn find<'a>(
    data: &'a Children,
    segments: &[(&str, Segment)],
    resolved: String,
) -> Option<(Found<'a>, String)> {
    let ((_, segment), rest) = segments.split_first()?;

    if rest.is_empty() {
        return match segment {
            Segment::Name(name) => match data.get(*name) {
                Some(Node::Leaf(value)) => Some((Found::Leaf(value), resolved + *name)),
                _ => None,
            },
            Segment::Terminator => Some((Found::Object(data), resolved)),
            Segment::Filter(_) | Segment::Malformed => None,
        };
    }

    let key = match segment {
        Segment::Name(name) => *name,
        Segment::Filter(clauses) => select_by_filter(data, clauses)?,
        Segment::Terminator | Segment::Malformed => return None,
    };
    match data.get(key) {
        Some(Node::Object(children)) => find(children, rest, format!("{resolved}{key}{SEPARATOR}")),
        _ => None,
    }
}

// Scan sibling objects for the last one whose leaves satisfy every clause
fn select_by_filter<'a>(data: &'a Children, clauses: &[FilterClause]) -> Option<&'a str> {
    let mut selected = None;
    for (key, child) in data {
        let Node::Object(fields) = child else {
            continue;
        };
        let satisfied = clauses.iter().all(|clause| {
            matches!(fields.get(clause.key), Some(Node::Leaf(value)) if *value == clause.value)
        });
        if satisfied {
            selected = Some(key.as_str());
        }
    }
    selected.filter(|key| *key != NO_MATCH_KEY)
}

fn flatten(data: &Children, prefix: &str, params: &mut HashMap<String, String>) {
    for (key, child) in data {
        match child {
            Node::Object(children) => flatten(children, &format!("{prefix}{key}{SEPARATOR}"), params),
            Node::Leaf(value) => {
                params.insert(format!("{prefix}{key}"), value.clone());
            }
        }
    }
}

fn set_in(data: &mut Children, segments: &[Segment], value: &str) -> bool {
    let Some((segment, rest)) = segments.split_first() else {
        return false;
    };

    if rest.is_empty() {
        return match segment {
            Segment::Name(name) => {
                data.insert(name.to_string(), Node::leaf(value));
                true
            }
            _ => false,
        };
    }

    let key = match segment {
        Segment::Name(name) => name.to_string(),
        Segment::Filter(clauses) => match select_by_filter(data, clauses) {
            Some(key) => key.to_string(),
            None => return false,
        },
        Segment::Terminator | Segment::Malformed => return false,
    };
    let is_filter = matches!(segment, Segment::Filter(_));

    match data.get_mut(&key) {
        Some(Node::Object(children)) => set_in(children, rest, value),
        Some(Node::Leaf(_)) => false,
        None if !is_filter => {
            let mut children = Children::new();
            let applied = set_in(&mut children, rest, value);
            if applied {
                data.insert(key, Node::Object(children));
            }
            applied
        }
        None => false,
    }
}

// Walk (and create where missing) the objects along a concrete, filter-free path
fn object_at_mut<'a>(data: &'a mut Children, concrete: &str) -> Option<&'a mut Children> {
    let mut current = data;
    for name in split_path(concrete).into_iter().filter(|s| !s.is_empty()) {
        let child = current
            .entry(name.to_string())
            .or_insert_with(Node::default);
        current = match child {
            Node::Object(children) => children,
            Node::Leaf(_) => return None,
        };
    }
    Some(current)
}

fn delete_in(data: &mut Children, parts: &[&str]) {
    match parts {
        [key, ""] | [key] => {
            data.remove(*key);
        }
        [key, rest @ ..] => {
            if let Some(Node::Object(children)) = data.get_mut(*key) {
                delete_in(children, rest);
            }
        }
        [] => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn tree_from(json: &str) -> ParameterTree {
        ParameterTree::from(serde_json::from_str::<Node>(json).unwrap())
    }

    fn sample_tree() -> ParameterTree {
        tree_from(
            r#"{
                "Device": {
                    "DeviceInfo": {"Manufacturer": "ACME", "UpTime": 1234.9},
                    "WiFi": {
                        "Radio": {
                            "1": {"Enabled": false, "Alias": "radio-a", "Channel": 6},
                            "2": {"Enabled": true, "Alias": "radio-b", "Channel": 36}
                        }
                    }
                },
                "Root": {"1": {"Alias": "a"}, "2": {"Alias": "b"}}
            }"#,
        )
    }

    #[test]
    fn test_get_object_flattens_leaves() {
        let tree = sample_tree();
        let result = tree.get_path("Device.WiFi.Radio.2.").unwrap();

        assert_eq!(result.resolved_path, "Device.WiFi.Radio.2.");
        assert_eq!(
            result.params,
            HashMap::from([
                ("Enabled".to_string(), "true".to_string()),
                ("Alias".to_string(), "radio-b".to_string()),
                ("Channel".to_string(), "36".to_string()),
            ])
        );

        let result = tree.get_path("Device.WiFi.").unwrap();
        assert_eq!(result.params.len(), 6);
        assert_eq!(result.params.get("Radio.1.Alias").unwrap(), "radio-a");
    }

    #[test]
    fn test_get_leaf() {
        let tree = sample_tree();
        let result = tree.get_path("Device.DeviceInfo.UpTime").unwrap();

        assert_eq!(result.resolved_path, "Device.DeviceInfo.");
        assert_eq!(
            result.params,
            HashMap::from([("UpTime".to_string(), "1234".to_string())])
        );
    }

    #[test]
    fn test_filter_resolution() {
        let tree = sample_tree();
        let result = tree.get_path("Root.[Alias==\"b\"].Alias").unwrap();
        assert_eq!(result.resolved_path, "Root.2.");
        assert_eq!(result.params.get("Alias").unwrap(), "b");

        let (found, resolved) = tree.resolve("Root.[Alias==\"b\"].Alias").unwrap();
        assert_eq!(found, Found::Leaf("b"));
        assert_eq!(resolved, "Root.2.Alias");

        let result = tree
            .get_path("Device.WiFi.Radio.[Enabled==false&&Channel==6].")
            .unwrap();
        assert_eq!(result.resolved_path, "Device.WiFi.Radio.1.");
        assert_eq!(result.params.get("Alias").unwrap(), "radio-a");

        // every clause has to hold
        assert!(tree
            .get_path("Device.WiFi.Radio.[Enabled==true&&Channel==6].")
            .is_none());
    }

    #[test_case("Device"; "single segment")]
    #[test_case("Device.Missing."; "missing object")]
    #[test_case("Device.WiFi.Radio"; "object addressed as leaf")]
    #[test_case("Device.DeviceInfo.Manufacturer.Extra"; "leaf in the middle")]
    #[test_case("Root.[Alias==\"zz\"].Alias"; "filter without match")]
    #[test_case("Root.[Alias=\"a\"].Alias"; "malformed filter")]
    #[test_case("Device..WiFi."; "empty segment in the middle")]
    fn test_get_unresolvable(path: &str) {
        assert!(sample_tree().get_path(path).is_none());
    }

    #[test]
    fn test_get_reports_every_requested_path() {
        let tree = sample_tree();
        let results = tree.get(&[
            "Device.DeviceInfo.Manufacturer".to_string(),
            "Device.Nope.".to_string(),
        ]);
        assert_eq!(results.len(), 2);
        assert!(results[0].1.is_some());
        assert_eq!(results[1].0, "Device.Nope.");
        assert!(results[1].1.is_none());
    }

    #[test]
    fn test_filter_never_selects_instance_zero() {
        let tree = tree_from(r#"{"Root": {"0": {"Alias": "z"}}}"#);
        assert!(tree.resolve("Root.[Alias==\"z\"].Alias").is_none());
    }

    #[test]
    fn test_set_then_get() {
        let mut tree = sample_tree();
        assert!(tree.set_value("Device.WiFi.Radio.1.", "Enabled", "true"));
        assert_eq!(
            tree.get_value("Device.WiFi.Radio.1.Enabled").as_deref(),
            Some("true")
        );

        let result = tree.get_path("Device.WiFi.Radio.1.Enabled").unwrap();
        assert_eq!(result.params.get("Enabled").unwrap(), "true");
    }

    #[test]
    fn test_set_auto_vivifies() {
        let mut tree = ParameterTree::new();
        assert!(tree.set_value("Device.LocalAgent.Subscription.1.", "ID", "s1"));
        assert_eq!(
            tree.get_value("Device.LocalAgent.Subscription.1.ID").as_deref(),
            Some("s1")
        );
    }

    #[test_case("Root.[Alias==\"zz\"].", "Name"; "filter without match")]
    #[test_case("Device.DeviceInfo.Manufacturer.", "Sub"; "through a leaf")]
    #[test_case("Device..", "Name"; "empty segment")]
    #[test_case("Device.WiFi.", ""; "empty key")]
    fn test_set_noop(object_path: &str, key: &str) {
        let mut tree = sample_tree();
        let before = tree.snapshot();
        assert!(!tree.set_value(object_path, key, "x"));
        assert_eq!(tree.snapshot(), before);
    }

    #[test]
    fn test_set_through_filter() {
        let mut tree = sample_tree();
        assert!(tree.set_value("Root.[Alias==\"a\"].", "Name", "first"));
        assert_eq!(tree.get_value("Root.1.Name").as_deref(), Some("first"));
    }

    #[test]
    fn test_existing_path() {
        let tree = sample_tree();
        assert_eq!(
            tree.existing_path("Device.Does.Not.Exist.").as_deref(),
            Some("Device.Does.Not.Exist.")
        );
        assert_eq!(
            tree.existing_path("Root.[Alias==\"a\"].").as_deref(),
            Some("Root.1.")
        );
        assert!(tree.existing_path("Root.[Alias==\"q\"].").is_none());
    }

    #[test]
    fn test_new_instance_is_strictly_increasing() {
        let mut tree = sample_tree();
        assert_eq!(tree.new_instance("Device.WiFi.Radio."), "Device.WiFi.Radio.3.");
        assert_eq!(tree.new_instance("Device.WiFi.Radio."), "Device.WiFi.Radio.4.");
        assert!(tree.root()["Device"].as_object().unwrap()["WiFi"]
            .as_object()
            .unwrap()["Radio"]
            .as_object()
            .unwrap()
            .contains_key("4"));
    }

    #[test]
    fn test_new_instance_on_missing_object() {
        let mut tree = ParameterTree::new();
        assert_eq!(
            tree.new_instance("Device.LocalAgent.Subscription."),
            "Device.LocalAgent.Subscription.1."
        );
        assert_eq!(
            tree.new_instance("Device.LocalAgent.Subscription."),
            "Device.LocalAgent.Subscription.2."
        );
    }

    #[test]
    fn test_new_instance_never_reuses_numbers() {
        let mut tree = sample_tree();
        let created = tree.new_instance("Device.WiFi.Radio.");
        assert_eq!(tree.delete(&created).as_deref(), Some("Device.WiFi.Radio.3."));
        assert_eq!(tree.new_instance("Device.WiFi.Radio."), "Device.WiFi.Radio.4.");
    }

    #[test]
    fn test_delete() {
        let mut tree = sample_tree();

        assert_eq!(
            tree.delete("Device.WiFi.Radio.[Alias==\"radio-a\"].").as_deref(),
            Some("Device.WiFi.Radio.1.")
        );
        assert!(tree.get_path("Device.WiFi.Radio.1.").is_none());
        assert!(tree.resolve("Device.WiFi.Radio.[Alias==\"radio-a\"].").is_none());
        assert!(tree.get_path("Device.WiFi.Radio.2.").is_some());

        assert_eq!(
            tree.delete("Device.DeviceInfo.Manufacturer").as_deref(),
            Some("Device.DeviceInfo.Manufacturer")
        );
        assert!(tree.get_value("Device.DeviceInfo.Manufacturer").is_none());

        assert!(tree.delete("Device.Nothing.Here.").is_none());

        assert_eq!(tree.delete("Device.").as_deref(), Some("Device."));
        assert!(!tree.root().contains_key("Device"));
        assert!(tree.root().contains_key("Root"));
    }
}
