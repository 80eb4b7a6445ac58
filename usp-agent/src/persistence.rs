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
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;

use crate::datamodel::Node;

const LOAD_ATTEMPTS: u32 = 3;
const LOAD_RETRY_PAUSE: Duration = Duration::from_secs(1);

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("Snapshot I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Snapshot {path} is not valid JSON: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Snapshot {0} does not contain a JSON object at top level")]
    NotAnObject(String),
}

/// Load/save collaborator for the parameter tree.
#[cfg_attr(test, mockall::automock)]
pub trait SnapshotStore: Send + Sync {
    fn load(&self) -> Result<Node, PersistenceError>;
    fn save(&self, tree: &Node) -> Result<(), PersistenceError>;
}

/// Snapshot kept as a single JSON document on disk
#[derive(Clone, Debug)]
pub struct JsonFileSnapshot {
    path: PathBuf,
    retry_pause: Duration,
}

impl JsonFileSnapshot {
    pub fn new<P>(path: P) -> Self
    where
        P: Into<PathBuf>,
    {
        JsonFileSnapshot {
            path: path.into(),
            retry_pause: LOAD_RETRY_PAUSE,
        }
    }

    fn path_name(&self) -> String {
        self.path.display().to_string()
    }

    fn load_once(&self) -> Result<Node, PersistenceError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(
                    "No snapshot at {}, starting with an empty data model",
                    self.path_name()
                );
                return Ok(Node::default());
            }
            Err(source) => {
                return Err(PersistenceError::Io {
                    path: self.path_name(),
                    source,
                })
            }
        };
        let node: Node =
            serde_json::from_str(&content).map_err(|source| PersistenceError::Json {
                path: self.path_name(),
                source,
            })?;
        match node {
            Node::Object(_) => Ok(node),
            Node::Leaf(_) => Err(PersistenceError::NotAnObject(self.path_name())),
        }
    }
}

impl SnapshotStore for JsonFileSnapshot {
    // Up to LOAD_ATTEMPTS tries, pausing in between
    fn load(&self) -> Result<Node, PersistenceError> {
        let mut attempt = 1;
        loop {
            match self.load_once() {
                Ok(node) => return Ok(node),
                Err(e) if attempt < LOAD_ATTEMPTS => {
                    warn!(
                        "Loading snapshot failed (attempt {attempt}/{LOAD_ATTEMPTS}): {e}"
                    );
                    std::thread::sleep(self.retry_pause);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn save(&self, tree: &Node) -> Result<(), PersistenceError> {
        let content = serde_json::to_string_pretty(tree).map_err(|source| PersistenceError::Json {
            path: self.path_name(),
            source,
        })?;
        // write-then-rename
        let mut temp_path = self.path.clone().into_os_string();
        temp_path.push(".tmp");
        std::fs::write(&temp_path, content)
            .and_then(|_| std::fs::rename(&temp_path, &self.path))
            .map_err(|source| PersistenceError::Io {
                path: self.path_name(),
                source,
            })?;
        debug!("Saved snapshot to {}", self.path_name());
        Ok(())
    }
}

/// Dirty-write accounting that decides when the tree is flushed to the snapshot store.
#[derive(Debug)]
pub(crate) struct WriteTracker {
    pending_writes: u32,
    threshold: u32,
}

impl WriteTracker {
    pub(crate) fn new(threshold: u32) -> Self {
        WriteTracker {
            pending_writes: 0,
            threshold: threshold.max(1),
        }
    }

    /// Count one applied mutation; true once the threshold is reached.
    pub(crate) fn record_write(&mut self) -> bool {
        self.pending_writes += 1;
        self.pending_writes >= self.threshold
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.pending_writes > 0
    }

    pub(crate) fn pending_writes(&self) -> u32 {
        self.pending_writes
    }

    /// Save `tree` if anything changed since the last successful flush
    pub(crate) fn flush(&mut self, store: &dyn SnapshotStore, tree: &Node) {
        if !self.is_dirty() {
            return;
        }
        match store.save(tree) {
            Ok(()) => self.pending_writes = 0,
            Err(e) => error!("Error persisting data model snapshot: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn temp_snapshot(name: &str) -> JsonFileSnapshot {
        let path = std::env::temp_dir().join(format!(
            "usp-agent-{}-{}.json",
            name,
            uuid::Uuid::new_v4()
        ));
        JsonFileSnapshot {
            path,
            retry_pause: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_missing_file_loads_empty_tree() {
        let store = temp_snapshot("missing");
        assert_eq!(store.load().unwrap(), Node::default());
    }

    #[test]
    fn test_save_then_load() {
        let store = temp_snapshot("roundtrip");
        let tree = Node::Object(BTreeMap::from([(
            "Device".to_string(),
            Node::Object(BTreeMap::from([(
                "DeviceInfo".to_string(),
                Node::Object(BTreeMap::from([(
                    "SerialNumber".to_string(),
                    Node::leaf("0001"),
                )])),
            )])),
        )]));

        store.save(&tree).unwrap();
        assert_eq!(store.load().unwrap(), tree);
        let _ = std::fs::remove_file(&store.path);
    }

    #[test]
    fn test_garbage_fails_after_retries() {
        let store = temp_snapshot("garbage");
        std::fs::write(&store.path, "{ not json").unwrap();
        assert!(matches!(store.load(), Err(PersistenceError::Json { .. })));

        std::fs::write(&store.path, "\"just a string\"").unwrap();
        assert!(matches!(
            store.load(),
            Err(PersistenceError::NotAnObject(_))
        ));
        let _ = std::fs::remove_file(&store.path);
    }

    #[test]
    fn test_write_tracker() {
        let mut tracker = WriteTracker::new(2);
        let mut store = MockSnapshotStore::new();
        store.expect_save().times(1).returning(|_| Ok(()));

        // clean tracker never touches the store
        tracker.flush(&store, &Node::default());

        assert!(!tracker.record_write());
        assert!(tracker.record_write());
        assert_eq!(tracker.pending_writes(), 2);

        tracker.flush(&store, &Node::default());
        assert!(!tracker.is_dirty());
    }

    #[test]
    fn test_write_tracker_keeps_count_on_failed_save() {
        let mut tracker = WriteTracker::new(5);
        let mut store = MockSnapshotStore::new();
        store.expect_save().times(1).returning(|_| {
            Err(PersistenceError::NotAnObject("mock".to_string()))
        });

        tracker.record_write();
        tracker.flush(&store, &Node::default());
        assert_eq!(tracker.pending_writes(), 1);
    }
}
