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

use crate::subscription::{
    match_path, validate_path, MatchType, NotificationKind, PathValidationError, SubscriptionEntry,
};

/// Registered subscriptions, bucketed by pattern in registration order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubscriptionRegistry {
    buckets: IndexMap<String, Vec<SubscriptionEntry>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and append; entries sharing a pattern accumulate, nothing is deduplicated.
    pub fn add(&mut self, entry: SubscriptionEntry) -> Result<(), PathValidationError> {
        validate_path(&entry.pattern)?;
        self.buckets
            .entry(entry.pattern.clone())
            .or_default()
            .push(entry);
        Ok(())
    }

    /// Drop every entry registered for `pattern`, returning how many there were
    pub fn remove(&mut self, pattern: &str) -> usize {
        self.buckets
            .shift_remove(pattern)
            .map(|entries| entries.len())
            .unwrap_or(0)
    }

    pub fn reset(&mut self) {
        self.buckets.clear();
    }

    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }

    /// All entries of `kind` whose pattern matches `path`, exact matches first, then prefix,
    /// then wildcard matches; registration order is kept within each rank.
    pub fn matching(&self, path: &str, kind: NotificationKind) -> Vec<(MatchType, SubscriptionEntry)> {
        let mut matched: Vec<(MatchType, SubscriptionEntry)> = self
            .buckets
            .iter()
            .filter_map(|(pattern, entries)| match_path(pattern, path).map(|m| (m, entries)))
            .flat_map(|(match_type, entries)| {
                entries
                    .iter()
                    .filter(move |e| e.kind == kind)
                    .map(move |e| (match_type, e.clone()))
            })
            .collect();
        // sort_by_key is stable
        matched.sort_by_key(|(match_type, _)| *match_type);
        matched
    }
}
