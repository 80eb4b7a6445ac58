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

/// Instance wildcard accepted in subscription paths, stands for any instance number
pub const WILDCARD: &str = "{i}";

/// How a subscription pattern matched a changed path. Ordering is dispatch priority: exact first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MatchType {
    Exact = 1,
    Prefix = 2,
    Wildcard = 3,
}

pub fn match_path(pattern: &str, path: &str) -> Option<MatchType> {
    if pattern == path {
        return Some(MatchType::Exact);
    }
    if pattern.ends_with('.') && path.starts_with(pattern) {
        return Some(MatchType::Prefix);
    }
    if pattern.contains(WILDCARD) && match_wildcard(pattern, path) {
        return Some(MatchType::Wildcard);
    }
    None
}

// Each wildcard consumes one or more ASCII digits. Patterns ending in a separator only need
// to match a prefix of `path`, all others the whole of it.
fn match_wildcard(pattern: &str, path: &str) -> bool {
    let parts: Vec<&str> = pattern.split(WILDCARD).collect();
    let prefix_only = pattern.ends_with('.');
    match_parts(&parts, path, prefix_only)
}

fn match_parts(parts: &[&str], rest: &str, prefix_only: bool) -> bool {
    let Some((literal, remaining)) = parts.split_first() else {
        return true;
    };
    let Some(rest) = rest.strip_prefix(literal) else {
        return false;
    };
    if remaining.is_empty() {
        return prefix_only || rest.is_empty();
    }

    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    // backtrack, a shorter run of digits might still let the tail match
    (1..=digits)
        .rev()
        .any(|n| match_parts(remaining, &rest[n..], prefix_only))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("Device.WiFi.Radio.1.Enabled", "Device.WiFi.Radio.1.Enabled", Some(MatchType::Exact); "exact leaf")]
    #[test_case("Device.WiFi.", "Device.WiFi.", Some(MatchType::Exact); "exact object")]
    #[test_case("Device.WiFi.", "Device.WiFi.Radio.1.Enabled", Some(MatchType::Prefix); "prefix")]
    #[test_case("Device.WiFi", "Device.WiFi.Radio.1.Enabled", None; "prefix needs trailing separator")]
    #[test_case("Device.WiFi.Radio.{i}.Enabled", "Device.WiFi.Radio.12.Enabled", Some(MatchType::Wildcard); "wildcard full match")]
    #[test_case("Device.WiFi.Radio.{i}.Enabled", "Device.WiFi.Radio.12.EnabledX", None; "wildcard full match rejects tail")]
    #[test_case("Device.WiFi.Radio.{i}.", "Device.WiFi.Radio.3.Channel", Some(MatchType::Wildcard); "wildcard prefix")]
    #[test_case("Device.WiFi.Radio.{i}.", "Device.WiFi.Radio.x.Channel", None; "wildcard needs digits")]
    #[test_case("Device.WiFi.Radio.{i}.", "Device.WiFi.Radio..Channel", None; "wildcard needs at least one digit")]
    #[test_case("Device.A.{i}{i}.B", "Device.A.123.B", Some(MatchType::Wildcard); "adjacent wildcards backtrack")]
    #[test_case("Device.A.{i}.B.{i}.C", "Device.A.1.B.22.C", Some(MatchType::Wildcard); "several wildcards")]
    #[test_case("Device.Radio.", "Device.WiFi.", None; "unrelated")]
    fn test_match_path(pattern: &str, path: &str, expected: Option<MatchType>) {
        assert_eq!(match_path(pattern, path), expected);
    }

    #[test]
    fn test_match_type_ordering() {
        assert!(MatchType::Exact < MatchType::Prefix);
        assert!(MatchType::Prefix < MatchType::Wildcard);
    }
}
