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

/// Path separator used throughout the data model
pub const SEPARATOR: char = '.';

/// A single `key==value` clause of a search filter, value already stripped of quotes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct FilterClause<'a> {
    pub key: &'a str,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Segment<'a> {
    /// Literal child name or instance number
    Name(&'a str),
    /// `[k1==v1&&k2==v2]`
    Filter(Vec<FilterClause<'a>>),
    /// Empty segment after a trailing separator, addresses the object itself
    Terminator,
    /// Anything bracketed that does not parse as a filter
    Malformed,
}

impl<'a> Segment<'a> {
    pub(crate) fn parse(raw: &'a str) -> Segment<'a> {
        if raw.is_empty() {
            return Segment::Terminator;
        }
        if raw.len() >= 2 && raw.starts_with('[') && raw.ends_with(']') {
            let mut clauses = Vec::new();
            for clause in raw[1..raw.len() - 1].split("&&") {
                let parts: Vec<&str> = clause.split("==").collect();
                if parts.len() != 2 {
                    return Segment::Malformed;
                }
                clauses.push(FilterClause {
                    key: parts[0],
                    value: parts[1].replace('"', ""),
                });
            }
            return Segment::Filter(clauses);
        }
        if raw.contains(['[', ']']) {
            return Segment::Malformed;
        }
        Segment::Name(raw)
    }
}

/// Split a path expression at every separator that is not enclosed in a search filter.
/// A path ending in a separator yields a trailing empty segment.
pub(crate) fn split_path(path: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in path.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            SEPARATOR if depth == 0 => {
                parts.push(&path[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&path[start..]);
    parts
}

pub(crate) fn parse_path(path: &str) -> Vec<(&str, Segment<'_>)> {
    split_path(path)
        .into_iter()
        .map(|raw| (raw, Segment::parse(raw)))
        .collect()
}

/// Whether a path expression contains at least one search filter
pub fn has_filter(path: &str) -> bool {
    path.contains('[')
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("Device.WiFi.", vec!["Device", "WiFi", ""]; "object path")]
    #[test_case("Device.WiFi.Enable", vec!["Device", "WiFi", "Enable"]; "leaf path")]
    #[test_case("Device", vec!["Device"]; "single segment")]
    #[test_case("Root.[Alias==\"a.b\"].Name", vec!["Root", "[Alias==\"a.b\"]", "Name"]; "separator inside filter")]
    #[test_case("", vec![""]; "empty path")]
    fn test_split_path(path: &str, expected: Vec<&str>) {
        assert_eq!(split_path(path), expected);
    }

    #[test]
    fn test_segment_parse() {
        assert_eq!(Segment::parse("Radio"), Segment::Name("Radio"));
        assert_eq!(Segment::parse(""), Segment::Terminator);
        assert_eq!(
            Segment::parse("[Alias==\"b\"&&Enable==true]"),
            Segment::Filter(vec![
                FilterClause {
                    key: "Alias",
                    value: "b".to_string()
                },
                FilterClause {
                    key: "Enable",
                    value: "true".to_string()
                },
            ])
        );
        assert_eq!(Segment::parse("[Alias=b]"), Segment::Malformed);
        assert_eq!(Segment::parse("[a==b==c]"), Segment::Malformed);
        assert_eq!(Segment::parse("Radio[1]"), Segment::Malformed);
    }
}
