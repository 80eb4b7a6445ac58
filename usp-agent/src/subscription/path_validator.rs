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

use std::fmt;

/// Maximum accepted length of a subscription path, in bytes
pub const MAX_PATH_LENGTH: usize = 256;
/// Every subscription path has to live below this root
pub const PATH_PREFIX: &str = "Device.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathValidationReason {
    Empty,
    TooLong,
    InvalidPrefix,
    IllegalCharacter,
    ConsecutiveSeparators,
}

impl fmt::Display for PathValidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::Empty => "path must not be empty",
            Self::TooLong => "path exceeds maximum length of 256",
            Self::InvalidPrefix => "path must start with 'Device.'",
            Self::IllegalCharacter => "path contains a control character",
            Self::ConsecutiveSeparators => "path contains consecutive separators",
        };
        f.write_str(reason)
    }
}

/// Rejection of a subscription path. `offset` is a byte position into `path`, or -1 when the path as a whole is at fault.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("Invalid subscription path '{path}' at offset {offset}: {reason}")]
pub struct PathValidationError {
    pub path: String,
    pub offset: i64,
    pub reason: PathValidationReason,
}

impl PathValidationError {
    fn new(path: &str, offset: i64, reason: PathValidationReason) -> Self {
        PathValidationError {
            path: path.to_string(),
            offset,
            reason,
        }
    }
}

fn is_illegal_char(c: char) -> bool {
    c.is_control() && !matches!(c, '\t' | '\n' | '\r')
}

pub fn validate_path(path: &str) -> Result<(), PathValidationError> {
    if path.is_empty() {
        return Err(PathValidationError::new(path, -1, PathValidationReason::Empty));
    }
    if path.len() > MAX_PATH_LENGTH {
        return Err(PathValidationError::new(
            path,
            MAX_PATH_LENGTH as i64,
            PathValidationReason::TooLong,
        ));
    }
    if !path.starts_with(PATH_PREFIX) {
        return Err(PathValidationError::new(
            path,
            0,
            PathValidationReason::InvalidPrefix,
        ));
    }
    if let Some((offset, _)) = path.char_indices().find(|(_, c)| is_illegal_char(*c)) {
        return Err(PathValidationError::new(
            path,
            offset as i64,
            PathValidationReason::IllegalCharacter,
        ));
    }
    if let Some(offset) = path.find("..") {
        return Err(PathValidationError::new(
            path,
            offset as i64,
            PathValidationReason::ConsecutiveSeparators,
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("Device."; "root")]
    #[test_case("Device.WiFi.Radio.1.Enabled"; "parameter")]
    #[test_case("Device.WiFi.Radio.{i}."; "wildcard")]
    #[test_case("Device.Tab\there"; "tab is tolerated")]
    fn test_valid_paths(path: &str) {
        assert!(validate_path(path).is_ok());
    }

    #[test_case("", -1, PathValidationReason::Empty; "empty")]
    #[test_case("WiFi.Radio.", 0, PathValidationReason::InvalidPrefix; "wrong root")]
    #[test_case("device.WiFi.", 0, PathValidationReason::InvalidPrefix; "prefix is case sensitive")]
    #[test_case("Device.Wi\u{1}Fi.", 9, PathValidationReason::IllegalCharacter; "control character")]
    #[test_case("Device.Wi\u{7f}Fi.", 9, PathValidationReason::IllegalCharacter; "delete character")]
    #[test_case("Device.WiFi..Radio", 11, PathValidationReason::ConsecutiveSeparators; "double separator")]
    fn test_invalid_paths(path: &str, offset: i64, reason: PathValidationReason) {
        let err = validate_path(path).unwrap_err();
        assert_eq!(err.path, path);
        assert_eq!(err.offset, offset);
        assert_eq!(err.reason, reason);
    }

    #[test]
    fn test_too_long() {
        let path = format!("Device.{}", "a".repeat(MAX_PATH_LENGTH));
        let err = validate_path(&path).unwrap_err();
        assert_eq!(err.offset, MAX_PATH_LENGTH as i64);
        assert_eq!(err.reason, PathValidationReason::TooLong);

        let path = format!("Device.{}", "a".repeat(MAX_PATH_LENGTH - PATH_PREFIX.len()));
        assert!(validate_path(&path).is_ok());
    }
}
