use common::ErrorLocation;

use std::panic::Location;

use thiserror::Error as ThisError;

/// Errors raised while turning a wire line into a typed response or value.
#[derive(Debug, ThisError)]
pub enum ResponseError {
    #[error("Unknown Response Kind Error: '{kind}' in line '{line}' {location}")]
    UnknownResponseKind {
        kind: String,
        line: String,
        location: ErrorLocation,
    },

    #[error("Malformed Response Error: {message} in line '{line}' {location}")]
    Malformed {
        message: String,
        line: String,
        location: ErrorLocation,
    },

    #[error("Invalid Value Error: '{value}' is not a valid {expected} {location}")]
    InvalidValue {
        value: String,
        expected: &'static str,
        location: ErrorLocation,
    },
}

impl ResponseError {
    #[track_caller]
    pub fn unknown_kind(kind: impl Into<String>, line: impl Into<String>) -> Self {
        ResponseError::UnknownResponseKind {
            kind: kind.into(),
            line: line.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn malformed(message: impl Into<String>, line: impl Into<String>) -> Self {
        ResponseError::Malformed {
            message: message.into(),
            line: line.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn invalid_value(value: impl Into<String>, expected: &'static str) -> Self {
        ResponseError::InvalidValue {
            value: value.into(),
            expected,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
