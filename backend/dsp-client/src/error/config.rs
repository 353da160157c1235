use common::ErrorLocation;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config Read Error: {path}: {source} {location}")]
    ReadError {
        location: ErrorLocation,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config Parse Error: {path}: {reason} {location}")]
    ParseError {
        location: ErrorLocation,
        path: PathBuf,
        reason: String,
    },

    #[error("Config Write Error: {path}: {source} {location}")]
    WriteError {
        location: ErrorLocation,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config Serialization Error: {reason} {location}")]
    SerializeError {
        location: ErrorLocation,
        reason: String,
    },

    #[error("Config Validation Error: {reason} {location}")]
    ValidationError {
        location: ErrorLocation,
        reason: String,
    },
}

impl ConfigError {
    #[track_caller]
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::ReadError {
            location: ErrorLocation::from(std::panic::Location::caller()),
            path: path.into(),
            source,
        }
    }

    #[track_caller]
    pub fn parse(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ConfigError::ParseError {
            location: ErrorLocation::from(std::panic::Location::caller()),
            path: path.into(),
            reason: reason.into(),
        }
    }

    #[track_caller]
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::WriteError {
            location: ErrorLocation::from(std::panic::Location::caller()),
            path: path.into(),
            source,
        }
    }

    #[track_caller]
    pub fn serialize(reason: impl Into<String>) -> Self {
        ConfigError::SerializeError {
            location: ErrorLocation::from(std::panic::Location::caller()),
            reason: reason.into(),
        }
    }

    #[track_caller]
    pub fn validation(reason: impl Into<String>) -> Self {
        ConfigError::ValidationError {
            location: ErrorLocation::from(std::panic::Location::caller()),
            reason: reason.into(),
        }
    }

    /// File the failing operation touched, when there is one.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            ConfigError::ReadError { path, .. }
            | ConfigError::ParseError { path, .. }
            | ConfigError::WriteError { path, .. } => Some(path),
            ConfigError::SerializeError { .. } | ConfigError::ValidationError { .. } => None,
        }
    }
}
