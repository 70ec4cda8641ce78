//! Error types for the jotter application.
//!
//! This module defines custom error types that categorize the failures
//! that can occur while loading, mutating and persisting notes and todos.

use std::{io, path::PathBuf};

use thiserror::Error;

/// The main error type for the jotter application.
#[derive(Error, Debug)]
pub enum JotError {
    /// Errors related to file I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors related to serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The durable backend could not be reached.
    #[error("Backend unavailable: {message}")]
    BackendUnavailable { message: String },

    /// The blob stored under `key` does not parse into records.
    #[error("Corrupt state under key '{key}': {source}")]
    CorruptState {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// A record was rejected because its required content is empty.
    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    /// No record with this id exists in the collection.
    #[error("Record not found: {id}")]
    RecordNotFound { id: String },

    /// Invalid input format (dates, times, ...).
    #[error("Invalid format: {message}")]
    InvalidFormat { message: String },

    /// Errors related to configuration.
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Directory creation or access failed.
    #[error("Failed to create or access directory: {path}")]
    DirectoryError { path: PathBuf },

    /// for mutex lock acquisition issues
    #[error("{message}")]
    LockAcquisitionFailed { message: String },

    /// Generic application error with a custom message.
    #[error("{message}")]
    ApplicationError { message: String },
}
