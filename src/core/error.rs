/// Error Module
///
/// This module defines the error types surfaced by the accessor. Driver
/// failures keep their SQLSTATE-style shape (`DriverError`) and are wrapped,
/// not translated; everything else is local to the accessor.
use crate::core::db::DriverError;
use thiserror::Error;

/// Error type for every fallible accessor operation.
///
/// The variants fall into three groups:
/// - Driver failures (connection open, statement execution)
/// - Accessor state violations (no connection, no prepared statement)
/// - Ambient failures (configuration, I/O, JSON)
#[derive(Error, Debug)]
pub enum AccessError {
    /// Opening the driver connection failed
    #[error("Connection error: {0}")]
    Connection(DriverError),

    /// A driver call failed while the error mode is `Exception`
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// A connection-scoped operation was called before `connect`
    #[error("Invalid state: not connected")]
    NotConnected,

    /// A statement-scoped operation was called without a prepared statement
    #[error("Invalid state: no active statement")]
    NoActiveStatement,

    /// `FetchMode::Column` pointed past the last column of the result
    #[error("Invalid column index {index}: result has {count} column(s)")]
    InvalidColumn { index: usize, count: usize },

    /// Configuration loading and validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system and I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AccessError {
    /// Returns true for errors raised because the accessor was in the wrong state.
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, AccessError::NotConnected | AccessError::NoActiveStatement)
    }

    /// The driver error behind this failure, if any.
    pub fn driver_error(&self) -> Option<&DriverError> {
        match self {
            AccessError::Connection(err) | AccessError::Driver(err) => Some(err),
            _ => None,
        }
    }
}

/// Type alias for Result to use AccessError as the error type.
pub type Result<T> = std::result::Result<T, AccessError>;
