/// Core Module for sqlaccess
///
/// This module contains the accessor itself together with the value, parameter
/// and driver types it is built from, plus the crate-wide error type.

pub mod db;
pub mod error;

// Re-export commonly used types for convenience
pub use error::{AccessError, Result};
