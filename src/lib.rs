// Core infrastructure modules
pub mod core;

// Configuration
pub mod config;

#[cfg(test)]
pub(crate) mod test_utils;

pub use crate::core::db::{
    Binding, Database, Dialect, Driver, DriverConnection, DriverError, DriverResult, Dsn,
    ErrorMode, FetchMode, Outcome, ParamSlot, ParamType, Params, Placeholder, QueryResult,
    Record, ResultSet, SqliteDriver, StatementInfo, StatementScope, Value,
};
pub use crate::core::{AccessError, Result};
