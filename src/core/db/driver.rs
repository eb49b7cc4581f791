/// Driver Module
///
/// The seam between the accessor and an actual SQL transport. A `Driver`
/// opens a `DriverConnection` from a DSN; the connection runs SQL with
/// resolved bindings and reports failures as SQLSTATE-style `DriverError`s.
///
/// The crate ships `SqliteDriver`. MySQL and SQL Server transports are
/// supplied by the caller through the same traits.
use crate::core::db::dialect::Dsn;
use crate::core::db::params::Binding;
use crate::core::db::query::ResultSet;
use std::fmt;
use thiserror::Error;

/// A failure reported by the driver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("SQLSTATE[{sqlstate}]: {message}")]
pub struct DriverError {
    /// Five-character SQLSTATE class and subclass
    pub sqlstate: String,
    /// Driver-specific error code, if the driver has one
    pub code: Option<i32>,
    pub message: String,
}

impl DriverError {
    pub fn new(sqlstate: &str, message: impl Into<String>) -> Self {
        DriverError {
            sqlstate: sqlstate.to_string(),
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(mut self, code: i32) -> Self {
        self.code = Some(code);
        self
    }

    /// `HY093`: the bindings do not match the statement's placeholders.
    pub fn invalid_parameter_number(detail: impl fmt::Display) -> Self {
        DriverError::new("HY093", format!("Invalid parameter number: {}", detail))
    }
}

pub type DriverResult<T> = std::result::Result<T, DriverError>;

/// What the driver learned while preparing a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatementInfo {
    pub parameter_count: usize,
}

/// The result of running one statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outcome {
    /// Rows produced by the statement (empty for non-queries)
    pub result: ResultSet,
    /// Rows changed by the statement
    pub affected: u64,
}

/// Opens connections for a set of dialects.
pub trait Driver {
    type Connection: DriverConnection;

    /// Short driver name used in log events
    fn name(&self) -> &'static str;

    fn open(&self, dsn: &Dsn, user: &str, password: &str) -> DriverResult<Self::Connection>;
}

/// One open driver connection.
pub trait DriverConnection {
    /// Compiles `sql` without running it.
    fn prepare(&mut self, sql: &str) -> DriverResult<StatementInfo>;

    /// Prepares `sql`, applies `bindings` and runs it.
    fn run(&mut self, sql: &str, bindings: &[Binding]) -> DriverResult<Outcome>;

    /// Runs raw SQL, possibly several statements, without bindings. Returns
    /// the number of rows changed.
    fn exec(&mut self, sql: &str) -> DriverResult<u64>;

    fn begin(&mut self) -> DriverResult<()>;

    fn commit(&mut self) -> DriverResult<()>;

    fn rollback(&mut self) -> DriverResult<()>;

    fn in_transaction(&self) -> bool;

    fn last_insert_id(&self) -> DriverResult<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_error_display() {
        let err = DriverError::new("23000", "UNIQUE constraint failed").with_code(2067);
        assert_eq!(err.to_string(), "SQLSTATE[23000]: UNIQUE constraint failed");
        assert_eq!(err.code, Some(2067));
    }

    #[test]
    fn test_invalid_parameter_number() {
        let err = DriverError::invalid_parameter_number("expected 2, got 1");
        assert_eq!(err.sqlstate, "HY093");
        assert!(err.message.contains("expected 2, got 1"));
    }
}
