/// Dialect Module
///
/// Connection-string syntax per SQL dialect, and the error mode an accessor
/// runs under. Both are fixed when the accessor is constructed.
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// Supported SQL dialects. The dialect only selects the DSN syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// MySQL (`mysql:` DSNs)
    #[default]
    MySql,
    /// Microsoft SQL Server (`sqlsrv:` DSNs)
    #[serde(rename = "sqlsrv", alias = "mssql")]
    SqlServer,
    /// SQLite (`sqlite:` DSNs), served by the bundled driver
    Sqlite,
}

impl Dialect {
    /// The DSN prefix, without the trailing colon.
    pub fn prefix(&self) -> &'static str {
        match self {
            Dialect::MySql => "mysql",
            Dialect::SqlServer => "sqlsrv",
            Dialect::Sqlite => "sqlite",
        }
    }
}

impl Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.prefix())
    }
}

/// How driver failures surface to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorMode {
    /// Return a sentinel and record the error
    Silent,
    /// Like `Silent`, plus a `warn!` event
    Warning,
    /// Return the error
    #[default]
    Exception,
}

/// A data source name: dialect plus the host and database it points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dsn {
    pub dialect: Dialect,
    pub host: String,
    pub database: String,
}

impl Dsn {
    pub fn new(dialect: Dialect, host: &str, database: &str) -> Self {
        Dsn {
            dialect,
            host: host.to_string(),
            database: database.to_string(),
        }
    }
}

impl Display for Dsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.dialect {
            Dialect::MySql => write!(f, "mysql:host={};dbname={}", self.host, self.database),
            Dialect::SqlServer => write!(f, "sqlsrv:Server={};Database={}", self.host, self.database),
            Dialect::Sqlite => write!(f, "sqlite:{}", self.database),
        }
    }
}
