/// SQLite Driver Module
///
/// The bundled driver, built on rusqlite. It accepts `sqlite:` DSNs only;
/// opening any other dialect fails the way a missing driver does.
use crate::core::db::dialect::{Dialect, Dsn};
use crate::core::db::driver::{
    Driver, DriverConnection, DriverError, DriverResult, Outcome, StatementInfo,
};
use crate::core::db::params::{Binding, Placeholder};
use crate::core::db::query::ResultSet;
use crate::core::db::value::Value;
use rusqlite::types::{ToSqlOutput, Value as SqlValue, ValueRef};
use rusqlite::{Connection, ErrorCode, ToSql};
use std::collections::HashSet;
use std::time::Duration;
use tracing::debug;

/// Opens rusqlite connections.
#[derive(Debug, Clone)]
pub struct SqliteDriver {
    foreign_keys: bool,
    busy_timeout: Option<Duration>,
}

impl Default for SqliteDriver {
    fn default() -> Self {
        SqliteDriver {
            foreign_keys: true,
            busy_timeout: None,
        }
    }
}

impl SqliteDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables `PRAGMA foreign_keys` on every new connection.
    pub fn with_foreign_keys(mut self, enabled: bool) -> Self {
        self.foreign_keys = enabled;
        self
    }

    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = Some(timeout);
        self
    }
}

impl Driver for SqliteDriver {
    type Connection = SqliteConnection;

    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn open(&self, dsn: &Dsn, _user: &str, _password: &str) -> DriverResult<SqliteConnection> {
        if dsn.dialect != Dialect::Sqlite {
            return Err(DriverError::new("IM002", "could not find driver"));
        }

        let conn = Connection::open(&dsn.database).map_err(driver_error)?;
        let foreign_keys = if self.foreign_keys { "ON" } else { "OFF" };
        conn.execute_batch(&format!("PRAGMA foreign_keys = {};", foreign_keys))
            .map_err(driver_error)?;
        if let Some(timeout) = self.busy_timeout {
            conn.busy_timeout(timeout).map_err(driver_error)?;
        }

        debug!(database = %dsn.database, foreign_keys, "opened sqlite connection");
        Ok(SqliteConnection { conn })
    }
}

/// An open SQLite connection.
#[derive(Debug)]
pub struct SqliteConnection {
    conn: Connection,
}

impl SqliteConnection {
    fn total_changes(&self) -> DriverResult<u64> {
        self.conn
            .query_row("SELECT total_changes()", [], |row| row.get::<_, i64>(0))
            .map(|n| n as u64)
            .map_err(driver_error)
    }
}

impl DriverConnection for SqliteConnection {
    fn prepare(&mut self, sql: &str) -> DriverResult<StatementInfo> {
        let stmt = self.conn.prepare_cached(sql).map_err(driver_error)?;
        Ok(StatementInfo {
            parameter_count: stmt.parameter_count(),
        })
    }

    fn run(&mut self, sql: &str, bindings: &[Binding]) -> DriverResult<Outcome> {
        let mut stmt = self.conn.prepare_cached(sql).map_err(driver_error)?;
        let expected = stmt.parameter_count();

        let mut bound = HashSet::new();
        for binding in bindings {
            let index = match &binding.placeholder {
                Placeholder::Index(i) if (1..=expected).contains(i) => *i,
                Placeholder::Index(i) => {
                    return Err(DriverError::invalid_parameter_number(format!(
                        "position {} out of range, statement has {} parameter(s)",
                        i, expected
                    )))
                }
                Placeholder::Name(name) => stmt
                    .parameter_index(name)
                    .map_err(driver_error)?
                    .ok_or_else(|| {
                        DriverError::invalid_parameter_number(format!(
                            "parameter {} was not defined",
                            name
                        ))
                    })?,
            };
            stmt.raw_bind_parameter(index, binding.resolved_value())
                .map_err(driver_error)?;
            bound.insert(index);
        }

        if bound.len() != expected {
            return Err(DriverError::invalid_parameter_number(format!(
                "statement has {} parameter(s), {} bound",
                expected,
                bound.len()
            )));
        }

        if stmt.column_count() == 0 {
            let affected = stmt.raw_execute().map_err(driver_error)?;
            return Ok(Outcome {
                result: ResultSet::default(),
                affected: affected as u64,
            });
        }

        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let mut rows = stmt.raw_query();
        let mut values = Vec::new();
        while let Some(row) = rows.next().map_err(driver_error)? {
            let mut record = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                record.push(value_from_ref(row.get_ref(i).map_err(driver_error)?));
            }
            values.push(record);
        }

        Ok(Outcome {
            result: ResultSet::new(columns, values),
            affected: 0,
        })
    }

    fn exec(&mut self, sql: &str) -> DriverResult<u64> {
        let before = self.total_changes()?;
        self.conn.execute_batch(sql).map_err(driver_error)?;
        Ok(self.total_changes()?.saturating_sub(before))
    }

    fn begin(&mut self) -> DriverResult<()> {
        self.conn.execute_batch("BEGIN").map_err(driver_error)
    }

    fn commit(&mut self) -> DriverResult<()> {
        self.conn.execute_batch("COMMIT").map_err(driver_error)
    }

    fn rollback(&mut self) -> DriverResult<()> {
        self.conn.execute_batch("ROLLBACK").map_err(driver_error)
    }

    fn in_transaction(&self) -> bool {
        !self.conn.is_autocommit()
    }

    fn last_insert_id(&self) -> DriverResult<String> {
        Ok(self.conn.last_insert_rowid().to_string())
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(SqlValue::Null),
            Value::Bool(b) => ToSqlOutput::Owned(SqlValue::Integer(*b as i64)),
            Value::Integer(i) => ToSqlOutput::Owned(SqlValue::Integer(*i)),
            Value::Real(f) => ToSqlOutput::Owned(SqlValue::Real(*f)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}

fn value_from_ref(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Real(f),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    }
}

/// Maps a rusqlite error onto a SQLSTATE-style driver error.
fn driver_error(err: rusqlite::Error) -> DriverError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, message) => {
            let sqlstate = match failure.code {
                ErrorCode::ConstraintViolation => "23000",
                _ => "HY000",
            };
            let message = message.clone().unwrap_or_else(|| failure.to_string());
            DriverError::new(sqlstate, message).with_code(failure.extended_code)
        }
        _ => DriverError::new("HY000", err.to_string()),
    }
}
