/// Connection Management Module
///
/// This module provides `Database`, the accessor that owns one driver
/// connection and at most one prepared statement. Every query, execute and
/// statement call goes through it, and driver failures are surfaced
/// according to the accessor's error mode.

use crate::core::db::dialect::{Dialect, Dsn, ErrorMode};
use crate::core::db::driver::{Driver, DriverConnection, DriverError, DriverResult};
use crate::core::db::params::{ParamSlot, Params, Placeholder};
use crate::core::db::query::{FetchMode, QueryResult, ResultCursor};
use crate::core::db::sqlite::SqliteDriver;
use crate::core::db::statement::PreparedStatement;
use crate::core::db::value::{ParamType, Value};
use crate::core::{AccessError, Result};
use std::ops::{Deref, DerefMut};
use tracing::{debug, info, warn};

/// A database accessor.
///
/// The accessor is in one of two statement states: no statement, or a
/// statement prepared by [`Database::prepare_statement`] and held until
/// [`Database::clear_statement`] or the next `prepare_statement`. Ad-hoc
/// [`Database::query`] and [`Database::execute`] calls never touch the held
/// statement.
#[derive(Debug)]
pub struct Database<D: Driver = SqliteDriver> {
    driver: D,
    dialect: Dialect,
    error_mode: ErrorMode,
    conn: Option<D::Connection>,
    stmt: Option<PreparedStatement>,
    last_error: Option<DriverError>,
}

impl Default for Database<SqliteDriver> {
    fn default() -> Self {
        Database::new(Dialect::default(), ErrorMode::default())
    }
}

impl Database<SqliteDriver> {
    /// Creates an accessor backed by the bundled SQLite driver.
    pub fn new(dialect: Dialect, error_mode: ErrorMode) -> Self {
        Database::with_driver(SqliteDriver::default(), dialect, error_mode)
    }
}

impl<D: Driver> Database<D> {
    pub fn with_driver(driver: D, dialect: Dialect, error_mode: ErrorMode) -> Self {
        Database {
            driver,
            dialect,
            error_mode,
            conn: None,
            stmt: None,
            last_error: None,
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn error_mode(&self) -> ErrorMode {
        self.error_mode
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    pub fn has_statement(&self) -> bool {
        self.stmt.is_some()
    }

    /// The failure of the most recent driver call, cleared by the next
    /// successful one.
    pub fn error_info(&self) -> Option<&DriverError> {
        self.last_error.as_ref()
    }

    /// Connects to `database` on `host`.
    ///
    /// Builds the dialect's DSN and opens it with the driver. A previous
    /// connection and its statement are released. Connection failures are
    /// always returned as `AccessError::Connection`, whatever the error mode.
    ///
    /// # Examples
    ///
    /// ```
    /// use sqlaccess::{Database, Dialect, ErrorMode};
    ///
    /// let mut db = Database::new(Dialect::Sqlite, ErrorMode::Exception);
    /// db.connect("", ":memory:", "", "")?;
    /// assert!(db.is_connected());
    /// # Ok::<(), sqlaccess::AccessError>(())
    /// ```
    pub fn connect(&mut self, host: &str, database: &str, user: &str, password: &str) -> Result<()> {
        let dsn = Dsn::new(self.dialect, host, database);
        info!(driver = self.driver.name(), dsn = %dsn, "connecting");

        let conn = match self.driver.open(&dsn, user, password) {
            Ok(conn) => conn,
            Err(err) => {
                self.last_error = Some(err.clone());
                return Err(AccessError::Connection(err));
            }
        };

        self.stmt = None;
        self.conn = Some(conn);
        self.last_error = None;
        Ok(())
    }

    /// Releases the statement and the connection.
    pub fn disconnect(&mut self) {
        self.stmt = None;
        if self.conn.take().is_some() {
            info!(dialect = %self.dialect, "disconnected");
        }
    }

    /// Runs a read query.
    ///
    /// The SQL is prepared as a single statement and `params`, if any, are
    /// bound by position or by name. `single_row` selects `QueryResult::Row`
    /// (first row or `None`) over `QueryResult::Rows`.
    pub fn query(
        &mut self,
        sql: &str,
        params: impl Into<Params>,
        single_row: bool,
        mode: FetchMode,
    ) -> Result<QueryResult> {
        let params = params.into();
        debug!(sql, params = params.len(), named = params.is_named(), single_row, "query");

        let result = self.conn_mut()?.run(sql, &params.into_bindings());
        match self.settle("query", result.map(Some), None)? {
            Some(outcome) => ResultCursor::new(outcome.result).fetch(single_row, mode),
            None => Ok(QueryResult::Failed),
        }
    }

    /// Runs a statement and returns the number of affected rows.
    ///
    /// With empty `params` the SQL is executed directly and may hold several
    /// statements; the count then covers all of them.
    pub fn execute(&mut self, sql: &str, params: impl Into<Params>) -> Result<u64> {
        let params = params.into();
        debug!(sql, params = params.len(), named = params.is_named(), "execute");

        let conn = self.conn_mut()?;
        let result = if params.is_empty() {
            conn.exec(sql)
        } else {
            conn.run(sql, &params.into_bindings()).map(|outcome| outcome.affected)
        };
        self.settle("execute", result, 0)
    }

    /// Prepares `sql` and holds it as the active statement.
    ///
    /// Under a non-raising error mode a failed prepare leaves no statement,
    /// so later statement calls fail with `NoActiveStatement`.
    pub fn prepare_statement(&mut self, sql: &str) -> Result<&mut Self> {
        debug!(sql, "prepare statement");
        let result = self.conn_mut()?.prepare(sql);
        self.stmt = self
            .settle("prepare statement", result.map(Some), None)?
            .map(|info| PreparedStatement::new(sql, info));
        Ok(self)
    }

    /// Executes the held statement.
    ///
    /// Non-empty `params` are bound for this execution instead of the
    /// `bind_*` bindings; a scalar counts as a one-element list. Empty
    /// `params` use the `bind_*` bindings, reading slots now.
    pub fn execute_statement(&mut self, params: impl Into<Params>) -> Result<&mut Self> {
        let params = params.into();
        let stmt = self.stmt_mut()?;
        stmt.reset_result();
        let sql = stmt.sql().to_string();
        let bindings = if params.is_empty() {
            stmt.bindings()
        } else {
            params.into_bindings()
        };
        debug!(sql = %sql, bindings = bindings.len(), "execute statement");

        let result = self.conn_mut()?.run(&sql, &bindings);
        if let Some(outcome) = self.settle("execute statement", result.map(Some), None)? {
            self.stmt_mut()?
                .set_result(ResultCursor::new(outcome.result), outcome.affected);
        }
        Ok(self)
    }

    /// Binds `slot` to a placeholder of the held statement.
    ///
    /// The slot is read when the statement executes, so values set after
    /// binding are the ones sent. With `ty` unset the type is inferred from
    /// the value at that point; `length` caps string and blob values.
    ///
    /// A position outside the statement's parameters is a driver error
    /// (`HY093`) and binds nothing.
    pub fn bind_param(
        &mut self,
        placeholder: impl Into<Placeholder>,
        slot: &ParamSlot,
        ty: Option<ParamType>,
        length: Option<usize>,
    ) -> Result<&mut Self> {
        let placeholder = placeholder.into();
        if self.check_placeholder("bind param", &placeholder)? {
            self.stmt_mut()?.bind_slot(placeholder, slot, ty, length);
        }
        Ok(self)
    }

    /// Binds a value, copied now, to a placeholder of the held statement.
    pub fn bind_value(
        &mut self,
        placeholder: impl Into<Placeholder>,
        value: impl Into<Value>,
        ty: Option<ParamType>,
    ) -> Result<&mut Self> {
        let placeholder = placeholder.into();
        if self.check_placeholder("bind value", &placeholder)? {
            self.stmt_mut()?.bind_value(placeholder, value.into(), ty);
        }
        Ok(self)
    }

    /// Fetches the next row, or all remaining rows, of the held statement's
    /// last execution. Before any execution the result is empty.
    pub fn fetch(&mut self, single_row: bool, mode: FetchMode) -> Result<QueryResult> {
        match self.stmt_mut()?.cursor_mut() {
            Some(cursor) => cursor.fetch(single_row, mode),
            None if single_row => Ok(QueryResult::Row(None)),
            None => Ok(QueryResult::Rows(Vec::new())),
        }
    }

    /// Rows changed by the held statement's last execution.
    pub fn row_count(&self) -> Result<u64> {
        self.stmt
            .as_ref()
            .map(PreparedStatement::row_count)
            .ok_or(AccessError::NoActiveStatement)
    }

    /// Drops the held statement.
    pub fn clear_statement(&mut self) -> &mut Self {
        self.stmt = None;
        self
    }

    /// Prepares `sql` and returns a guard that clears the statement when it
    /// goes out of scope.
    pub fn scoped_statement(&mut self, sql: &str) -> Result<StatementScope<'_, D>> {
        self.prepare_statement(sql)?;
        Ok(StatementScope { db: self })
    }

    pub fn begin_transaction(&mut self) -> Result<&mut Self> {
        let result = self.conn_mut()?.begin();
        self.settle("begin transaction", result, ())?;
        Ok(self)
    }

    pub fn commit(&mut self) -> Result<&mut Self> {
        let result = self.conn_mut()?.commit();
        self.settle("commit", result, ())?;
        Ok(self)
    }

    pub fn rollback(&mut self) -> Result<&mut Self> {
        let result = self.conn_mut()?.rollback();
        self.settle("rollback", result, ())?;
        Ok(self)
    }

    pub fn in_transaction(&self) -> bool {
        self.conn
            .as_ref()
            .map(DriverConnection::in_transaction)
            .unwrap_or(false)
    }

    /// Runs `f` inside a transaction: commits when it returns `Ok`, rolls
    /// back when it returns `Err`.
    pub fn transaction<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        self.begin_transaction()?;
        match f(self) {
            Ok(value) => {
                self.commit()?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = self.rollback() {
                    warn!(error = %rollback_err, "rollback after failed transaction failed");
                }
                Err(err)
            }
        }
    }

    /// The driver's identifier for the last inserted row.
    pub fn last_insert_id(&mut self) -> Result<String> {
        let result = self
            .conn
            .as_ref()
            .ok_or(AccessError::NotConnected)?
            .last_insert_id();
        self.settle("last insert id", result, String::new())
    }

    fn conn_mut(&mut self) -> Result<&mut D::Connection> {
        self.conn.as_mut().ok_or(AccessError::NotConnected)
    }

    fn stmt_mut(&mut self) -> Result<&mut PreparedStatement> {
        self.stmt.as_mut().ok_or(AccessError::NoActiveStatement)
    }

    /// `Ok(true)` when `placeholder` can be bound on the held statement.
    fn check_placeholder(&mut self, operation: &'static str, placeholder: &Placeholder) -> Result<bool> {
        let result = self.stmt_mut()?.check_placeholder(placeholder);
        self.settle(operation, result.map(|_| true), false)
    }

    /// Applies the error mode to a driver result.
    fn settle<T>(&mut self, operation: &'static str, result: DriverResult<T>, sentinel: T) -> Result<T> {
        match result {
            Ok(value) => {
                self.last_error = None;
                Ok(value)
            }
            Err(err) => {
                self.last_error = Some(err.clone());
                match self.error_mode {
                    ErrorMode::Exception => Err(AccessError::Driver(err)),
                    ErrorMode::Warning => {
                        warn!(operation, error = %err, "driver call failed");
                        Ok(sentinel)
                    }
                    ErrorMode::Silent => {
                        debug!(operation, error = %err, "driver call failed");
                        Ok(sentinel)
                    }
                }
            }
        }
    }
}

impl<D: Driver> Drop for Database<D> {
    fn drop(&mut self) {
        self.stmt = None;
        if self.conn.take().is_some() {
            debug!(dialect = %self.dialect, "released connection");
        }
    }
}

/// Guard returned by [`Database::scoped_statement`].
///
/// Derefs to the accessor; the held statement is cleared on drop, including
/// when the scope is left through `?`.
pub struct StatementScope<'db, D: Driver = SqliteDriver> {
    db: &'db mut Database<D>,
}

impl<D: Driver> Deref for StatementScope<'_, D> {
    type Target = Database<D>;

    fn deref(&self) -> &Database<D> {
        self.db
    }
}

impl<D: Driver> DerefMut for StatementScope<'_, D> {
    fn deref_mut(&mut self) -> &mut Database<D> {
        self.db
    }
}

impl<D: Driver> Drop for StatementScope<'_, D> {
    fn drop(&mut self) {
        self.db.clear_statement();
    }
}
