//! Integration tests for the accessor
//!
//! These tests drive `Database` through its public API only:
//! - a recording driver checks DSN assembly and the bindings the accessor
//!   hands over for the MySQL and SQL Server dialects
//! - a file-backed SQLite database checks persistence across connections

use sqlaccess::{
    named_params, params, AccessError, Binding, Database, Dialect, Driver, DriverConnection,
    DriverError, DriverResult, Dsn, ErrorMode, FetchMode, Outcome, ParamType, Placeholder,
    Record, ResultSet, StatementInfo, Value,
};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Everything the recording driver saw.
#[derive(Debug, Default)]
struct Log {
    opened: Vec<(String, String, String)>,
    runs: Vec<(String, Vec<Binding>)>,
    execs: Vec<String>,
}

#[derive(Clone, Default)]
struct RecordingDriver {
    log: Arc<Mutex<Log>>,
    refuse: bool,
}

struct RecordingConnection {
    log: Arc<Mutex<Log>>,
    in_tx: bool,
}

impl Driver for RecordingDriver {
    type Connection = RecordingConnection;

    fn name(&self) -> &'static str {
        "recording"
    }

    fn open(&self, dsn: &Dsn, user: &str, password: &str) -> DriverResult<RecordingConnection> {
        if self.refuse {
            return Err(DriverError::new("08001", "connection refused").with_code(2002));
        }
        self.log
            .lock()
            .unwrap()
            .opened
            .push((dsn.to_string(), user.to_string(), password.to_string()));
        Ok(RecordingConnection {
            log: Arc::clone(&self.log),
            in_tx: false,
        })
    }
}

impl DriverConnection for RecordingConnection {
    fn prepare(&mut self, sql: &str) -> DriverResult<StatementInfo> {
        Ok(StatementInfo {
            parameter_count: sql.matches('?').count(),
        })
    }

    fn run(&mut self, sql: &str, bindings: &[Binding]) -> DriverResult<Outcome> {
        self.log
            .lock()
            .unwrap()
            .runs
            .push((sql.to_string(), bindings.to_vec()));
        if sql.starts_with("SELECT") {
            Ok(Outcome {
                result: ResultSet::new(
                    vec!["n".to_string()],
                    vec![vec![Value::Integer(1)], vec![Value::Integer(2)]],
                ),
                affected: 0,
            })
        } else {
            Ok(Outcome {
                result: ResultSet::default(),
                affected: 1,
            })
        }
    }

    fn exec(&mut self, sql: &str) -> DriverResult<u64> {
        self.log.lock().unwrap().execs.push(sql.to_string());
        Ok(7)
    }

    fn begin(&mut self) -> DriverResult<()> {
        self.in_tx = true;
        Ok(())
    }

    fn commit(&mut self) -> DriverResult<()> {
        if !self.in_tx {
            return Err(DriverError::new("HY000", "There is no active transaction"));
        }
        self.in_tx = false;
        Ok(())
    }

    fn rollback(&mut self) -> DriverResult<()> {
        self.commit()
    }

    fn in_transaction(&self) -> bool {
        self.in_tx
    }

    fn last_insert_id(&self) -> DriverResult<String> {
        Ok("42".to_string())
    }
}

fn recording(dialect: Dialect) -> (Database<RecordingDriver>, Arc<Mutex<Log>>) {
    let driver = RecordingDriver::default();
    let log = Arc::clone(&driver.log);
    (Database::with_driver(driver, dialect, ErrorMode::Exception), log)
}

#[test]
fn test_mysql_dsn() {
    let (mut db, log) = recording(Dialect::MySql);
    db.connect("db.local", "shop", "root", "secret").unwrap();
    assert_eq!(
        log.lock().unwrap().opened,
        vec![(
            "mysql:host=db.local;dbname=shop".to_string(),
            "root".to_string(),
            "secret".to_string()
        )]
    );
}

#[test]
fn test_sqlserver_dsn() {
    let (mut db, log) = recording(Dialect::SqlServer);
    db.connect("sql01", "ledger", "sa", "pw").unwrap();
    assert_eq!(log.lock().unwrap().opened[0].0, "sqlsrv:Server=sql01;Database=ledger");
}

#[test]
fn test_connection_error_is_propagated() {
    let driver = RecordingDriver {
        refuse: true,
        ..Default::default()
    };
    let mut db = Database::with_driver(driver, Dialect::MySql, ErrorMode::Silent);
    match db.connect("db.local", "shop", "root", "secret") {
        Err(AccessError::Connection(err)) => {
            assert_eq!(err.sqlstate, "08001");
            assert_eq!(err.code, Some(2002));
        }
        other => panic!("Expected connection error, got {:?}", other),
    }
}

#[test]
fn test_named_params_bind_by_name_with_inferred_types() {
    let (mut db, log) = recording(Dialect::MySql);
    db.connect("h", "d", "u", "p").unwrap();
    let affected = db
        .execute(
            "UPDATE t SET x = 1 WHERE id = :id AND flag = :flag AND note = :note",
            named_params! { "id" => 5, "flag" => false, "note" => Value::Null },
        )
        .unwrap();
    assert_eq!(affected, 1);

    let log = log.lock().unwrap();
    let bindings = &log.runs[0].1;
    assert_eq!(bindings[0].placeholder, Placeholder::Name(":id".to_string()));
    assert_eq!(bindings[0].ty, ParamType::Int);
    assert_eq!(bindings[1].ty, ParamType::Bool);
    assert_eq!(bindings[2].ty, ParamType::Null);
}

#[test]
fn test_positional_params_bind_in_order() {
    let (mut db, log) = recording(Dialect::SqlServer);
    db.connect("h", "d", "u", "p").unwrap();
    db.query("SELECT n FROM t WHERE a = ? AND b = ?", params!["x", 2.5], false, FetchMode::Num)
        .unwrap();

    let log = log.lock().unwrap();
    let bindings = &log.runs[0].1;
    assert_eq!(bindings[0].placeholder, Placeholder::Index(1));
    assert_eq!(bindings[0].ty, ParamType::Str);
    assert_eq!(bindings[1].placeholder, Placeholder::Index(2));
    // Floats fall through to string binding
    assert_eq!(bindings[1].ty, ParamType::Str);
}

#[test]
fn test_empty_params_execute_raw_sql() {
    let (mut db, log) = recording(Dialect::MySql);
    db.connect("h", "d", "u", "p").unwrap();
    assert_eq!(db.execute("DELETE FROM t", ()).unwrap(), 7);
    assert_eq!(log.lock().unwrap().execs, vec!["DELETE FROM t".to_string()]);
}

#[test]
fn test_single_row_takes_first_row_only() {
    let (mut db, _log) = recording(Dialect::MySql);
    db.connect("h", "d", "u", "p").unwrap();
    let one = db.query("SELECT n FROM t", (), true, FetchMode::Column(0)).unwrap();
    assert_eq!(one.len(), 1);
    let all = db.query("SELECT n FROM t", (), false, FetchMode::Column(0)).unwrap();
    assert_eq!(all.len(), 2);
}

#[test]
fn test_commit_failure_follows_driver() {
    let (mut db, _log) = recording(Dialect::MySql);
    db.connect("h", "d", "u", "p").unwrap();
    let err = db.commit().map(|_| ()).unwrap_err();
    assert_eq!(err.driver_error().unwrap().message, "There is no active transaction");

    db.begin_transaction().unwrap();
    assert!(db.in_transaction());
    db.commit().unwrap();
    assert_eq!(db.last_insert_id().unwrap(), "42");
}

#[test]
fn test_file_database_persists_across_connections() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app.db");
    let path = path.to_str().unwrap();

    let mut db = Database::new(Dialect::Sqlite, ErrorMode::Exception);
    db.connect("", path, "", "").unwrap();
    db.execute(
        "CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT);
         INSERT INTO notes (body) VALUES ('first'), ('second');",
        (),
    )
    .unwrap();
    db.disconnect();

    let mut db = Database::new(Dialect::Sqlite, ErrorMode::Exception);
    db.connect("", path, "", "").unwrap();
    let rows = db
        .query("SELECT body FROM notes ORDER BY id", (), false, FetchMode::Assoc)
        .unwrap()
        .into_rows();
    let bodies: Vec<_> = rows.iter().map(|r| r.get("body").cloned()).collect();
    assert_eq!(bodies, vec![Some(Value::from("first")), Some(Value::from("second"))]);
}

#[test]
fn test_update_by_named_id_counts_rows() {
    let mut db = Database::new(Dialect::Sqlite, ErrorMode::Exception);
    db.connect("", ":memory:", "", "").unwrap();
    db.execute(
        "CREATE TABLE t (id INTEGER PRIMARY KEY, x INTEGER);
         INSERT INTO t (id, x) VALUES (5, 0), (6, 0);",
        (),
    )
    .unwrap();

    let updated = db
        .execute("UPDATE t SET x=1 WHERE id=:id", named_params! { "id" => 5 })
        .unwrap();
    assert_eq!(updated, 1);
}

#[test]
fn test_prepared_lookup_by_id() {
    let mut db = Database::new(Dialect::Sqlite, ErrorMode::Exception);
    db.connect("", ":memory:", "", "").unwrap();
    db.execute("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT); INSERT INTO t VALUES (5, 'five');", ())
        .unwrap();

    let row = db
        .prepare_statement("SELECT * FROM t WHERE id=?")
        .unwrap()
        .execute_statement(5)
        .unwrap()
        .fetch(true, FetchMode::Assoc)
        .unwrap()
        .into_row()
        .unwrap();
    assert_eq!(row.get("name"), Some(&Value::from("five")));

    let absent = db.execute_statement(6).unwrap().fetch(true, FetchMode::Assoc).unwrap();
    assert!(absent.is_empty());
}

fn typed_columns_database() -> Database {
    let mut db = Database::new(Dialect::Sqlite, ErrorMode::Exception);
    db.connect("", ":memory:", "", "").unwrap();
    db.execute("CREATE TABLE m (id INTEGER PRIMARY KEY, r REAL, b BLOB, u)", ())
        .unwrap();
    db
}

fn stored(db: &mut Database, id: i64) -> Record {
    db.query(
        "SELECT r, typeof(r) AS rt, b, typeof(b) AS bt, u, typeof(u) AS ut FROM m WHERE id = ?",
        id,
        true,
        FetchMode::Assoc,
    )
    .unwrap()
    .into_row()
    .unwrap()
}

#[test]
fn test_blob_parameters_keep_their_bytes() {
    let bytes = vec![0xff, 0x00, 0x80, 0x41];
    let mut db = typed_columns_database();

    db.execute(
        "INSERT INTO m (id, b, u) VALUES (?, ?, ?)",
        params![1, Value::Blob(bytes.clone()), Value::Blob(bytes.clone())],
    )
    .unwrap();
    db.prepare_statement("INSERT INTO m (id, b, u) VALUES (:id, :b, :u)")
        .unwrap()
        .execute_statement(named_params! {
            "id" => 2,
            "b" => Value::Blob(bytes.clone()),
            "u" => Value::Blob(bytes.clone()),
        })
        .unwrap();

    for id in [1, 2] {
        let row = stored(&mut db, id);
        assert_eq!(row.get("b"), Some(&Value::Blob(bytes.clone())));
        assert_eq!(row.get("bt"), Some(&Value::from("blob")));
        assert_eq!(row.get("u"), Some(&Value::Blob(bytes.clone())));
        assert_eq!(row.get("ut"), Some(&Value::from("blob")));
    }
}

#[test]
fn test_real_parameters_bind_as_strings() {
    let mut db = typed_columns_database();
    db.execute("INSERT INTO m (id, r, u) VALUES (?, ?, ?)", params![1, 1.5, 1.5])
        .unwrap();

    let row = stored(&mut db, 1);
    // A REAL column converts the string back; an untyped column keeps the text
    assert_eq!(row.get("r"), Some(&Value::Real(1.5)));
    assert_eq!(row.get("rt"), Some(&Value::from("real")));
    assert_eq!(row.get("u"), Some(&Value::from("1.5")));
    assert_eq!(row.get("ut"), Some(&Value::from("text")));

    let matched = db
        .query("SELECT id FROM m WHERE r = ?", 1.5, false, FetchMode::Column(0))
        .unwrap();
    assert_eq!(matched.len(), 1);
}
