/// # Test Utilities Module
///
/// Database fixtures shared by the unit tests. Every fixture is an isolated
/// in-memory SQLite database, so tests can run in parallel.
use crate::core::db::{Database, Dialect, ErrorMode};

const SAMPLE_SCHEMA: &str = "
    CREATE TABLE users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        active BOOLEAN DEFAULT 1,
        score REAL
    );

    INSERT INTO users (name, email, active, score) VALUES
        ('ada', 'ada@example.com', 1, 1.5),
        ('bob', 'bob@example.com', 1, 2.5),
        ('cy', 'cy@example.com', 0, NULL);
";

/// An empty in-memory database under the given error mode.
pub fn memory_database(error_mode: ErrorMode) -> Database {
    let mut db = Database::new(Dialect::Sqlite, error_mode);
    db.connect("", ":memory:", "", "")
        .expect("in-memory database should open");
    db
}

/// An in-memory database with a `users` table holding three rows.
pub fn sample_database() -> Database {
    let mut db = memory_database(ErrorMode::Exception);
    db.execute(SAMPLE_SCHEMA, ())
        .expect("sample schema should load");
    db
}
