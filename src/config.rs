use crate::core::db::{Database, Dialect, ErrorMode, SqliteDriver};
use crate::core::{AccessError, Result};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration structure parsed from a TOML file.
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub connection: ConnectionConfig,
    pub sqlite: Option<SqliteConfig>,
}

/// Where to connect and how driver failures surface.
#[derive(Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub dialect: Dialect,
    pub host: String,
    pub database: String,
    pub user: String,
    pub password: String,
    pub error_mode: ErrorMode,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        ConnectionConfig {
            dialect: Dialect::Sqlite,
            host: String::new(),
            database: ":memory:".to_string(),
            user: String::new(),
            password: String::new(),
            error_mode: ErrorMode::default(),
        }
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("dialect", &self.dialect)
            .field("host", &self.host)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("error_mode", &self.error_mode)
            .finish()
    }
}

/// SQLite-related configuration.
#[derive(Debug, Deserialize)]
pub struct SqliteConfig {
    pub foreign_keys: Option<bool>,
    pub busy_timeout_ms: Option<u64>,
}

impl SqliteConfig {
    pub fn driver(&self) -> SqliteDriver {
        let mut driver = SqliteDriver::new().with_foreign_keys(self.foreign_keys.unwrap_or(true));
        if let Some(ms) = self.busy_timeout_ms {
            driver = driver.with_busy_timeout(Duration::from_millis(ms));
        }
        driver
    }
}

impl Config {
    /// Builds an accessor with the bundled SQLite driver and connects it.
    pub fn open(&self) -> Result<Database> {
        let driver = self
            .sqlite
            .as_ref()
            .map(SqliteConfig::driver)
            .unwrap_or_default();
        let conn = &self.connection;
        let mut db = Database::with_driver(driver, conn.dialect, conn.error_mode);
        db.connect(&conn.host, &conn.database, &conn.user, &conn.password)?;
        Ok(db)
    }
}

/// Loads configuration from a TOML file at the given path.
///
/// # Example
///
/// ```no_run
/// let config = sqlaccess::config::load_config("config.toml").expect("Failed to load config");
/// println!("{:?}", config);
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|e| AccessError::Config(e.to_string()))
}

/// `<config dir>/sqlaccess/config.toml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("sqlaccess").join("config.toml"))
}
