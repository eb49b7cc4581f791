/// Database Module
///
/// This module provides the accessor and everything it is built from,
/// organized into focused submodules.
///
/// ## Architecture
///
/// - **Accessor** (`connection.rs`): `Database`, connection lifecycle, ad-hoc
///   calls, prepared-statement mode, transactions
/// - **Statement** (`statement.rs`): the held prepared statement and its bindings
/// - **Results** (`query.rs`): result sets, fetch modes and shaped records
/// - **Parameters** (`params.rs`, `value.rs`): values, bind types, parameter lists
/// - **Driver seam** (`driver.rs`, `sqlite.rs`): the driver traits and the
///   bundled rusqlite driver
/// - **Dialects** (`dialect.rs`): DSN syntax and error modes
///
/// ## Error Handling
///
/// Driver failures are reported as `DriverError` and surfaced through
/// `AccessError` according to the accessor's `ErrorMode`.
pub mod connection;
pub mod dialect;
pub mod driver;
pub mod params;
pub mod query;
pub mod sqlite;
pub mod statement;
pub mod value;

pub use connection::*;
pub use dialect::*;
pub use driver::*;
pub use params::*;
pub use query::*;
pub use sqlite::*;
pub use statement::*;
pub use value::*;
