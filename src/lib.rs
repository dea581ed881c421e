//! A single SQL statement as a value.
//!
//! [`Query`] holds raw SQL and its bind values, compiles the binds into final SQL for a
//! [`DatabaseType`], and carries the timing and error bookkeeping a caller records around
//! execution. The [`QueryInterface`] trait names that capability set.
//!
//! ```rust
//! use sql_statement::prelude::*;
//!
//! let config = QueryConfig::new(DatabaseType::Sqlite)
//!     .with_swap_pre("db_")
//!     .with_db_prefix("app_");
//! let mut query = Query::prepare(
//!     config,
//!     "UPDATE db_users SET name = :name: WHERE id = :id:",
//!     vec![("name", BindValue::Text("O'Neil".into())), ("id", BindValue::Int(3))],
//! )?;
//! assert_eq!(query.get_query(), "UPDATE app_users SET name = 'O''Neil' WHERE id = 3");
//! assert!(query.is_write_type());
//!
//! query.mark_start();
//! // ... run the statement ...
//! query.finish();
//! # Ok::<(), QueryError>(())
//! ```

pub mod binds;
pub mod config;
pub mod error;
pub mod escape;
pub mod prelude;
pub mod query;
pub mod query_utils;
pub mod types;

pub use binds::{Binds, compile};
pub use config::QueryConfig;
pub use error::QueryError;
pub use escape::Escaper;
pub use query::{Query, QueryFailure, QueryInterface};
pub use types::{BindValue, DatabaseType};
