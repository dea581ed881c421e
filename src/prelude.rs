//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and traits
//! to make it easier to get started with the library.

pub use crate::binds::Binds;
pub use crate::config::QueryConfig;
pub use crate::error::QueryError;
pub use crate::escape::Escaper;
pub use crate::query::{Query, QueryFailure, QueryInterface};
pub use crate::types::{BindValue, DatabaseType};
