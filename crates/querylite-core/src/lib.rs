//! # QueryLite Core
//!
//! Core types and the query engine for QueryLite: values, tables, the
//! clause parser, the expression evaluator, grouping, ordering and session
//! execution.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod fetch;
pub mod query;
pub mod table;
pub mod value;

pub use error::{Error, ErrorCategory, Result};
pub use fetch::{FieldRequest, TableFetcher};
pub use query::{OrderDirection, Session, Source};
pub use table::{Row, Table};
pub use value::Value;

/// Parses `sql` and executes it against `fetcher`.
pub fn execute(sql: &str, fetcher: &dyn TableFetcher) -> Result<Table> {
    query::parse(sql)?.execute(fetcher)
}
