//! The boundary between the query engine and whatever supplies its data.

use crate::error::Result;
use crate::table::Table;

/// Which fields a query needs from its source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRequest {
    /// Every field the source has (`select *`)
    All,
    /// Only these fields, in first-referenced order
    Fields(Vec<String>),
}

/// Supplies tables for the labels named in FROM clauses.
///
/// The request is a hint: a fetcher may return more fields than asked for.
/// Failures should be wrapped with [`Error::fetch`](crate::Error::fetch) so
/// they reach the caller unchanged.
pub trait TableFetcher {
    /// Fetches the table named `source`.
    fn fetch(&self, source: &str, fields: &FieldRequest) -> Result<Table>;
}

impl<T: TableFetcher + ?Sized> TableFetcher for &T {
    fn fetch(&self, source: &str, fields: &FieldRequest) -> Result<Table> {
        (**self).fetch(source, fields)
    }
}
