//! # QueryLite
//!
//! Query tabular data with SQL-like syntax.
//!
//! ## Quick Start
//!
//! ```rust
//! use querylite::{Engine, MemoryFetcher, OutputFormat, Table, Value};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let repos = Table::from_rows(
//!         ["name", "language", "stars"],
//!         vec![
//!             vec!["abseil-cpp".into(), "C++".into(), Value::from(14000)],
//!             vec!["abseil-py".into(), "Python".into(), Value::from(2300)],
//!         ],
//!     )?;
//!     let engine = Engine::new(MemoryFetcher::new().with_table("abseil.repos", repos));
//!
//!     let table = engine.query(
//!         "select name, stars from abseil.repos where language like 'C%' order by stars desc",
//!     )?;
//!     assert_eq!(table.len(), 1);
//!     println!("{}", engine.render(&table, OutputFormat::Csv));
//!     Ok(())
//! }
//! ```
//!
//! ## Supported Clauses
//!
//! `SELECT`, `FROM` (a source label or a parenthesised sub-query), `WHERE`,
//! `GROUP BY`, `HAVING`, `ORDER BY` and `LIMIT`, in that order. Expressions
//! follow MySQL operator precedence and support the usual string functions
//! plus the `count`, `sum`, `avg`, `min` and `max` aggregates.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{info, warn};

// Re-export core types
pub use querylite_core::{
    execute, Error, ErrorCategory, FieldRequest, OrderDirection, Result, Row, Session, Source,
    Table, TableFetcher, Value,
};

/// Lower-level access to the query engine (parser, expressions, grouping)
pub use querylite_core::query;

/// Logging configuration and utilities
pub mod logging;
/// In-memory fetch collaborator
pub mod memory;
/// Output rendering
pub mod render;
/// Security and input validation
pub mod security;

pub use memory::MemoryFetcher;
pub use render::{render, write_table, OutputFormat};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Longest accepted query text, in bytes
    pub max_query_length: usize,
    /// Format used by [`Engine::render_default`]
    pub default_format: OutputFormat,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_query_length: security::MAX_QUERY_LENGTH,
            default_format: OutputFormat::Plain,
        }
    }
}

impl EngineConfig {
    /// Set the maximum query length
    pub fn with_max_query_length(mut self, max: usize) -> Self {
        self.max_query_length = max;
        self
    }

    /// Set the default output format
    pub fn with_default_format(mut self, format: OutputFormat) -> Self {
        self.default_format = format;
        self
    }
}

/// A query result together with how long it took
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    /// The result table
    pub table: Table,
    /// Wall-clock time spent parsing and executing
    pub elapsed: Duration,
}

impl fmt::Display for QueryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rows in set ({:.2} sec)",
            self.table.len(),
            self.elapsed.as_secs_f64()
        )
    }
}

/// The query engine handle.
///
/// Owns a fetch collaborator and runs one query at a time against it. Each
/// query is parsed into a fresh session, executed once and discarded.
///
/// # Examples
///
/// ```rust
/// use querylite::{Engine, MemoryFetcher, Table, Value};
///
/// let mut fetcher = MemoryFetcher::new();
/// fetcher.insert(
///     "numbers",
///     Table::from_rows(["n"], vec![vec![Value::from(1)], vec![Value::from(2)]])?,
/// );
/// let engine = Engine::new(fetcher);
/// let outcome = engine.query_timed("select sum(n) from numbers")?;
/// assert_eq!(outcome.table.rows()[0][0], Value::from(3));
/// # Ok::<(), querylite::Error>(())
/// ```
pub struct Engine<F: TableFetcher> {
    fetcher: F,
    config: EngineConfig,
}

impl<F: TableFetcher> Engine<F> {
    /// Creates an engine with the default configuration.
    pub fn new(fetcher: F) -> Self {
        Self::with_config(fetcher, EngineConfig::default())
    }

    /// Creates an engine with a custom configuration.
    pub fn with_config(fetcher: F, config: EngineConfig) -> Self {
        Engine { fetcher, config }
    }

    /// The engine's configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The fetch collaborator
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Mutable access to the fetch collaborator, e.g. to register tables
    pub fn fetcher_mut(&mut self) -> &mut F {
        &mut self.fetcher
    }

    /// Runs a query and returns its result table.
    pub fn query(&self, sql: &str) -> Result<Table> {
        self.query_timed(sql).map(|outcome| outcome.table)
    }

    /// Runs a query and reports how long it took.
    pub fn query_timed(&self, sql: &str) -> Result<QueryOutcome> {
        security::validate_query(sql, self.config.max_query_length)?;

        let start = Instant::now();
        let result = query::parse(sql).and_then(|session| session.execute(&self.fetcher));
        let elapsed = start.elapsed();

        match result {
            Ok(table) => {
                info!(
                    rows = table.len(),
                    elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                    "query executed"
                );
                Ok(QueryOutcome { table, elapsed })
            }
            Err(e) => {
                warn!(error = %e, category = ?e.category(), "query failed");
                Err(e)
            }
        }
    }

    /// Renders a table in the given format.
    pub fn render(&self, table: &Table, format: OutputFormat) -> String {
        render::render(table, format)
    }

    /// Renders a table in the configured default format.
    pub fn render_default(&self, table: &Table) -> String {
        render::render(table, self.config.default_format)
    }
}
