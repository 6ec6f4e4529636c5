//! An in-memory fetch collaborator.

use querylite_core::error::{Error, Result};
use querylite_core::{FieldRequest, Table, TableFetcher};
use std::collections::HashMap;

/// Serves registered tables by label.
///
/// A field request projects the registered table down to the requested
/// columns it actually has, in the table's own column order. Unknown
/// columns are left for the evaluator to report.
#[derive(Debug, Clone, Default)]
pub struct MemoryFetcher {
    tables: HashMap<String, Table>,
}

impl MemoryFetcher {
    /// Creates a fetcher with no tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `table` under `label`, builder style.
    pub fn with_table<S: Into<String>>(mut self, label: S, table: Table) -> Self {
        self.insert(label, table);
        self
    }

    /// Registers `table` under `label`, returning any table it replaces.
    pub fn insert<S: Into<String>>(&mut self, label: S, table: Table) -> Option<Table> {
        self.tables.insert(label.into(), table)
    }

    /// Removes the table registered under `label`.
    pub fn remove(&mut self, label: &str) -> Option<Table> {
        self.tables.remove(label)
    }

    /// Registered labels, sorted.
    pub fn labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        labels.sort_unstable();
        labels
    }
}

impl TableFetcher for MemoryFetcher {
    fn fetch(&self, source: &str, fields: &FieldRequest) -> Result<Table> {
        let table = self
            .tables
            .get(source)
            .ok_or_else(|| Error::fetch(format!("unknown source '{}'", source)))?;

        let wanted = match fields {
            FieldRequest::All => return Ok(table.clone()),
            FieldRequest::Fields(wanted) => wanted,
        };
        let columns: Vec<usize> = table
            .fields()
            .iter()
            .enumerate()
            .filter(|(_, f)| wanted.contains(*f))
            .map(|(i, _)| i)
            .collect();

        let mut out = Table::with_fields(columns.iter().map(|&i| table.fields()[i].clone()));
        for row in table.iter() {
            out.append(columns.iter().map(|&i| row[i].clone()).collect())?;
        }
        tracing::debug!(
            source,
            columns = columns.len(),
            rows = out.len(),
            "served in-memory table"
        );
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use querylite_core::Value;

    fn fetcher() -> MemoryFetcher {
        let table = Table::from_rows(
            ["id", "name", "stars"],
            vec![vec![1.into(), "core".into(), 10.into()]],
        )
        .unwrap();
        MemoryFetcher::new().with_table("repos", table)
    }

    #[test]
    fn test_projects_requested_fields_in_source_order() {
        let out = fetcher()
            .fetch(
                "repos",
                &FieldRequest::Fields(vec!["stars".to_string(), "id".to_string()]),
            )
            .unwrap();
        assert_eq!(out.fields(), &["id", "stars"]);
        assert_eq!(out.rows(), &[vec![Value::from(1), Value::from(10)]]);
    }

    #[test]
    fn test_all_fields() {
        let out = fetcher().fetch("repos", &FieldRequest::All).unwrap();
        assert_eq!(out.fields().len(), 3);
    }

    #[test]
    fn test_unknown_source() {
        let err = fetcher().fetch("nope", &FieldRequest::All).unwrap_err();
        assert!(matches!(err, Error::Fetch(_)));
        assert_eq!(err.to_string(), "Fetch error: unknown source 'nope'");
    }

    #[test]
    fn test_labels() {
        let mut f = fetcher();
        f.insert("issues", Table::with_fields(["id"]));
        assert_eq!(f.labels(), vec!["issues", "repos"]);
        assert!(f.remove("issues").is_some());
    }
}
