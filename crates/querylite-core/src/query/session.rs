/// Query sessions
///
/// A [`Session`] is the parsed form of one query. Executing it runs the
/// pipeline in a fixed order: resolve the source, filter, group or project,
/// order, limit. Each stage produces a new table.
use super::analysis::{extract_fields, is_all_aggregate};
use super::compiler::Expression;
use super::grouping::group;
use super::ordering::{order, OrderDirection};
use crate::error::{Error, Result};
use crate::fetch::{FieldRequest, TableFetcher};
use crate::table::{Row, Table};
use tracing::debug;

/// Where a session reads its rows from
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    /// A label handed to the fetch collaborator
    Label(String),
    /// A nested query, executed first
    Query(Box<Session>),
}

/// A parsed query, executed once
///
/// ORDER BY keys are evaluated against the projected result, so they may
/// only name result columns: ordering by a column that is not selected, or
/// by a label the select list repeats, fails with an unknown-field error.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// Select expressions as written; `["*"]` for a wildcard
    pub fields: Vec<String>,
    /// Table label or nested query to read from
    pub source: Source,
    /// WHERE expression
    pub condition: Option<String>,
    /// Empty when there is no GROUP BY clause
    pub group_by: Vec<String>,
    /// HAVING expression, evaluated per group
    pub having: Option<String>,
    /// Empty when there is no ORDER BY clause
    pub order_by: Vec<(String, OrderDirection)>,
    /// Maximum number of result rows
    pub limit: Option<u64>,
}

impl Session {
    /// Runs the query, fetching labelled sources through `fetcher`.
    pub fn execute(&self, fetcher: &dyn TableFetcher) -> Result<Table> {
        let all_aggregate = is_all_aggregate(&self.fields)?;
        let grouped = !self.group_by.is_empty() || all_aggregate;
        if self.having.is_some() && !grouped {
            return Err(Error::InvalidOperation(
                "HAVING requires GROUP BY or an aggregate-only select list".to_string(),
            ));
        }

        let source = self.resolve_source(fetcher)?;
        let fields = self.expand_fields(&source);
        if source.is_empty() {
            debug!("source is empty, skipping remaining stages");
            return Ok(Table::with_fields(fields));
        }

        let filtered = match &self.condition {
            Some(condition) => {
                let all: Vec<usize> = (0..source.len()).collect();
                let mask = Expression::compile(condition)?.evaluate_predicate(&source, &all)?;
                let keep: Vec<usize> = mask
                    .iter()
                    .enumerate()
                    .filter_map(|(i, &m)| m.then_some(i))
                    .collect();
                debug!(before = source.len(), after = keep.len(), "filtered rows");
                source.select_rows(&keep)
            }
            None => source,
        };

        let projected = if grouped {
            group(
                &filtered,
                &self.group_by,
                self.having.as_deref(),
                &fields,
                all_aggregate,
            )?
        } else {
            project(&filtered, &fields)?
        };

        let ordered = if self.order_by.is_empty() {
            projected
        } else {
            debug!(keys = self.order_by.len(), rows = projected.len(), "ordering rows");
            order(&projected, &self.order_by)?
        };

        Ok(match self.limit {
            Some(n) => {
                let limited = ordered.truncated(usize::try_from(n).unwrap_or(usize::MAX));
                debug!(limit = n, before = ordered.len(), after = limited.len(), "limited rows");
                limited
            }
            None => ordered,
        })
    }

    /// Every expression of the query, for field extraction.
    fn expressions(&self) -> Vec<&str> {
        let mut all: Vec<&str> = self.fields.iter().map(String::as_str).collect();
        all.extend(self.condition.as_deref());
        all.extend(self.group_by.iter().map(String::as_str));
        all.extend(self.having.as_deref());
        all.extend(self.order_by.iter().map(|(e, _)| e.as_str()));
        all
    }

    fn resolve_source(&self, fetcher: &dyn TableFetcher) -> Result<Table> {
        match &self.source {
            Source::Label(label) => {
                let fields = extract_fields(&self.expressions())?;
                let request = if fields.len() == 1 && fields[0] == "*" {
                    FieldRequest::All
                } else {
                    FieldRequest::Fields(fields)
                };
                debug!(source = %label, request = ?request, "fetching source");
                let table = fetcher.fetch(label, &request)?;
                debug!(source = %label, rows = table.len(), "fetched source");
                Ok(table)
            }
            Source::Query(inner) => {
                debug!("executing sub-query source");
                inner.execute(fetcher)
            }
        }
    }

    fn expand_fields(&self, source: &Table) -> Vec<String> {
        if self.fields.len() == 1 && self.fields[0] == "*" {
            source.fields().to_vec()
        } else {
            self.fields.clone()
        }
    }
}

/// Row-by-row projection of `fields` over `table`.
fn project(table: &Table, fields: &[String]) -> Result<Table> {
    let columns = fields
        .iter()
        .map(|f| Expression::compile(f)?.evaluate(table))
        .collect::<Result<Vec<_>>>()?;
    let mut out = Table::with_fields(fields.iter().cloned());
    for row in 0..table.len() {
        let values: Row = columns.iter().map(|c| c[row].clone()).collect();
        out.append(values)?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use std::cell::RefCell;

    struct Fixture {
        table: Table,
        requests: RefCell<Vec<FieldRequest>>,
    }

    impl TableFetcher for Fixture {
        fn fetch(&self, source: &str, fields: &FieldRequest) -> Result<Table> {
            self.requests.borrow_mut().push(fields.clone());
            if source == "items" {
                Ok(self.table.clone())
            } else {
                Err(Error::fetch(format!("unknown source '{}'", source)))
            }
        }
    }

    fn fixture(rows: Vec<Row>) -> Fixture {
        Fixture {
            table: Table::from_rows(["a", "g"], rows).unwrap(),
            requests: RefCell::new(Vec::new()),
        }
    }

    fn session(fields: &[&str]) -> Session {
        Session {
            fields: fields.iter().map(|s| s.to_string()).collect(),
            source: Source::Label("items".to_string()),
            condition: None,
            group_by: Vec::new(),
            having: None,
            order_by: Vec::new(),
            limit: None,
        }
    }

    fn rows() -> Vec<Row> {
        vec![
            vec![1.into(), "x".into()],
            vec![2.into(), "x".into()],
            vec![5.into(), "y".into()],
        ]
    }

    #[test]
    fn test_wildcard_expands_to_source_fields() {
        let fetcher = fixture(rows());
        let out = session(&["*"]).execute(&fetcher).unwrap();
        assert_eq!(out.fields(), &["a", "g"]);
        assert_eq!(out.len(), 3);
        assert_eq!(fetcher.requests.borrow()[0], FieldRequest::All);
    }

    #[test]
    fn test_requested_fields_hint() {
        let fetcher = fixture(rows());
        let mut s = session(&["a + 1"]);
        s.condition = Some("g = 'x'".to_string());
        let out = s.execute(&fetcher).unwrap();
        assert_eq!(out.get_vals("a + 1").unwrap(), vec![2.into(), 3.into()]);
        assert_eq!(
            fetcher.requests.borrow()[0],
            FieldRequest::Fields(vec!["a".to_string(), "g".to_string()])
        );
    }

    #[test]
    fn test_empty_source_short_circuits() {
        let fetcher = fixture(Vec::new());
        let mut s = session(&["a", "sum(a)"]);
        s.condition = Some("nope = 1".to_string());
        s.group_by = vec!["g".to_string()];
        s.order_by = vec![("a".to_string(), OrderDirection::Desc)];
        let out = s.execute(&fetcher).unwrap();
        assert_eq!(out.fields(), &["a", "sum(a)"]);
        assert!(out.is_empty());
    }

    #[test]
    fn test_limit() {
        let fetcher = fixture(rows());
        let mut s = session(&["a"]);
        s.limit = Some(0);
        let out = s.execute(&fetcher).unwrap();
        assert!(out.is_empty());
        assert_eq!(out.fields(), &["a"]);

        s.limit = Some(10);
        assert_eq!(s.execute(&fetcher).unwrap().len(), 3);
    }

    #[test]
    fn test_nested_source() {
        let fetcher = fixture(rows());
        let mut inner = session(&["a", "g"]);
        inner.condition = Some("a > 1".to_string());
        let mut outer = session(&["g", "count(*)"]);
        outer.source = Source::Query(Box::new(inner));
        outer.group_by = vec!["g".to_string()];
        let out = outer.execute(&fetcher).unwrap();
        assert_eq!(
            out.rows(),
            &[
                vec![Value::from("x"), Value::from(1)],
                vec![Value::from("y"), Value::from(1)],
            ]
        );
    }

    #[test]
    fn test_fetch_errors_propagate() {
        let fetcher = fixture(rows());
        let mut s = session(&["a"]);
        s.source = Source::Label("missing".to_string());
        let err = s.execute(&fetcher).unwrap_err();
        assert!(matches!(err, Error::Fetch(_)));
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_having_without_grouping() {
        let fetcher = fixture(rows());
        let mut s = session(&["a"]);
        s.having = Some("a > 1".to_string());
        assert!(matches!(
            s.execute(&fetcher),
            Err(Error::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_order_reads_projected_labels() {
        let fetcher = fixture(rows());
        let mut s = session(&["g", "sum(a)"]);
        s.group_by = vec!["g".to_string()];
        s.order_by = vec![("sum(a)".to_string(), OrderDirection::Desc)];
        let out = s.execute(&fetcher).unwrap();
        assert_eq!(out.get_vals("g").unwrap(), vec!["y".into(), "x".into()]);
    }
}
