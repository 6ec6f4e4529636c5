/// Grouping and aggregate projection
use super::compiler::Expression;
use crate::error::{Error, Result};
use crate::query::evaluator::truth;
use crate::table::{Row, Table};
use std::collections::HashMap;

/// Partitions `table` by the `group_by` expressions and projects one row per
/// surviving group.
///
/// Groups keep the order in which their first row appears. With no
/// `group_by` expressions and an all-aggregate select list, the whole table
/// forms a single group, even when it has no rows. Each field expression is
/// evaluated over its group's rows, so aggregates reduce over exactly that
/// group.
pub fn group(
    table: &Table,
    group_by: &[String],
    having: Option<&str>,
    fields: &[String],
    all_aggregate: bool,
) -> Result<Table> {
    let groups = if group_by.is_empty() {
        if !all_aggregate {
            return Err(Error::InvalidOperation(
                "grouping needs GROUP BY or an all-aggregate select list".to_string(),
            ));
        }
        vec![(0..table.len()).collect::<Vec<usize>>()]
    } else {
        partition(table, group_by)?
    };

    let having = having.map(Expression::compile).transpose()?;
    let fields_compiled = fields
        .iter()
        .map(|f| Expression::compile(f))
        .collect::<Result<Vec<_>>>()?;

    let mut out = Table::with_fields(fields.iter().cloned());
    for rows in &groups {
        if let Some(predicate) = &having {
            if !truth(&predicate.evaluate_group(table, rows)?)? {
                continue;
            }
        }
        let row: Row = fields_compiled
            .iter()
            .map(|f| f.evaluate_group(table, rows))
            .collect::<Result<_>>()?;
        out.append(row)?;
    }

    tracing::debug!(
        groups = groups.len(),
        kept = out.len(),
        "grouped {} rows",
        table.len()
    );
    Ok(out)
}

/// Row indices of each group, in first-seen order.
fn partition(table: &Table, group_by: &[String]) -> Result<Vec<Vec<usize>>> {
    let keys = group_by
        .iter()
        .map(|g| Expression::compile(g)?.evaluate(table))
        .collect::<Result<Vec<_>>>()?;

    let mut index: HashMap<Vec<u8>, usize> = HashMap::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for row in 0..table.len() {
        let mut key = Vec::new();
        for column in &keys {
            key.extend(column[row].to_bytes());
        }
        match index.get(&key) {
            Some(&g) => groups[g].push(row),
            None => {
                index.insert(key, groups.len());
                groups.push(vec![row]);
            }
        }
    }
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn sample() -> Table {
        Table::from_rows(
            ["a", "g"],
            vec![
                vec![1.into(), "x".into()],
                vec![2.into(), "x".into()],
                vec![5.into(), "y".into()],
            ],
        )
        .unwrap()
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_group_by_in_first_seen_order() {
        let out = group(
            &sample(),
            &strings(&["g"]),
            None,
            &strings(&["g", "sum(a)"]),
            false,
        )
        .unwrap();
        assert_eq!(out.fields(), &["g", "sum(a)"]);
        assert_eq!(
            out.rows(),
            &[
                vec![Value::from("x"), Value::from(3)],
                vec![Value::from("y"), Value::from(5)],
            ]
        );
    }

    #[test]
    fn test_having_filters_groups() {
        let out = group(
            &sample(),
            &strings(&["g"]),
            Some("count(*) > 1"),
            &strings(&["g", "count(*)"]),
            false,
        )
        .unwrap();
        assert_eq!(out.rows(), &[vec![Value::from("x"), Value::from(2)]]);
    }

    #[test]
    fn test_implicit_single_group() {
        let out = group(&sample(), &[], None, &strings(&["count(*)", "max(a)"]), true).unwrap();
        assert_eq!(out.rows(), &[vec![Value::from(3), Value::from(5)]]);

        let empty = Table::with_fields(["a", "g"]);
        let out = group(&empty, &[], None, &strings(&["count(*)", "sum(a)"]), true).unwrap();
        assert_eq!(out.rows(), &[vec![Value::from(0), Value::Null]]);
    }

    #[test]
    fn test_requires_grouping() {
        assert!(matches!(
            group(&sample(), &[], None, &strings(&["a"]), false),
            Err(Error::InvalidOperation(_))
        ));
    }
}
