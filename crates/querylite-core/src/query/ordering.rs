/// Multi-key ordering
use super::compiler::Expression;
use crate::error::Result;
use crate::table::Table;
use crate::value::Value;
use std::cmp::Ordering;
use std::fmt;

/// Sort direction of an ORDER BY key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    /// Smallest first
    #[default]
    Asc,
    /// Largest first
    Desc,
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderDirection::Asc => write!(f, "ASC"),
            OrderDirection::Desc => write!(f, "DESC"),
        }
    }
}

/// Returns a copy of `table` with its rows stably sorted by `keys`.
///
/// Earlier keys take priority; later keys only break ties. Null sorts
/// before every other value. A key mixing value families fails with a type
/// error before any row is moved.
pub fn order(table: &Table, keys: &[(String, OrderDirection)]) -> Result<Table> {
    let columns = keys
        .iter()
        .map(|(expr, direction)| {
            let values = Expression::compile(expr)?.evaluate(table)?;
            check_comparable(&values)?;
            Ok((values, *direction))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut indices: Vec<usize> = (0..table.len()).collect();
    indices.sort_by(|&a, &b| {
        for (values, direction) in &columns {
            let ordering = values[a]
                .sort_cmp(&values[b])
                .unwrap_or(Ordering::Equal);
            let ordering = match direction {
                OrderDirection::Asc => ordering,
                OrderDirection::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });

    Ok(table.select_rows(&indices))
}

fn check_comparable(values: &[Value]) -> Result<()> {
    let mut non_null = values.iter().filter(|v| !v.is_null());
    if let Some(first) = non_null.next() {
        for value in non_null {
            first.compare(value)?;
        }
    }
    Ok(())
}
