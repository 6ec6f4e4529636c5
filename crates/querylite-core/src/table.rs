//! In-memory, column-named row store.
//!
//! A [`Table`] is an ordered list of field names plus an ordered sequence of
//! rows. Once the fields are set, every row must have exactly one value per
//! field. Filtering, grouping and ordering never mutate a table in place;
//! they build a new one.

use crate::error::{Error, Result};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A row is an untyped sequence of values
pub type Row = Vec<Value>;

/// Column-named row store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTable")]
pub struct Table {
    fields: Vec<String>,
    rows: Vec<Row>,
}

/// Deserialized form of a [`Table`], checked before it becomes one
#[derive(Deserialize)]
struct RawTable {
    fields: Vec<String>,
    rows: Vec<Row>,
}

impl TryFrom<RawTable> for Table {
    type Error = Error;

    fn try_from(raw: RawTable) -> Result<Self> {
        Table::from_rows(raw.fields, raw.rows)
    }
}

impl Table {
    /// Creates an empty table with no fields.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty table with the given fields.
    pub fn with_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Builds a table from fields and rows, checking every row's width.
    pub fn from_rows<I, S>(fields: I, rows: Vec<Row>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::with_fields(fields);
        for row in rows {
            table.append(row)?;
        }
        Ok(table)
    }

    /// Sets the field names. Fields can only be set once.
    pub fn set_fields<I, S>(&mut self, fields: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if !self.fields.is_empty() {
            return Err(Error::InvalidOperation(
                "table fields are already set".to_string(),
            ));
        }
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        if let Some(row) = self.rows.iter().find(|r| r.len() != fields.len()) {
            return Err(width_mismatch(fields.len(), row.len()));
        }
        self.fields = fields;
        Ok(())
    }

    /// Field names in column order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// All rows in order.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterates over the rows.
    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    /// Appends a row. Once fields are set the row width must match.
    pub fn append(&mut self, row: Row) -> Result<()> {
        if !self.fields.is_empty() && row.len() != self.fields.len() {
            return Err(width_mismatch(self.fields.len(), row.len()));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Reads a row; negative indices count from the end.
    pub fn get(&self, index: i64) -> Option<&[Value]> {
        self.resolve_index(index)
            .and_then(|i| self.rows.get(i))
            .map(Vec::as_slice)
    }

    /// Replaces a row; negative indices count from the end.
    pub fn set(&mut self, index: i64, row: Row) -> Result<()> {
        if !self.fields.is_empty() && row.len() != self.fields.len() {
            return Err(width_mismatch(self.fields.len(), row.len()));
        }
        let i = self
            .resolve_index(index)
            .filter(|&i| i < self.rows.len())
            .ok_or_else(|| {
                Error::InvalidOperation(format!("row index {} out of range", index))
            })?;
        self.rows[i] = row;
        Ok(())
    }

    /// Sequence slicing with optional bounds and a non-zero step.
    ///
    /// Bounds follow the usual start/stop/step rules: negative bounds count
    /// from the end, out-of-range bounds are clamped, and a negative step
    /// walks backwards.
    pub fn slice(&self, start: Option<i64>, stop: Option<i64>, step: i64) -> Result<Table> {
        if step == 0 {
            return Err(Error::InvalidOperation(
                "slice step cannot be zero".to_string(),
            ));
        }
        let len = self.rows.len() as i64;
        let adjust = |bound: Option<i64>, default: i64| match bound {
            None => default,
            Some(b) if b < 0 => {
                let b = b + len;
                if b < 0 {
                    if step < 0 {
                        -1
                    } else {
                        0
                    }
                } else {
                    b
                }
            }
            Some(b) if b >= len => {
                if step < 0 {
                    len - 1
                } else {
                    len
                }
            }
            Some(b) => b,
        };
        let (start, stop) = if step > 0 {
            (adjust(start, 0), adjust(stop, len))
        } else {
            (adjust(start, len - 1), adjust(stop, -1))
        };

        let mut out = Table::with_fields(self.fields.clone());
        let mut i = start;
        while (step > 0 && i < stop) || (step < 0 && i > stop) {
            out.rows.push(self.rows[i as usize].clone());
            match i.checked_add(step) {
                Some(next) => i = next,
                None => break,
            }
        }
        Ok(out)
    }

    /// Position of a field, if it occurs exactly once.
    pub fn field_index(&self, field: &str) -> Option<usize> {
        let mut matches = self
            .fields
            .iter()
            .enumerate()
            .filter(|(_, f)| f.as_str() == field);
        match (matches.next(), matches.next()) {
            (Some((i, _)), None) => Some(i),
            _ => None,
        }
    }

    /// Projects a column by name. Missing or duplicated fields yield `None`.
    pub fn get_vals(&self, field: &str) -> Option<Vec<Value>> {
        let idx = self.field_index(field)?;
        Some(self.rows.iter().map(|r| r[idx].clone()).collect())
    }

    /// Replaces this table's contents with a clone of `other`.
    pub fn copy_from(&mut self, other: &Table) {
        self.fields = other.fields.clone();
        self.rows = other.rows.clone();
    }

    /// New table holding the rows at `indices`, in that order.
    pub fn select_rows(&self, indices: &[usize]) -> Table {
        Table {
            fields: self.fields.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }

    /// New table with the same fields and the first `n` rows.
    pub fn truncated(&self, n: usize) -> Table {
        Table {
            fields: self.fields.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// CSV form: a header line followed by one line per row.
    pub fn to_csv(&self) -> String {
        let mut lines = Vec::with_capacity(self.rows.len() + 1);
        lines.push(
            self.fields
                .iter()
                .map(|f| csv_cell(f))
                .collect::<Vec<_>>()
                .join(","),
        );
        for row in &self.rows {
            lines.push(
                row.iter()
                    .map(|v| match v {
                        Value::Null => String::new(),
                        v => csv_cell(&v.to_string()),
                    })
                    .collect::<Vec<_>>()
                    .join(","),
            );
        }
        lines.join("\n")
    }

    /// HTML `<table>` form with escaped cell text.
    pub fn to_html(&self) -> String {
        let mut out = String::from("<table>\n<tr>");
        for field in &self.fields {
            out.push_str("<th>");
            out.push_str(&escape_html(field));
            out.push_str("</th>");
        }
        out.push_str("</tr>\n");
        for row in &self.rows {
            out.push_str("<tr>");
            for value in row {
                out.push_str("<td>");
                out.push_str(&escape_html(&value.to_string()));
                out.push_str("</td>");
            }
            out.push_str("</tr>\n");
        }
        out.push_str("</table>");
        out
    }

    fn resolve_index(&self, index: i64) -> Option<usize> {
        let len = self.rows.len() as i64;
        let i = if index < 0 { index + len } else { index };
        (0..len).contains(&i).then_some(i as usize)
    }
}

impl<'a> IntoIterator for &'a Table {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Plain textual form: an aligned header, a rule, then the rows.
impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|r| r.iter().map(|v| v.to_string()).collect())
            .collect();
        let mut widths: Vec<usize> = self.fields.iter().map(|h| h.chars().count()).collect();
        for row in &cells {
            for (i, cell) in row.iter().enumerate() {
                if let Some(w) = widths.get_mut(i) {
                    *w = (*w).max(cell.chars().count());
                }
            }
        }

        let line = |items: &[String]| -> String {
            items
                .iter()
                .zip(&widths)
                .map(|(s, w)| format!("{:<width$}", s, width = *w))
                .collect::<Vec<_>>()
                .join(" | ")
                .trim_end()
                .to_string()
        };

        writeln!(f, "{}", line(&self.fields))?;
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        write!(f, "{}", rule.join("-+-"))?;
        for row in &cells {
            write!(f, "\n{}", line(row))?;
        }
        Ok(())
    }
}

fn width_mismatch(expected: usize, found: usize) -> Error {
    Error::InvalidOperation(format!(
        "row has {} values but the table has {} fields",
        found, expected
    ))
}

/// Quotes a cell when it holds a comma or newline outside a quoted span.
fn csv_cell(text: &str) -> String {
    let mut in_quotes = false;
    let mut needs_quoting = false;
    for ch in text.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' | '\n' if !in_quotes => {
                needs_quoting = true;
                break;
            }
            _ => {}
        }
    }
    if needs_quoting {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '\n' => out.push_str("<br>\n"),
            c => out.push(c),
        }
    }
    out
}
