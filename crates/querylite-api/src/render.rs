//! Output rendering for result tables.

use querylite_core::error::{Error, Result};
use querylite_core::Table;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::str::FromStr;

/// Output format for a result table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Aligned plain-text columns
    #[default]
    Plain,
    /// Comma separated values with a header line
    Csv,
    /// An HTML `<table>`
    Html,
}

impl FromStr for OutputFormat {
    type Err = Error;

    /// Accepts `str`/`plain`, `csv` and `html`, ignoring case.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "str" | "plain" => Ok(OutputFormat::Plain),
            "csv" => Ok(OutputFormat::Csv),
            "html" => Ok(OutputFormat::Html),
            other => Err(Error::InvalidInput(format!(
                "unknown output format '{}' (expected str, csv or html)",
                other
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Plain => write!(f, "str"),
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::Html => write!(f, "html"),
        }
    }
}

/// Renders `table` with its own serializer for `format`.
pub fn render(table: &Table, format: OutputFormat) -> String {
    match format {
        OutputFormat::Plain => table.to_string(),
        OutputFormat::Csv => table.to_csv(),
        OutputFormat::Html => table.to_html(),
    }
}

/// Writes the rendered table to `writer`.
pub fn write_table<W: Write>(
    writer: &mut W,
    table: &Table,
    format: OutputFormat,
) -> std::io::Result<()> {
    writer.write_all(render(table, format).as_bytes())?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_formats() {
        assert_eq!("str".parse::<OutputFormat>().unwrap(), OutputFormat::Plain);
        assert_eq!("CSV".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert_eq!(" html ".parse::<OutputFormat>().unwrap(), OutputFormat::Html);
        assert!(matches!(
            "xml".parse::<OutputFormat>(),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for format in [OutputFormat::Plain, OutputFormat::Csv, OutputFormat::Html] {
            assert_eq!(format.to_string().parse::<OutputFormat>().unwrap(), format);
        }
    }
}
