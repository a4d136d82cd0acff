//! Output formatting for CLI commands.
//!
//! Commands turn resources into [`Record`]s (column names plus values). A
//! [`Listing`] collects the records of one invocation and is written as a
//! table, JSON or bare values.

use std::io::Write;

use prettytable::{Cell, Row, Table};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::cli::Format;
use crate::error::CliError;

/// Cell value shown when there is nothing to show.
pub const PLACEHOLDER: &str = "<none>";

/// One resource rendered as parallel column/value lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Column headers.
    pub columns: Vec<String>,
    /// Cell values, one per column.
    pub values: Vec<String>,
}

impl Record {
    /// Builds a record from static column names and values.
    #[must_use]
    pub fn new(columns: &[&str], values: Vec<String>) -> Self {
        debug_assert_eq!(columns.len(), values.len(), "column/value count mismatch");
        Self {
            columns: columns.iter().map(|c| (*c).to_string()).collect(),
            values,
        }
    }

    /// One [`PLACEHOLDER`] per column.
    #[must_use]
    pub fn placeholder(columns: &[&str]) -> Self {
        Self::new(columns, vec![PLACEHOLDER.to_string(); columns.len()])
    }

    /// Appends a column.
    pub fn push(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.columns.push(column.into());
        self.values.push(value.into());
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// True when the record has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Renders `resource` with `values`, or placeholders when it is absent.
pub fn record<R>(columns: &[&str], resource: Option<&R>, values: impl FnOnce(&R) -> Vec<String>) -> Record {
    resource.map_or_else(|| Record::placeholder(columns), |r| Record::new(columns, values(r)))
}

/// Text of an optional field; absent values render empty.
#[must_use]
pub fn text(value: Option<&String>) -> String {
    value.cloned().unwrap_or_default()
}

/// What a command prints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing {
    /// One row per resource under a header.
    Rows {
        /// Column headers.
        columns: Vec<String>,
        /// Rows of values.
        rows: Vec<Vec<String>>,
    },
    /// One resource as field/value pairs.
    Fields(Record),
    /// Nothing to print.
    Nothing,
}

impl Listing {
    /// Builds a row listing; `empty` supplies the header when there are no rows.
    #[must_use]
    pub fn rows(records: Vec<Record>, empty: Record) -> Self {
        let mut records = records.into_iter();
        match records.next() {
            None => Self::Rows {
                columns: empty.columns,
                rows: vec![empty.values],
            },
            Some(first) => {
                let columns = first.columns;
                let rows = std::iter::once(first.values)
                    .chain(records.map(|r| r.values))
                    .collect();
                Self::Rows { columns, rows }
            }
        }
    }
}

impl Serialize for Listing {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        struct Object<'a>(&'a [String], &'a [String]);

        impl Serialize for Object<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut map = serializer.serialize_map(Some(self.0.len()))?;
                for (column, value) in self.0.iter().zip(self.1) {
                    map.serialize_entry(column, value)?;
                }
                map.end()
            }
        }

        match self {
            Self::Rows { columns, rows } => {
                let mut seq = serializer.serialize_seq(Some(rows.len()))?;
                for row in rows {
                    seq.serialize_element(&Object(columns, row))?;
                }
                seq.end()
            }
            Self::Fields(record) => Object(&record.columns, &record.values).serialize(serializer),
            Self::Nothing => serializer.serialize_unit(),
        }
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    fn write_table<W: Write + ?Sized>(&self, writer: &mut W) -> Result<(), CliError>;

    /// Write only the values, one line per row or field.
    fn write_values<W: Write + ?Sized>(&self, writer: &mut W) -> Result<(), CliError>;
}

fn row(cells: &[String]) -> Row {
    Row::new(cells.iter().map(|c| Cell::new(c)).collect())
}

impl TableDisplay for Listing {
    fn write_table<W: Write + ?Sized>(&self, writer: &mut W) -> Result<(), CliError> {
        let mut table = Table::new();
        match self {
            Self::Rows { columns, rows } => {
                table.set_titles(row(columns));
                for values in rows {
                    table.add_row(row(values));
                }
            }
            Self::Fields(record) => {
                table.set_titles(Row::new(vec![Cell::new("Field"), Cell::new("Value")]));
                for (column, value) in record.columns.iter().zip(&record.values) {
                    table.add_row(Row::new(vec![Cell::new(column), Cell::new(value)]));
                }
            }
            Self::Nothing => return Ok(()),
        }
        table.print(writer)?;
        Ok(())
    }

    fn write_values<W: Write + ?Sized>(&self, writer: &mut W) -> Result<(), CliError> {
        match self {
            Self::Rows { rows, .. } => {
                for values in rows {
                    writeln!(writer, "{}", values.join(" "))?;
                }
            }
            Self::Fields(record) => {
                for value in &record.values {
                    writeln!(writer, "{value}")?;
                }
            }
            Self::Nothing => {}
        }
        Ok(())
    }
}

/// Output formatter that handles table, JSON and value output.
#[derive(Debug, Clone, Copy)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Get the current format.
    #[must_use]
    pub const fn format(&self) -> Format {
        self.format
    }

    /// Write a listing in the selected format. [`Listing::Nothing`] prints nothing.
    pub fn write<W>(&self, writer: &mut W, listing: &Listing) -> Result<(), CliError>
    where
        W: Write + ?Sized,
    {
        if matches!(listing, Listing::Nothing) {
            return Ok(());
        }
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, listing)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => listing.write_table(writer)?,
            Format::Value => listing.write_values(writer)?,
        }
        Ok(())
    }

    /// Write a listing to a string.
    pub fn to_string(&self, listing: &Listing) -> Result<String, CliError> {
        let mut buf = Vec::new();
        self.write(&mut buf, listing)?;
        String::from_utf8(buf).map_err(|e| CliError::Format(format!("UTF-8 error: {e}")))
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLUMNS: &[&str] = &["id", "name"];

    fn named(id: &str, name: &str) -> Record {
        Record::new(COLUMNS, vec![id.into(), name.into()])
    }

    #[test]
    fn placeholder_fills_every_column() {
        let record = Record::placeholder(&["a", "b", "c"]);
        assert_eq!(record.values, vec!["<none>"; 3]);
    }

    #[test]
    fn record_helper_uses_placeholder_for_absent() {
        let absent = record::<String>(COLUMNS, None, |_| unreachable!());
        assert_eq!(absent, Record::placeholder(COLUMNS));
        let present = record(COLUMNS, Some(&"x".to_string()), |s| vec!["1".into(), s.clone()]);
        assert_eq!(present.values, vec!["1", "x"]);
    }

    #[test]
    fn empty_rows_show_placeholder_row() {
        let listing = Listing::rows(Vec::new(), Record::placeholder(COLUMNS));
        assert_eq!(
            listing,
            Listing::Rows {
                columns: vec!["id".into(), "name".into()],
                rows: vec![vec!["<none>".into(), "<none>".into()]],
            }
        );
    }

    #[test]
    fn table_output_contains_header_and_rows() {
        let listing = Listing::rows(vec![named("1", "subcloud1"), named("2", "subcloud2")], Record::placeholder(COLUMNS));
        let out = OutputFormat::new(Format::Table).to_string(&listing).expect("renders");
        assert!(out.contains("name"));
        assert!(out.contains("subcloud1"));
        assert!(out.contains("subcloud2"));
    }

    #[test]
    fn fields_table_lists_pairs() {
        let out = OutputFormat::new(Format::Table)
            .to_string(&Listing::Fields(named("1", "edge")))
            .expect("renders");
        assert!(out.contains("Field"));
        assert!(out.contains("edge"));
    }

    #[test]
    fn json_keeps_column_order() {
        let out = OutputFormat::new(Format::Json)
            .to_string(&Listing::Fields(Record::new(&["name", "id"], vec!["x".into(), "1".into()])))
            .expect("renders");
        let name_at = out.find("\"name\"").expect("name");
        let id_at = out.find("\"id\"").expect("id");
        assert!(name_at < id_at);
    }

    #[test]
    fn json_rows_are_objects() {
        let listing = Listing::rows(vec![named("1", "a")], Record::placeholder(COLUMNS));
        let out = OutputFormat::new(Format::Json).to_string(&listing).expect("renders");
        let parsed: serde_json::Value = serde_json::from_str(&out).expect("json");
        assert_eq!(parsed, serde_json::json!([{"id": "1", "name": "a"}]));
    }

    #[test]
    fn value_output_is_bare() {
        let listing = Listing::rows(vec![named("1", "a"), named("2", "b")], Record::placeholder(COLUMNS));
        let out = OutputFormat::new(Format::Value).to_string(&listing).expect("renders");
        assert_eq!(out, "1 a\n2 b\n");
    }

    #[test]
    fn nothing_prints_nothing() {
        let out = OutputFormat::new(Format::Json).to_string(&Listing::Nothing).expect("renders");
        assert!(out.is_empty());
    }
}
