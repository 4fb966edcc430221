//! export
//!
//! Tabular export of flat records.
//!
//! # Schema
//!
//! Any `Serialize` struct can be exported. The first record fixes the
//! column set and order (its field declaration order). Every later record
//! must serialize to exactly the same field set; a record with a different
//! set aborts the batch with [`ExportError::SchemaMismatch`].
//!
//! # Writers
//!
//! - [`Format::Csv`]: header row, then one line per record. Cells are quoted
//!   only when they contain the separator, a quote or a line break.
//! - [`Format::JsonLines`]: one JSON object per line, keys in column order.
//!
//! [`Table`] holds a whole batch in memory. [`RecordWriter`] streams records
//! straight to a sink and is what the CLI uses for large expansions.

pub mod csv;
pub mod jsonl;

use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors from tabular export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("row {row}: field set {found:?} does not match columns {expected:?}")]
    SchemaMismatch {
        row: usize,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("row {row}: record does not serialize to a set of named fields")]
    NotARecord { row: usize },

    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("write failed: {0}")]
    Io(#[from] io::Error),
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Csv,
    JsonLines,
}

impl Format {
    /// File extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Csv => "csv",
            Format::JsonLines => "jsonl",
        }
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Format::Csv),
            "jsonl" | "json-lines" | "ndjson" => Ok(Format::JsonLines),
            other => Err(format!("unknown export format '{}'", other)),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Format::Csv => "csv",
            Format::JsonLines => "jsonl",
        })
    }
}

/// Ordered column names fixed by the first record of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<String>,
}

impl Schema {
    fn from_fields(fields: &Map<String, Value>) -> Self {
        Self {
            columns: fields.keys().cloned().collect(),
        }
    }

    /// Column names in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Reorder a record's values into column order.
    fn align(&self, row: usize, mut fields: Map<String, Value>) -> Result<Vec<Value>, ExportError> {
        let same_set =
            fields.len() == self.columns.len() && self.columns.iter().all(|c| fields.contains_key(c));
        if !same_set {
            return Err(ExportError::SchemaMismatch {
                row,
                expected: self.columns.clone(),
                found: fields.keys().cloned().collect(),
            });
        }

        Ok(self
            .columns
            .iter()
            .map(|c| fields.remove(c).unwrap_or(Value::Null))
            .collect())
    }
}

/// Serialize a record into its named fields.
fn to_fields<T: Serialize>(row: usize, record: &T) -> Result<Map<String, Value>, ExportError> {
    match serde_json::to_value(record)? {
        Value::Object(fields) => Ok(fields),
        _ => Err(ExportError::NotARecord { row }),
    }
}

/// An in-memory table.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    schema: Option<Schema>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Build a table from records.
    ///
    /// # Errors
    ///
    /// Returns `ExportError::SchemaMismatch` at the first record whose field
    /// set differs from the first record's.
    pub fn from_records<I, T>(records: I) -> Result<Self, ExportError>
    where
        I: IntoIterator<Item = T>,
        T: Serialize,
    {
        let mut schema: Option<Schema> = None;
        let mut rows = Vec::new();

        for (index, record) in records.into_iter().enumerate() {
            let fields = to_fields(index, &record)?;
            let schema = schema.get_or_insert_with(|| Schema::from_fields(&fields));
            rows.push(schema.align(index, fields)?);
        }

        Ok(Self { schema, rows })
    }

    /// Column names; empty for a table without rows.
    pub fn columns(&self) -> &[String] {
        self.schema.as_ref().map(Schema::columns).unwrap_or(&[])
    }

    /// Row values in column order.
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Write the table in `format`. An empty table writes nothing.
    pub fn write_to<W: Write>(&self, mut sink: W, format: Format) -> Result<(), ExportError> {
        let Some(schema) = &self.schema else {
            return Ok(());
        };
        if format == Format::Csv {
            csv::write_header(&mut sink, schema.columns())?;
        }
        for values in &self.rows {
            write_values(&mut sink, format, schema.columns(), values)?;
        }
        sink.flush()?;
        Ok(())
    }
}

fn write_values<W: Write>(
    sink: &mut W,
    format: Format,
    columns: &[String],
    values: &[Value],
) -> Result<(), ExportError> {
    match format {
        Format::Csv => csv::write_record(sink, values)?,
        Format::JsonLines => jsonl::write_record(sink, columns, values)?,
    }
    Ok(())
}

/// Streaming writer: checks each record against the schema and writes it
/// immediately.
pub struct RecordWriter<W: Write> {
    sink: W,
    format: Format,
    schema: Option<Schema>,
    rows_written: usize,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(sink: W, format: Format) -> Self {
        Self {
            sink,
            format,
            schema: None,
            rows_written: 0,
        }
    }

    /// Write one record. The first record also writes the CSV header.
    pub fn write<T: Serialize>(&mut self, record: &T) -> Result<(), ExportError> {
        let index = self.rows_written;
        let fields = to_fields(index, record)?;

        if self.schema.is_none() {
            let schema = Schema::from_fields(&fields);
            if self.format == Format::Csv {
                csv::write_header(&mut self.sink, schema.columns())?;
            }
            self.schema = Some(schema);
        }

        if let Some(schema) = &self.schema {
            let values = schema.align(index, fields)?;
            write_values(&mut self.sink, self.format, schema.columns(), &values)?;
        }

        self.rows_written += 1;
        Ok(())
    }

    /// Write every record from an iterator.
    pub fn write_all<I, T>(&mut self, records: I) -> Result<(), ExportError>
    where
        I: IntoIterator<Item = T>,
        T: Serialize,
    {
        for record in records {
            self.write(&record)?;
        }
        Ok(())
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Columns fixed by the first record, if any was written.
    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }

    /// Flush and return the sink.
    pub fn finish(mut self) -> Result<W, ExportError> {
        self.sink.flush()?;
        Ok(self.sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Point {
        x: i32,
        label: String,
    }

    #[derive(Serialize)]
    struct Other {
        x: i32,
        y: i32,
    }

    #[derive(Serialize)]
    #[serde(untagged)]
    enum Mixed {
        P(Point),
        O(Other),
    }

    fn point(x: i32, label: &str) -> Point {
        Point {
            x,
            label: label.into(),
        }
    }

    #[test]
    fn columns_from_first_record_in_declaration_order() {
        let table = Table::from_records(vec![point(1, "a"), point(2, "b")]).unwrap();
        assert_eq!(table.columns(), &["x".to_string(), "label".to_string()]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[1][0], Value::from(2));
    }

    #[test]
    fn mismatched_field_set_aborts() {
        let records = vec![Mixed::P(point(1, "a")), Mixed::O(Other { x: 1, y: 2 })];
        let err = Table::from_records(records).unwrap_err();
        match err {
            ExportError::SchemaMismatch {
                row,
                expected,
                found,
            } => {
                assert_eq!(row, 1);
                assert_eq!(expected, vec!["x", "label"]);
                assert_eq!(found, vec!["x", "y"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn same_fields_in_other_order_are_realigned() {
        let first: Map<String, Value> =
            serde_json::from_str(r#"{"a": 1, "b": 2}"#).unwrap();
        let second: Map<String, Value> =
            serde_json::from_str(r#"{"b": 4, "a": 3}"#).unwrap();
        let table = Table::from_records(vec![first, second]).unwrap();
        assert_eq!(table.rows()[1], vec![Value::from(3), Value::from(4)]);
    }

    #[test]
    fn non_record_rejected() {
        let err = Table::from_records(vec![1, 2]).unwrap_err();
        assert!(matches!(err, ExportError::NotARecord { row: 0 }));
    }

    #[test]
    fn empty_table_writes_nothing() {
        let table = Table::from_records(Vec::<Point>::new()).unwrap();
        assert!(table.is_empty());
        assert!(table.columns().is_empty());
        let mut out = Vec::new();
        table.write_to(&mut out, Format::Csv).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn table_csv_output() {
        let table = Table::from_records(vec![point(1, "plain"), point(2, "has,comma")]).unwrap();
        let mut out = Vec::new();
        table.write_to(&mut out, Format::Csv).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "x,label\n1,plain\n2,\"has,comma\"\n"
        );
    }

    #[test]
    fn streaming_writer_matches_table() {
        let records = vec![point(1, "a"), point(2, "b\"q")];
        let mut expected = Vec::new();
        Table::from_records(&records)
            .unwrap()
            .write_to(&mut expected, Format::JsonLines)
            .unwrap();

        let mut writer = RecordWriter::new(Vec::new(), Format::JsonLines);
        writer.write_all(&records).unwrap();
        assert_eq!(writer.rows_written(), 2);
        let out = writer.finish().unwrap();
        assert_eq!(out, expected);
    }

    #[test]
    fn streaming_writer_rejects_mismatch() {
        let mut writer = RecordWriter::new(Vec::new(), Format::Csv);
        writer.write(&Mixed::P(point(1, "a"))).unwrap();
        let err = writer.write(&Mixed::O(Other { x: 1, y: 2 })).unwrap_err();
        assert!(matches!(err, ExportError::SchemaMismatch { row: 1, .. }));
        assert_eq!(writer.rows_written(), 1);
    }

    #[test]
    fn format_parsing() {
        assert_eq!("csv".parse::<Format>().unwrap(), Format::Csv);
        assert_eq!("JSONL".parse::<Format>().unwrap(), Format::JsonLines);
        assert!("xlsx".parse::<Format>().is_err());
        assert_eq!(Format::JsonLines.extension(), "jsonl");
    }
}
