//! export::csv
//!
//! Comma-separated output. Cells are quoted only when they need it, with
//! embedded quotes doubled.

use std::io::{self, Write};

use serde_json::Value;

const SEPARATOR: char = ',';

fn needs_quotes(cell: &str) -> bool {
    cell.contains(SEPARATOR) || cell.contains('"') || cell.contains('\n') || cell.contains('\r')
}

/// Text of one cell. Null is empty, strings are written as-is.
pub fn format_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        nested => nested.to_string(),
    }
}

fn write_cells<W: Write, S: AsRef<str>>(sink: &mut W, cells: &[S]) -> io::Result<()> {
    let mut first = true;
    for cell in cells {
        if !first {
            write!(sink, "{}", SEPARATOR)?;
        }
        first = false;

        let cell = cell.as_ref();
        if needs_quotes(cell) {
            write!(sink, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            sink.write_all(cell.as_bytes())?;
        }
    }
    writeln!(sink)
}

/// Write the header row.
pub fn write_header<W: Write>(sink: &mut W, columns: &[String]) -> io::Result<()> {
    write_cells(sink, columns)
}

/// Write one data row.
pub fn write_record<W: Write>(sink: &mut W, values: &[Value]) -> io::Result<()> {
    let cells: Vec<String> = values.iter().map(format_cell).collect();
    write_cells(sink, &cells)
}
