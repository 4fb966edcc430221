//! export::jsonl
//!
//! JSON Lines output: one object per record, keys in column order.

use std::io::{self, Write};

use serde_json::{Map, Value};

/// Write one record as a single JSON line.
pub fn write_record<W: Write>(sink: &mut W, columns: &[String], values: &[Value]) -> io::Result<()> {
    let object: Map<String, Value> = columns
        .iter()
        .cloned()
        .zip(values.iter().cloned())
        .collect();
    serde_json::to_writer(&mut *sink, &object)?;
    writeln!(sink)
}
