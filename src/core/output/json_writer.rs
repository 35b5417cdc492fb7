//! JSON output writer.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::OutputRecord;
use crate::core::models::OutputConfig;
use crate::error::Result;
use crate::table::ChatTable;

/// Writes a table to a JSON file as an array.
///
/// # Format
/// ```json
/// [
///   {"timestamp": "2024-01-20T16:25:00", "author": "철수", "text": "안녕"},
///   {"timestamp": "2024-01-20T16:26:00", "author": "영희", "text": "ㅇㅇ"}
/// ]
/// ```
pub fn write_json(table: &ChatTable, path: impl AsRef<Path>, config: &OutputConfig) -> Result<()> {
    let json = to_json(table, config)?;
    let mut file = BufWriter::new(File::create(path)?);
    file.write_all(json.as_bytes())?;
    file.flush()?;
    Ok(())
}

/// Converts a table to a pretty-printed JSON array.
pub fn to_json(table: &ChatTable, config: &OutputConfig) -> Result<String> {
    let records: Vec<OutputRecord<'_>> = table
        .iter()
        .map(|m| OutputRecord::new(m, config))
        .collect();
    Ok(serde_json::to_string_pretty(&records)?)
}
