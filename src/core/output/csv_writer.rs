//! CSV output writer.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::core::models::OutputConfig;
use crate::error::Result;
use crate::message::TIMESTAMP_FORMAT;
use crate::table::ChatTable;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Writes a table to a CSV file.
///
/// # Format
/// - Delimiter: from [`OutputConfig::delimiter`] (default `,`)
/// - Columns: `timestamp`, `author`, `text`, plus `length` when enabled
/// - Timestamps: `YYYY-MM-DD HH:MM:SS`
/// - Encoding: UTF-8, with BOM when [`OutputConfig::write_bom`] is set
pub fn write_csv(table: &ChatTable, path: impl AsRef<Path>, config: &OutputConfig) -> Result<()> {
    let file = BufWriter::new(File::create(path)?);
    write_csv_to(table, file, config)
}

/// Converts a table to a CSV string. A BOM, if enabled, is the first character.
pub fn to_csv(table: &ChatTable, config: &OutputConfig) -> Result<String> {
    let mut buffer = Vec::new();
    write_csv_to(table, &mut buffer, config)?;
    Ok(String::from_utf8(buffer)?)
}

fn write_csv_to<W: Write>(table: &ChatTable, mut out: W, config: &OutputConfig) -> Result<()> {
    if config.write_bom {
        out.write_all(UTF8_BOM)?;
    }

    let mut writer = csv::WriterBuilder::new()
        .delimiter(config.delimiter)
        .from_writer(out);

    if config.include_length {
        writer.write_record(["timestamp", "author", "text", "length"])?;
    } else {
        writer.write_record(["timestamp", "author", "text"])?;
    }

    for msg in table {
        let timestamp = msg.timestamp.format(TIMESTAMP_FORMAT).to_string();
        if config.include_length {
            let length = msg.length().to_string();
            writer.write_record([
                timestamp.as_str(),
                msg.author.as_str(),
                msg.text.as_str(),
                length.as_str(),
            ])?;
        } else {
            writer.write_record([timestamp.as_str(), msg.author.as_str(), msg.text.as_str()])?;
        }
    }

    writer.flush()?;
    Ok(())
}
