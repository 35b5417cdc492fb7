//! JSON Lines (JSONL) output writer.
//!
//! One message per line, which suits line-oriented tools and incremental
//! loading into other stores.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::OutputRecord;
use crate::core::models::OutputConfig;
use crate::error::Result;
use crate::table::ChatTable;

/// Writes a table to a JSONL file.
///
/// Each line is a valid JSON object:
/// ```jsonl
/// {"timestamp":"2024-01-20T16:25:00","author":"철수","text":"안녕"}
/// {"timestamp":"2024-01-20T16:26:00","author":"영희","text":"ㅇㅇ"}
/// ```
pub fn write_jsonl(table: &ChatTable, path: impl AsRef<Path>, config: &OutputConfig) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_jsonl_to(table, &mut writer, config)?;
    writer.flush()?;
    Ok(())
}

/// Converts a table to a JSONL string.
pub fn to_jsonl(table: &ChatTable, config: &OutputConfig) -> Result<String> {
    let mut buffer = Vec::new();
    write_jsonl_to(table, &mut buffer, config)?;
    Ok(String::from_utf8(buffer)?)
}

fn write_jsonl_to<W: Write>(table: &ChatTable, out: &mut W, config: &OutputConfig) -> Result<()> {
    for msg in table {
        serde_json::to_writer(&mut *out, &OutputRecord::new(msg, config))?;
        out.write_all(b"\n")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;
    use chrono::NaiveDate;
    use std::io::{BufRead, BufReader};
    use tempfile::NamedTempFile;

    fn table() -> ChatTable {
        let day = NaiveDate::from_ymd_opt(2024, 1, 20).unwrap();
        ChatTable::from_messages(vec![
            Message::new(day.and_hms_opt(16, 26, 0).unwrap(), "영희", "ㅇㅇ"),
            Message::new(day.and_hms_opt(16, 25, 0).unwrap(), "철수", "안녕"),
        ])
    }

    #[test]
    fn test_write_jsonl_basic() {
        let temp_file = NamedTempFile::new().unwrap();
        write_jsonl(&table(), temp_file.path(), &OutputConfig::new()).unwrap();

        let reader = BufReader::new(std::fs::File::open(temp_file.path()).unwrap());
        let lines: Vec<String> = reader.lines().map(|l| l.unwrap()).collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(first["author"], "철수");
        assert_eq!(first["timestamp"], "2024-01-20T16:25:00");
    }

    #[test]
    fn test_jsonl_has_no_array_brackets() {
        let content = to_jsonl(&table(), &OutputConfig::new()).unwrap();
        assert!(!content.starts_with('['));
        assert_eq!(content.lines().count(), 2);
    }
}
