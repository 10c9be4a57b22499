//! I/O helpers for JSON documents and JSON Lines tables.
//!
//! - `write_json_file`: pretty-print a serializable value to disk.
//! - `append_jsonl`: append rows, one JSON object per line.
//! - `read_jsonl`: read every row of a JSON Lines file.
//! - `write_text_file`: write a plain-text document.
//! - `truncate_file`: create or empty a file before a run appends to it.
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize JSON for {}: {e}", path.display()))?;
    fs::write(path, json).map_err(|e| format!("Failed to write JSON {}: {e}", path.display()))
}

/// Write a text document to `path`, creating parent directories.
pub fn write_text_file(path: &Path, body: &str) -> Result<(), String> {
    ensure_parent_dir(path)?;
    fs::write(path, body).map_err(|e| format!("Failed to write {}: {e}", path.display()))
}

/// Create `path` (and its parents) or truncate it to zero length.
pub fn truncate_file(path: &Path) -> Result<(), String> {
    ensure_parent_dir(path)?;
    File::create(path)
        .map(|_| ())
        .map_err(|e| format!("Failed to create {}: {e}", path.display()))
}

/// Append `rows` to `path`, one compact JSON object per line.
///
/// The writer is flushed before returning so a crash after this call cannot
/// lose rows that were reported as written.
pub fn append_jsonl<T: Serialize>(path: &Path, rows: &[T]) -> Result<usize, String> {
    if rows.is_empty() {
        return Ok(0);
    }
    ensure_parent_dir(path)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| format!("Failed to open {}: {e}", path.display()))?;
    let mut writer = BufWriter::new(file);
    for row in rows {
        serde_json::to_writer(&mut writer, row)
            .map_err(|e| format!("Failed to serialize row for {}: {e}", path.display()))?;
        writer
            .write_all(b"\n")
            .map_err(|e| format!("Failed to write {}: {e}", path.display()))?;
    }
    writer
        .flush()
        .map_err(|e| format!("Failed to flush {}: {e}", path.display()))?;
    Ok(rows.len())
}

/// Read all rows of a JSON Lines file. Blank lines are ignored.
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, String> {
    let file = File::open(path).map_err(|e| format!("Failed to open {}: {e}", path.display()))?;
    let mut rows = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        let row = serde_json::from_str(&line)
            .map_err(|e| format!("Failed to parse {}:{}: {e}", path.display(), idx + 1))?;
        rows.push(row);
    }
    Ok(rows)
}

pub(crate) fn ensure_parent_dir(path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {e}", parent.display()))?;
        }
    }
    Ok(())
}
