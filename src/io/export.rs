use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::{Result, ToolError};
use crate::model::{Record, SheetResult, TypedValue};

/// Serialization used for the exported record files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Pretty-printed array of records.
    #[default]
    Json,
    /// Header row of field names followed by one line per record.
    Csv,
    /// One `INSERT` statement per record.
    Sql,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Sql => "sql",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = ToolError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "sql" => Ok(ExportFormat::Sql),
            other => Err(ToolError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Writes the client and server records of `result` into their directories,
/// one `<sheet>.<ext>` file per non-empty side. Returns the written paths.
#[instrument(
    level = "info",
    skip_all,
    fields(sheet = %result.sheet_name, %format)
)]
pub fn export_sheet(
    result: &SheetResult,
    format: ExportFormat,
    client_dir: &Path,
    server_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let file_name = format!("{}.{}", sanitize_file_stem(&result.sheet_name), format.extension());
    let mut written = Vec::new();

    for (dir, records) in [
        (client_dir, &result.client_records),
        (server_dir, &result.server_records),
    ] {
        if records.is_empty() {
            debug!(dir = %dir.display(), "no records for side, skipping");
            continue;
        }
        fs::create_dir_all(dir)?;
        let path = dir.join(&file_name);
        let mut writer = BufWriter::new(File::create(&path)?);
        write_records(&mut writer, format, &result.sheet_name, records)?;
        writer.flush()?;
        info!(path = %path.display(), records = records.len(), "records written");
        written.push(path);
    }

    Ok(written)
}

/// Serializes `records` to `writer`. `table` names the SQL target table.
pub fn write_records<W: Write>(
    writer: W,
    format: ExportFormat,
    table: &str,
    records: &[Record],
) -> Result<()> {
    match format {
        ExportFormat::Json => write_json(writer, records),
        ExportFormat::Csv => write_csv(writer, records),
        ExportFormat::Sql => write_sql(writer, table, records),
    }
}

pub fn write_json<W: Write>(writer: W, records: &[Record]) -> Result<()> {
    serde_json::to_writer_pretty(writer, records)?;
    Ok(())
}

/// The header is the union of field names in first-seen order; records
/// lacking a field leave the cell empty.
pub fn write_csv<W: Write>(writer: W, records: &[Record]) -> Result<()> {
    let mut headers: Vec<&str> = Vec::new();
    for record in records {
        for key in record.keys() {
            if !headers.contains(&key.as_str()) {
                headers.push(key);
            }
        }
    }

    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(&headers)?;
    for record in records {
        let row: Vec<String> = headers
            .iter()
            .map(|header| record.get(*header).map(csv_field).unwrap_or_default())
            .collect();
        csv_writer.write_record(&row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_sql<W: Write>(mut writer: W, table: &str, records: &[Record]) -> Result<()> {
    let table = quote_identifier(table);
    for record in records {
        let columns: Vec<String> = record.keys().map(|key| quote_identifier(key)).collect();
        let values: Vec<String> = record.values().map(sql_literal).collect();
        writeln!(
            writer,
            "INSERT INTO {table} ({}) VALUES ({});",
            columns.join(", "),
            values.join(", ")
        )?;
    }
    Ok(())
}

fn csv_field(value: &TypedValue) -> String {
    match value {
        TypedValue::String(text) | TypedValue::Date(text) => text.clone(),
        TypedValue::Null => String::new(),
        other => other.to_json().to_string(),
    }
}

fn sql_literal(value: &TypedValue) -> String {
    match value {
        TypedValue::Int(value) => value.to_string(),
        TypedValue::Float(value) if value.is_finite() => value.to_string(),
        TypedValue::Float(_) | TypedValue::Null => "NULL".to_string(),
        TypedValue::Bool(true) => "TRUE".to_string(),
        TypedValue::Bool(false) => "FALSE".to_string(),
        TypedValue::String(text) | TypedValue::Date(text) => quote_string(text),
        composite => quote_string(&composite.to_json().to_string()),
    }
}

fn quote_string(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Replaces characters that are not valid in file names.
fn sanitize_file_stem(raw: &str) -> String {
    let invalid = [':', '\\', '/', '?', '*', '[', ']', '"', '<', '>', '|'];
    let sanitized: String = raw
        .chars()
        .map(|ch| {
            if invalid.contains(&ch) || ch.is_control() {
                '_'
            } else {
                ch
            }
        })
        .collect();

    let sanitized = sanitized.trim();
    if sanitized.is_empty() {
        "Sheet".to_string()
    } else {
        sanitized.to_string()
    }
}
