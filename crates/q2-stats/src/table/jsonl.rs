//! Line-delimited JSON tables
//!
//! The first line is a header describing the document type and every
//! column; each following non-blank line is one row as a `key: value`
//! object.

use crate::error::{Result, StatsError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io::{BufRead, Write};

pub const MEDIA_TYPE: &str = "application/x-json-lines";
pub const FORMAT_VERSION: &str = "1.0";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Doctype {
    pub name: String,
    pub format: String,
    pub version: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Integer,
    Number,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Whether the column may hold `null`.
    #[serde(default)]
    pub missing: bool,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl FieldSpec {
    pub fn new(name: &str, field_type: FieldType) -> Self {
        FieldSpec {
            name: name.to_string(),
            field_type,
            missing: false,
            title: None,
            description: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub doctype: Doctype,
    pub direction: String,
    pub style: String,
    pub fields: Vec<FieldSpec>,
    #[serde(default)]
    pub index: Vec<Value>,
}

impl Header {
    pub fn new(doctype: &str, fields: Vec<FieldSpec>) -> Self {
        Header {
            doctype: Doctype {
                name: doctype.to_string(),
                format: MEDIA_TYPE.to_string(),
                version: FORMAT_VERSION.to_string(),
            },
            direction: "row".to_string(),
            style: "key:value".to_string(),
            fields,
            index: Vec::new(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

fn parse_error(line: usize, message: impl Into<String>) -> StatsError {
    StatsError::TableParse {
        format: "JSONL",
        line,
        message: message.into(),
    }
}

/// Read a header and its records.
pub fn read<R: BufRead>(reader: R) -> Result<(Header, Vec<Map<String, Value>>)> {
    let mut header: Option<Header> = None;
    let mut records = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let lineno = idx + 1;
        if line.trim().is_empty() {
            continue;
        }

        if header.is_none() {
            let parsed: Header =
                serde_json::from_str(&line).map_err(|e| parse_error(lineno, e.to_string()))?;
            if parsed.doctype.format != MEDIA_TYPE {
                return Err(parse_error(
                    lineno,
                    format!("unsupported format '{}'", parsed.doctype.format),
                ));
            }
            header = Some(parsed);
            continue;
        }

        match serde_json::from_str::<Value>(&line) {
            Ok(Value::Object(map)) => records.push(map),
            Ok(_) => return Err(parse_error(lineno, "record is not a JSON object")),
            Err(e) => return Err(parse_error(lineno, e.to_string())),
        }
    }

    let header = header.ok_or_else(|| parse_error(1, "missing header line"))?;
    Ok((header, records))
}

pub fn write<W: Write>(writer: &mut W, header: &Header, records: &[Map<String, Value>]) -> Result<()> {
    serde_json::to_writer(&mut *writer, header)?;
    writeln!(writer)?;
    for record in records {
        serde_json::to_writer(&mut *writer, record)?;
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}

/// JSON number for finite values, `null` otherwise.
pub fn number(value: f64) -> Value {
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}
